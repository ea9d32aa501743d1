//! In-memory stand-ins for the board, shared by the unit tests

use std::collections::VecDeque;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use inkwake_display::{Color, DisplayError, EinkDisplay, Palette, PixelSink, Rotation};
use inkwake_hal::{
    HttpClient, HttpResponse, LinkStatus, MonotonicClock, RetainedMemory, SleepControl,
    WakeCause, WifiRadio,
};
use inkwake_protocol::{ImageId, ResponseFrame, IMAGE_ID_LEN, NEVER};
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::catalog::{StatusCatalog, StatusImage};
use crate::config::{DeviceConfig, NetworkTable, Timing, WifiNetwork};
use crate::lifecycle::Board;
use crate::state::PersistentState;

pub const INITIAL_TAG: u8 = 1;
pub const LOW_BATTERY_TAG: u8 = 2;
pub const SCREENSAVER_TAG: u8 = 3;

pub const INITIAL_ID: ImageId = [0x10; IMAGE_ID_LEN];
pub const LOW_BATTERY_ID: ImageId = [0x20; IMAGE_ID_LEN];
pub const SCREENSAVER_ID: ImageId = [0x30; IMAGE_ID_LEN];

// Minimal JPEG-shaped blobs; FakeDisplay records the tag byte
static STATUS_IMAGES: [StatusImage; 3] = [
    StatusImage { id: INITIAL_ID, data: &[0xFF, 0xD8, INITIAL_TAG, 0xFF, 0xD9] },
    StatusImage { id: LOW_BATTERY_ID, data: &[0xFF, 0xD8, LOW_BATTERY_TAG, 0xFF, 0xD9] },
    StatusImage { id: SCREENSAVER_ID, data: &[0xFF, 0xD8, SCREENSAVER_TAG, 0xFF, 0xD9] },
];

static NETWORKS: [WifiNetwork; 1] = [WifiNetwork { ssid: "home", password: Some("secret") }];

pub static TRANSPORTS: [&str; 2] = ["http://primary.test/eink", "http://backup.test/eink"];

pub static INITIAL_SCHEDULE: [i32; 3] = [50, 100, NEVER];

pub fn config() -> DeviceConfig {
    DeviceConfig {
        transports: &TRANSPORTS,
        networks: NetworkTable::new(&NETWORKS),
        initial_schedule: &INITIAL_SCHEDULE,
        rotation: Rotation::PortraitLeft,
        palette: Palette::Monochrome,
        catalog: StatusCatalog::new(&STATUS_IMAGES, 0, 1).unwrap(),
        timing: Timing::default(),
    }
}

/// A board whose radio can join the configured network
pub fn board() -> Board<FakePlatform, FakeDisplay, FakeRadio, FakeHttp> {
    let mut radio = FakeRadio::with_visible(&["home"]);
    radio.accept("home", Some("secret"));
    Board {
        platform: FakePlatform::default(),
        display: FakeDisplay::default(),
        radio,
        http: FakeHttp::default(),
    }
}

/// Encode a server response
pub fn frame(schedule: &[i32], screensaver_id: ImageId, countdown_ds: i32, image: &[u8]) -> Vec<u8> {
    ResponseFrame {
        schedule_ds: schedule,
        screensaver_id,
        screensaver_countdown_ds: countdown_ds,
        image,
    }
    .encode()
}

/// A 2x1 RGB PNG: one white pixel, one black
pub fn tiny_png() -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(body);
        out.extend_from_slice(&[0; 4]);
    }

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
    let scanline = [0u8, 255, 255, 255, 0, 0, 0];

    let mut png = inkwake_display::PNG_SIGNATURE.to_vec();
    chunk(&mut png, b"IHDR", &ihdr);
    chunk(&mut png, b"IDAT", &compress_to_vec_zlib(&scanline, 6));
    chunk(&mut png, b"IEND", &[]);
    png
}

/// Clock, sleep and retained memory, all virtual
#[derive(Debug)]
pub struct FakePlatform {
    /// Microseconds since power-on
    pub now: u64,
    pub wake: WakeCause,
    pub retained: Option<PersistentState>,
    pub light_sleeps: Vec<u64>,
    pub deep_sleeps: Vec<u64>,
    pub halted: bool,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            now: 0,
            wake: WakeCause::ColdBoot,
            retained: None,
            light_sleeps: Vec::new(),
            deep_sleeps: Vec::new(),
            halted: false,
        }
    }
}

impl MonotonicClock for FakePlatform {
    fn now_us(&self) -> u64 {
        self.now
    }
}

impl DelayNs for FakePlatform {
    fn delay_ns(&mut self, ns: u32) {
        self.now += u64::from(ns) / 1000;
    }
}

impl SleepControl for FakePlatform {
    fn wake_cause(&self) -> WakeCause {
        self.wake
    }

    fn light_sleep_us(&mut self, us: u64) {
        self.light_sleeps.push(us);
        self.now += us;
    }

    fn deep_sleep_us(&mut self, us: u64) {
        self.deep_sleeps.push(us);
        self.now += us;
    }

    fn halt(&mut self) {
        self.halted = true;
    }
}

impl RetainedMemory<PersistentState> for FakePlatform {
    fn store(&mut self, value: &PersistentState) {
        self.retained = Some(*value);
    }

    fn load(&self) -> Option<PersistentState> {
        self.retained
    }
}

/// Radio that sees a fixed set of SSIDs and accepts chosen credentials
#[derive(Debug, Default)]
pub struct FakeRadio {
    pub visible: Vec<&'static str>,
    pub accepted: Vec<(&'static str, Option<&'static str>)>,
    pub powered: bool,
    pub connected: bool,
    pub failed: bool,
    /// SSIDs passed to `begin`, in order
    pub attempts: Vec<String>,
    pub scans: usize,
    pub disconnects: usize,
    pub power_offs: usize,
}

impl FakeRadio {
    pub fn with_visible(ssids: &[&'static str]) -> Self {
        Self {
            visible: ssids.to_vec(),
            ..Self::default()
        }
    }

    pub fn accept(&mut self, ssid: &'static str, password: Option<&'static str>) {
        self.accepted.push((ssid, password));
    }
}

impl WifiRadio for FakeRadio {
    fn status(&self) -> LinkStatus {
        if !self.powered {
            LinkStatus::Off
        } else if self.connected {
            LinkStatus::Connected
        } else if self.failed {
            LinkStatus::Failed
        } else {
            LinkStatus::Idle
        }
    }

    fn begin(&mut self, ssid: &str, password: Option<&str>) {
        self.powered = true;
        self.attempts.push(ssid.to_string());
        self.connected = self
            .accepted
            .iter()
            .any(|&(s, p)| s == ssid && p == password);
        self.failed = !self.connected;
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.failed = false;
        self.disconnects += 1;
    }

    fn scan<F: FnMut(&str)>(&mut self, mut on_network: F) {
        self.powered = true;
        self.scans += 1;
        for ssid in &self.visible {
            on_network(ssid);
        }
    }

    fn power_off(&mut self) {
        self.powered = false;
        self.connected = false;
        self.failed = false;
        self.power_offs += 1;
    }
}

/// Panel that counts what happens to it
#[derive(Debug)]
pub struct FakeDisplay {
    pub millivolts: u32,
    pub rotation: Option<Rotation>,
    pub clears: usize,
    pub flushes: usize,
    /// Pixels drawn since creation
    pub pixels: usize,
    /// Third byte of every JPEG drawn
    pub jpegs: Vec<u8>,
}

impl Default for FakeDisplay {
    fn default() -> Self {
        Self {
            millivolts: 4000,
            rotation: None,
            clears: 0,
            flushes: 0,
            pixels: 0,
            jpegs: Vec::new(),
        }
    }
}

impl PixelSink for FakeDisplay {
    fn put_pixel(&mut self, _x: u32, _y: u32, _color: Color) {
        self.pixels += 1;
    }
}

impl EinkDisplay for FakeDisplay {
    fn size(&self) -> (u32, u32) {
        (600, 448)
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.flushes += 1;
        Ok(())
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = Some(rotation);
    }

    fn battery_millivolts(&mut self) -> u32 {
        self.millivolts
    }

    fn draw_jpeg(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.jpegs.push(data[2]);
        Ok(())
    }
}

/// HTTP client replaying canned replies; `None` is a transport failure
#[derive(Debug, Default)]
pub struct FakeHttp {
    pub replies: VecDeque<Option<(u16, Vec<u8>)>>,
    /// URL and payload of every post
    pub posts: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
}

impl FakeHttp {
    pub fn reply(&mut self, status: u16, body: Vec<u8>) {
        self.replies.push_back(Some((status, body)));
    }

    pub fn fail(&mut self) {
        self.replies.push_back(None);
    }
}

impl HttpClient for FakeHttp {
    type Body<'a> = &'a [u8] where Self: 'a;
    type Error = ();

    fn post<'a>(
        &'a mut self,
        url: &str,
        payload: &[u8],
    ) -> Result<HttpResponse<Self::Body<'a>>, Self::Error> {
        self.posts.push((url.to_string(), payload.to_vec()));
        let (status, body) = self.replies.pop_front().flatten().ok_or(())?;
        self.body = body;
        Ok(HttpResponse {
            status,
            body: &self.body[..],
        })
    }
}
