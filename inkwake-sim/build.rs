//! Build script for inkwake-sim
//!
//! Reads device.toml, validates it, and generates the compiled-in device
//! tables (`$OUT_DIR/generated.rs`): server URLs, Wi-Fi networks with their
//! SSID order, the initial retry schedule, panel settings, and the status
//! image catalog sorted by identifier.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

#[path = "src/report.rs"]
mod report;

/// Must match `inkwake_protocol::MAX_SCHEDULE_LEN`
const MAX_SCHEDULE_LEN: usize = 20;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceToml {
    rotation: String,
    palette: String,
    initial_schedule_ds: Vec<i64>,
    transports: Vec<String>,
    #[serde(default, rename = "network")]
    networks: Vec<NetworkToml>,
    status: StatusToml,
    #[serde(rename = "status_image")]
    status_images: Vec<StatusImageToml>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkToml {
    ssid: String,
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StatusToml {
    initial: String,
    low_battery: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StatusImageToml {
    name: String,
    file: PathBuf,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/report.rs");
    println!("cargo:rerun-if-changed=device.toml");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let config = load_config(&manifest_dir.join("device.toml"));

    let errors = validate(&config, &manifest_dir);
    if !errors.is_empty() {
        fail("Invalid device.toml", &errors);
    }

    let generated = generate(&config, &manifest_dir);
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("generated.rs"), generated).unwrap();
}

fn load_config(path: &Path) -> DeviceToml {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
    };
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail(
            "Invalid TOML in device.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    }
}

/// Abort the build with a boxed error report
fn fail(title: &str, lines: &[String]) -> ! {
    let mut report = String::from("\n");
    report.push_str("╔══════════════════════════════════════════════════════════════════╗\n");
    report.push_str(&format!("║  ERROR: {:<56} ║\n", title));
    report.push_str("╠══════════════════════════════════════════════════════════════════╣\n");
    for line in lines {
        let line = report::truncate(line, 62);
        report.push_str(&format!("║  • {:<62} ║\n", line));
    }
    report.push_str("╚══════════════════════════════════════════════════════════════════╝\n");
    panic!("{}", report);
}

fn rotation_variant(name: &str) -> Option<&'static str> {
    match name {
        "landscape" => Some("Landscape"),
        "portrait-right" => Some("PortraitRight"),
        "landscape-upside-down" => Some("LandscapeUpsideDown"),
        "portrait-left" => Some("PortraitLeft"),
        _ => None,
    }
}

fn palette_expr(name: &str) -> Option<&'static str> {
    match name {
        "monochrome" => Some("Palette::Monochrome"),
        "grayscale-3bit" => Some("Palette::Grayscale3Bit"),
        "grayscale-4bit" => Some("Palette::Grayscale4Bit"),
        "seven-color" => Some("Palette::Nearest(&inkwake_display::SEVEN_COLOR)"),
        "black-white-red" => Some("Palette::BlackWhiteRed"),
        _ => None,
    }
}

fn validate(config: &DeviceToml, manifest_dir: &Path) -> Vec<String> {
    let mut errors = Vec::new();

    if rotation_variant(&config.rotation).is_none() {
        errors.push(format!("Unknown rotation '{}'", config.rotation));
    }
    if palette_expr(&config.palette).is_none() {
        errors.push(format!("Unknown palette '{}'", config.palette));
    }

    let schedule = &config.initial_schedule_ds;
    if schedule.is_empty() {
        errors.push("initial_schedule_ds must not be empty".to_string());
    }
    if schedule.len() > MAX_SCHEDULE_LEN {
        errors.push(format!(
            "initial_schedule_ds has {} entries (max {})",
            schedule.len(),
            MAX_SCHEDULE_LEN
        ));
    }
    for (i, &ds) in schedule.iter().enumerate() {
        if ds <= 0 || ds > i64::from(i32::MAX) {
            errors.push(format!("initial_schedule_ds[{}] = {} is out of range", i, ds));
        }
    }

    if config.transports.is_empty() {
        errors.push("At least one transport URL is required".to_string());
    }
    for url in &config.transports {
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://")) {
            errors.push(format!("Transport '{}' is not http(s):// or file://", url));
        }
    }

    for (i, network) in config.networks.iter().enumerate() {
        if network.ssid.is_empty() || network.ssid.len() > 32 {
            errors.push(format!("network[{}]: SSID must be 1-32 bytes", i));
        }
    }

    let mut names: Vec<&str> = Vec::new();
    for image in &config.status_images {
        if names.contains(&image.name.as_str()) {
            errors.push(format!("Duplicate status image '{}'", image.name));
        }
        names.push(&image.name);
        if !manifest_dir.join(&image.file).is_file() {
            errors.push(format!("Status image file '{}' not found", image.file.display()));
        }
    }
    for (kind, name) in [
        ("initial", &config.status.initial),
        ("low_battery", &config.status.low_battery),
    ] {
        if !names.contains(&name.as_str()) {
            errors.push(format!("status.{} names unknown image '{}'", kind, name));
        }
    }

    errors
}

fn image_id(name: &str) -> [u8; 32] {
    Sha256::digest(name.as_bytes()).into()
}

fn generate(config: &DeviceToml, manifest_dir: &Path) -> String {
    let mut out = String::new();
    out.push_str("// Generated by build.rs from device.toml\n\n");

    // Validated above; the fallbacks are never used
    let rotation = rotation_variant(&config.rotation).unwrap_or("Landscape");
    let palette = palette_expr(&config.palette).unwrap_or("Palette::Monochrome");
    writeln!(out, "pub const ROTATION: Rotation = Rotation::{};", rotation).unwrap();
    writeln!(out, "pub const PALETTE: Palette<'static> = {};\n", palette).unwrap();

    writeln!(
        out,
        "pub static INITIAL_SCHEDULE_DS: [i32; {}] = {:?};\n",
        config.initial_schedule_ds.len(),
        config.initial_schedule_ds
    )
    .unwrap();

    writeln!(out, "pub static TRANSPORTS: [&str; {}] = [", config.transports.len()).unwrap();
    for url in &config.transports {
        writeln!(out, "    {:?},", url).unwrap();
    }
    out.push_str("];\n\n");

    writeln!(out, "pub static NETWORKS: [WifiNetwork; {}] = [", config.networks.len()).unwrap();
    for network in &config.networks {
        writeln!(
            out,
            "    WifiNetwork {{ ssid: {:?}, password: {:?} }},",
            network.ssid, network.password
        )
        .unwrap();
    }
    out.push_str("];\n\n");

    // Byte order, ties in priority order
    let mut order: Vec<usize> = (0..config.networks.len()).collect();
    order.sort_by(|&a, &b| config.networks[a].ssid.as_bytes().cmp(config.networks[b].ssid.as_bytes()));
    writeln!(
        out,
        "pub static NETWORK_ORDER: [usize; {}] = {:?};\n",
        order.len(),
        order
    )
    .unwrap();

    let mut images: Vec<([u8; 32], &StatusImageToml)> = config
        .status_images
        .iter()
        .map(|image| (image_id(&image.name), image))
        .collect();
    images.sort_by(|a, b| a.0.cmp(&b.0));

    writeln!(out, "pub static STATUS_IMAGES: [StatusImage; {}] = [", images.len()).unwrap();
    for (id, image) in &images {
        let path = manifest_dir.join(&image.file);
        println!("cargo:rerun-if-changed={}", path.display());
        writeln!(out, "    // {}", image.name).unwrap();
        writeln!(out, "    StatusImage {{").unwrap();
        writeln!(out, "        id: {:?},", id).unwrap();
        writeln!(out, "        data: include_bytes!({:?}),", path.display().to_string()).unwrap();
        writeln!(out, "    }},").unwrap();
    }
    out.push_str("];\n\n");

    let index_of = |name: &str| {
        images
            .iter()
            .position(|(_, image)| image.name == name)
            .unwrap_or(0)
    };
    writeln!(out, "pub const INITIAL_IMAGE: usize = {};", index_of(&config.status.initial)).unwrap();
    writeln!(
        out,
        "pub const LOW_BATTERY_IMAGE: usize = {};",
        index_of(&config.status.low_battery)
    )
    .unwrap();

    let named: Vec<String> = images
        .iter()
        .map(|(id, image)| format!("    ({:?}, {:?}),", image.name, id))
        .collect();
    writeln!(
        out,
        "\n/// Status image names and identifiers, for logs\npub static STATUS_IMAGE_NAMES: [(&str, [u8; 32]); {}] = [\n{}\n];",
        named.len(),
        named.join("\n")
    )
    .unwrap();

    out
}
