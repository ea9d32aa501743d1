//! Server response handling
//!
//! A response is read straight off the socket. Everything before the image
//! is parsed into locals first and only committed to [`PersistentState`] once
//! the whole header has arrived, so a dropped connection can never leave a
//! half-applied schedule behind. The image is then streamed onto the panel.
//!
//! ```text
//! ReadHeader -> ReadSchedule -> ReadScreensaverMeta -> ReadImageLength
//!     -> CommitState -> StreamImage -> Complete
//!                                   \-> IncompleteAbort
//! ```
//!
//! Any header phase may fail, which ends processing with no state change.

use embedded_io::Read;
use inkwake_display::{draw_png_from_reader, EinkDisplay, ImageError, PngDecoder};
use inkwake_protocol::{ImageId, Reader, IMAGE_ID_LEN, MAGIC, MAX_SCHEDULE_LEN};

use crate::catalog::StatusImageKind;
use crate::config::DeviceConfig;
use crate::logging::{error, info, trace, warn};
use crate::state::PersistentState;
use crate::status;

/// Why a response was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseError {
    /// Does not start with the protocol magic
    BadMagic,
    /// Stream ended before the header was complete; nothing was committed
    Truncated,
    /// Schedule count outside `1..=MAX_SCHEDULE_LEN`
    ScheduleLength(i32),
    /// Negative image length
    ImageLength(i32),
    /// Stream ended inside the image; state was reverted to defaults
    IncompleteImage,
}

/// Processing phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    ReadHeader,
    ReadSchedule,
    ReadScreensaverMeta,
    ReadImageLength,
    CommitState,
    StreamImage,
    Complete,
    IncompleteAbort,
}

/// Header fields, held back until the header is known to be complete
struct Pending {
    schedule: [i32; MAX_SCHEDULE_LEN],
    schedule_len: usize,
    screensaver_id: ImageId,
    screensaver_countdown_ds: i32,
    image_len: usize,
}

impl Pending {
    fn new() -> Self {
        Self {
            schedule: [0; MAX_SCHEDULE_LEN],
            schedule_len: 0,
            screensaver_id: [0; IMAGE_ID_LEN],
            screensaver_countdown_ds: 0,
            image_len: 0,
        }
    }
}

/// Apply one server response to `state` and the panel
///
/// On success the new content is on the panel and the new timing is in
/// `state`. On a header error nothing has changed. On
/// [`ResponseError::IncompleteImage`] the panel shows the initial status
/// image and `state` is back on the compiled-in schedule.
pub fn execute_response<D, R>(
    state: &mut PersistentState,
    config: &DeviceConfig,
    display: &mut D,
    decoder: &mut PngDecoder,
    reader: &mut Reader<R>,
) -> Result<(), ResponseError>
where
    D: EinkDisplay + ?Sized,
    R: Read,
{
    let mut pending = Pending::new();
    let mut phase = Phase::ReadHeader;

    loop {
        trace!("Response phase {:?}", phase);
        phase = match phase {
            Phase::ReadHeader => {
                let mut magic = [0u8; MAGIC.len()];
                reader.read_bytes(&mut magic);
                if reader.passed_eof() || magic != MAGIC {
                    return Err(ResponseError::BadMagic);
                }
                Phase::ReadSchedule
            }
            Phase::ReadSchedule => {
                let count = reader.read_int();
                if reader.passed_eof() {
                    return Err(ResponseError::Truncated);
                }
                if count < 1 || count as usize > MAX_SCHEDULE_LEN {
                    return Err(ResponseError::ScheduleLength(count));
                }
                pending.schedule_len = count as usize;
                for slot in &mut pending.schedule[..pending.schedule_len] {
                    *slot = reader.read_int();
                }
                Phase::ReadScreensaverMeta
            }
            Phase::ReadScreensaverMeta => {
                reader.read_bytes(&mut pending.screensaver_id);
                pending.screensaver_countdown_ds = reader.read_int();
                Phase::ReadImageLength
            }
            Phase::ReadImageLength => {
                let len = reader.read_int();
                if reader.passed_eof() {
                    return Err(ResponseError::Truncated);
                }
                if len < 0 {
                    return Err(ResponseError::ImageLength(len));
                }
                pending.image_len = len as usize;
                Phase::CommitState
            }
            Phase::CommitState => {
                state.commit_response(
                    &pending.schedule[..pending.schedule_len],
                    &pending.screensaver_id,
                    pending.screensaver_countdown_ds,
                );
                Phase::StreamImage
            }
            Phase::StreamImage => {
                display.clear();
                match draw_png_from_reader(
                    display,
                    config.palette,
                    decoder,
                    reader,
                    pending.image_len,
                ) {
                    Err(ImageError::Truncated) => Phase::IncompleteAbort,
                    Err(err) => {
                        // The bytes were consumed; show whatever was drawn
                        warn!("Content image failed to decode: {:?}", err);
                        Phase::Complete
                    }
                    Ok(()) => Phase::Complete,
                }
            }
            Phase::Complete => {
                if let Err(err) = display.flush() {
                    warn!("Display flush failed: {:?}", err);
                }
                info!("Updated content from server response");
                return Ok(());
            }
            Phase::IncompleteAbort => {
                error!("Server response ended inside the image; reverting to defaults");
                status::show_kind(display, decoder, config, StatusImageKind::Initial);
                state.revert_to_defaults(config.initial_schedule);
                return Err(ResponseError::IncompleteImage);
            }
        };
    }
}
