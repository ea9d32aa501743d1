//! Message layouts for the device/server exchange
//!
//! The device side only ever builds a request and parses a response; the
//! response parser lives with the persistent state it commits into. This
//! module also carries the mirror-image helpers a server (or a test fixture)
//! needs: validating a request and encoding a response.

use alloc::vec::Vec;

use crate::codec::{Reader, Writer};

/// Bytes at the start of every payload in either direction
///
/// A crude check that we are talking to the right kind of server.
pub const MAGIC: [u8; 12] = *b"\x89INK{\x98 $\x97\xaf\x80d";

/// Version of the protocol spoken by this firmware
pub const PROTOCOL_VERSION: &[u8] = b"2021-02-27T23:07:41Z";

/// Length of a status image identifier (a SHA-256 of the image name)
pub const IMAGE_ID_LEN: usize = 32;

/// Maximum number of entries in a request schedule
pub const MAX_SCHEDULE_LEN: usize = 20;

/// Countdown value meaning "never"
pub const NEVER: i32 = i32::MAX;

/// Fixed-width status image identifier
pub type ImageId = [u8; IMAGE_ID_LEN];

/// Errors detected while validating a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload does not start with [`MAGIC`]
    BadMagic,
    /// Payload ended before a complete message was read
    Truncated,
    /// Request was built for a different protocol version
    VersionMismatch,
}

/// Build the request payload: magic followed by the protocol version block
pub fn request_payload() -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_bytes(&MAGIC);
    writer.write_block(Some(PROTOCOL_VERSION));
    writer.finish().unwrap_or_default()
}

/// Validate a request payload as a server would
pub fn decode_request(payload: &[u8]) -> Result<(), FrameError> {
    let mut reader = Reader::new(payload);
    let mut magic = [0u8; MAGIC.len()];
    reader.read_bytes(&mut magic);
    if reader.passed_eof() || magic != MAGIC {
        return Err(FrameError::BadMagic);
    }

    let version = reader.read_block();
    if reader.passed_eof() {
        return Err(FrameError::Truncated);
    }
    if version.as_deref() != Some(PROTOCOL_VERSION) {
        return Err(FrameError::VersionMismatch);
    }
    Ok(())
}

/// A response payload, as produced by a server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame<'a> {
    /// Request schedule in tenths of a second
    pub schedule_ds: &'a [i32],
    /// Status image to show when the screensaver fires
    pub screensaver_id: ImageId,
    /// Tenths of a second until the screensaver fires, or [`NEVER`]
    pub screensaver_countdown_ds: i32,
    /// Encoded PNG image
    pub image: &'a [u8],
}

impl ResponseFrame<'_> {
    /// Append this frame to `writer`
    pub fn write_to(&self, writer: &mut Writer) {
        writer.write_bytes(&MAGIC);
        writer.write_int(self.schedule_ds.len() as i32);
        for &entry in self.schedule_ds {
            writer.write_int(entry);
        }
        writer.write_bytes(&self.screensaver_id);
        writer.write_int(self.screensaver_countdown_ds);
        writer.write_int(self.image.len() as i32);
        writer.write_bytes(self.image);
    }

    /// Encode this frame into a fresh buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write_to(&mut writer);
        writer.finish().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_layout() {
        let payload = request_payload();
        assert_eq!(&payload[..12], &MAGIC);
        assert_eq!(&payload[12..16], &(PROTOCOL_VERSION.len() as i32).to_le_bytes());
        assert_eq!(&payload[16..], PROTOCOL_VERSION);
    }

    #[test]
    fn test_decode_request_accepts_own_payload() {
        assert_eq!(decode_request(&request_payload()), Ok(()));
    }

    #[test]
    fn test_decode_request_rejects_bad_magic() {
        let mut payload = request_payload();
        payload[0] ^= 0xFF;
        assert_eq!(decode_request(&payload), Err(FrameError::BadMagic));
        assert_eq!(decode_request(&MAGIC[..5]), Err(FrameError::BadMagic));
    }

    #[test]
    fn test_decode_request_rejects_other_version() {
        let mut writer = Writer::new();
        writer.write_bytes(&MAGIC);
        writer.write_block(Some(b"1999-01-01T00:00:00Z".as_slice()));
        let payload = writer.finish().unwrap();
        assert_eq!(decode_request(&payload), Err(FrameError::VersionMismatch));
    }

    #[test]
    fn test_decode_request_truncated_version() {
        let payload = request_payload();
        assert_eq!(
            decode_request(&payload[..payload.len() - 1]),
            Err(FrameError::Truncated)
        );
    }

    #[test]
    fn test_response_layout() {
        let frame = ResponseFrame {
            schedule_ds: &[50, 100],
            screensaver_id: [7u8; IMAGE_ID_LEN],
            screensaver_countdown_ds: NEVER,
            image: b"png",
        };
        let data = frame.encode();

        let mut reader = Reader::new(&data[..]);
        let mut magic = [0u8; 12];
        reader.read_bytes(&mut magic);
        assert_eq!(magic, MAGIC);
        assert_eq!(reader.read_int(), 2);
        assert_eq!(reader.read_int(), 50);
        assert_eq!(reader.read_int(), 100);
        let mut id = [0u8; IMAGE_ID_LEN];
        reader.read_bytes(&mut id);
        assert_eq!(id, [7u8; IMAGE_ID_LEN]);
        assert_eq!(reader.read_int(), NEVER);
        assert_eq!(reader.read_int(), 3);
        let mut image = [0u8; 3];
        reader.read_bytes(&mut image);
        assert_eq!(&image, b"png");
        assert!(!reader.passed_eof());
        assert_eq!(data.len(), 12 + 4 + 8 + 32 + 4 + 4 + 3);
    }
}
