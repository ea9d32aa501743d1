//! Byte codec shared by the device and the server.
//!
//! - Integers: 4 bytes, little-endian, two's-complement
//! - Blocks: an integer length followed by that many raw bytes. A zero-length
//!   block carries no bytes and reads back as `None`.
//!
//! The reader never fails. Once a read runs past the end of the source the
//! reader latches `passed_eof` and every later read is a no-op, so callers do a
//! run of reads and check the flag once afterwards. Values produced after the
//! flag is set are meaningless.

use alloc::vec::Vec;

use embedded_io::Read;

/// Initial capacity of a [`Writer`] buffer
pub const INITIAL_WRITER_CAPACITY: usize = 64;

/// Accumulates encoded bytes into a growable buffer
///
/// When a write does not fit, the capacity becomes twice the required length.
/// The buffer never shrinks.
#[derive(Debug, Clone)]
pub struct Writer {
    data: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Create an empty writer
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(INITIAL_WRITER_CAPACITY),
        }
    }

    fn ensure_capacity(&mut self, required: usize) {
        if self.data.capacity() < required {
            self.data.reserve_exact(2 * required - self.data.len());
        }
    }

    /// Append raw bytes. Every other write ends up here.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.ensure_capacity(self.data.len() + bytes.len());
        self.data.extend_from_slice(bytes);
    }

    /// Append a 32-bit signed integer
    pub fn write_int(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a length-prefixed block
    ///
    /// `None` and an empty slice both encode as a bare zero length.
    pub fn write_block(&mut self, block: Option<&[u8]>) {
        let bytes = block.unwrap_or(&[]);
        debug_assert!(bytes.len() <= i32::MAX as usize);
        self.write_int(bytes.len() as i32);
        self.write_bytes(bytes);
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current buffer capacity
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Bytes written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the writer, returning the encoded bytes
    ///
    /// Returns `None` when nothing was written.
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.data)
        }
    }
}

/// Step size for reading length-prefixed blocks
const BLOCK_CHUNK: usize = 256;

/// Pull-based decoder over any [`embedded_io::Read`] source
#[derive(Debug)]
pub struct Reader<R> {
    source: R,
    passed_eof: bool,
}

impl<R: Read> Reader<R> {
    /// Wrap a byte source
    pub fn new(source: R) -> Self {
        Self {
            source,
            passed_eof: false,
        }
    }

    /// Fill `buf` from the source. Every other read ends up here.
    ///
    /// A short read or a source error latches the end-of-stream flag; the
    /// contents of `buf` are then unspecified.
    pub fn read_bytes(&mut self, buf: &mut [u8]) {
        if buf.is_empty() || self.passed_eof {
            return;
        }
        if self.source.read_exact(buf).is_err() {
            self.passed_eof = true;
        }
    }

    /// Read a 32-bit signed integer
    pub fn read_int(&mut self) -> i32 {
        let mut bytes = [0u8; 4];
        self.read_bytes(&mut bytes);
        i32::from_le_bytes(bytes)
    }

    /// Read a length-prefixed block
    ///
    /// A zero (or negative) length reads back as `None`. The buffer grows
    /// as bytes arrive, so a bogus length on a short stream stops at the
    /// end of the stream instead of allocating up front.
    pub fn read_block(&mut self) -> Option<Vec<u8>> {
        let len = self.read_int();
        if len <= 0 || self.passed_eof {
            return None;
        }
        let mut remaining = len as usize;
        let mut data = Vec::with_capacity(remaining.min(BLOCK_CHUNK));
        let mut chunk = [0u8; BLOCK_CHUNK];
        while remaining > 0 && !self.passed_eof {
            let take = remaining.min(BLOCK_CHUNK);
            self.read_bytes(&mut chunk[..take]);
            data.extend_from_slice(&chunk[..take]);
            remaining -= take;
        }
        Some(data)
    }

    /// Consume and discard `len` bytes
    pub fn skip(&mut self, mut len: usize) {
        let mut scratch = [0u8; 64];
        while len > 0 && !self.passed_eof {
            let take = len.min(scratch.len());
            self.read_bytes(&mut scratch[..take]);
            len -= take;
        }
    }

    /// Whether any read has run past the end of the source
    pub fn passed_eof(&self) -> bool {
        self.passed_eof
    }

    /// Recover the underlying source
    pub fn into_inner(self) -> R {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_writer_finishes_absent() {
        let writer = Writer::new();
        assert!(writer.is_empty());
        assert_eq!(writer.finish(), None);
    }

    #[test]
    fn test_writer_concatenates() {
        let hello = b"Hello, world!";
        let filler = [42u8; 1000];

        let mut writer = Writer::new();
        writer.write_bytes(&hello[..0]);
        writer.write_bytes(hello);
        writer.write_bytes(&filler);

        let data = writer.finish().unwrap();
        assert_eq!(data.len(), 1013);
        assert_eq!(&data[..13], hello);
        assert!(data[13..].iter().all(|&b| b == 42));
    }

    #[test]
    fn test_writer_grows_to_twice_required() {
        let mut writer = Writer::new();
        assert!(writer.capacity() >= INITIAL_WRITER_CAPACITY);

        writer.write_bytes(&[7u8; 100]);
        assert!(writer.capacity() >= 200);

        for _ in 0..100 {
            writer.write_bytes(b"0123456789abc");
        }
        assert_eq!(writer.len(), 1400);
    }

    #[test]
    fn test_int_encoding_is_little_endian() {
        let mut writer = Writer::new();
        writer.write_int(0x0403_0201);
        writer.write_int(-2);
        assert_eq!(
            writer.as_slice(),
            &[0x01, 0x02, 0x03, 0x04, 0xfe, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_block_encoding() {
        let mut writer = Writer::new();
        writer.write_block(Some(&b"abc"[..]));
        writer.write_block(None);
        writer.write_block(Some(&[]));
        assert_eq!(
            writer.as_slice(),
            &[3, 0, 0, 0, b'a', b'b', b'c', 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_reader_eof_is_sticky() {
        let mut reader = Reader::new(&[0u8; 0][..]);
        assert!(!reader.passed_eof());

        let mut buf = [123u8; 10];
        reader.read_bytes(&mut buf);
        assert!(reader.passed_eof());

        reader.read_bytes(&mut buf[..1]);
        assert!(reader.passed_eof());
        assert_eq!(reader.read_int(), 0);
        assert_eq!(reader.read_block(), None);
        assert!(reader.passed_eof());
    }

    #[test]
    fn test_reader_exact_length_is_not_eof() {
        let mut data = [42u8; 1013];
        data[..13].copy_from_slice(b"Hello, world!");

        let mut reader = Reader::new(&data[..]);
        let mut out = [0u8; 1013];
        reader.read_bytes(&mut out);
        assert_eq!(out, data);
        assert!(!reader.passed_eof());

        // A zero-length read at the end does not touch the source
        reader.read_bytes(&mut out[..0]);
        assert!(!reader.passed_eof());

        reader.read_bytes(&mut out[..1]);
        assert!(reader.passed_eof());
    }

    #[test]
    fn test_reader_short_read_sets_eof() {
        let mut reader = Reader::new(&[1u8, 2, 3][..]);
        let _ = reader.read_int();
        assert!(reader.passed_eof());
    }

    #[test]
    fn test_reader_skip() {
        let data = [9u8; 200];
        let mut reader = Reader::new(&data[..]);
        reader.skip(150);
        assert!(!reader.passed_eof());
        reader.skip(50);
        assert!(!reader.passed_eof());
        reader.skip(1);
        assert!(reader.passed_eof());
    }

    #[test]
    fn test_block_with_oversized_length_stops_at_eof() {
        let mut data = i32::MAX.to_le_bytes().to_vec();
        data.extend_from_slice(&[7u8; 600]);

        let mut reader = Reader::new(&data[..]);
        let block = reader.read_block().unwrap();
        assert!(reader.passed_eof());
        assert!(block.len() <= 600 + BLOCK_CHUNK);
        assert!(block.capacity() < 4096);
    }

    #[test]
    fn test_int_extremes() {
        let mut writer = Writer::new();
        writer.write_int(i32::MIN);
        writer.write_int(i32::MAX);
        writer.write_int(0);
        let data = writer.finish().unwrap();

        let mut reader = Reader::new(&data[..]);
        assert_eq!(reader.read_int(), i32::MIN);
        assert_eq!(reader.read_int(), i32::MAX);
        assert_eq!(reader.read_int(), 0);
        assert!(!reader.passed_eof());
    }

    proptest! {
        #[test]
        fn prop_int_roundtrip(value in any::<i32>()) {
            let mut writer = Writer::new();
            writer.write_int(value);
            let data = writer.finish().unwrap();

            let mut reader = Reader::new(&data[..]);
            prop_assert_eq!(reader.read_int(), value);
            prop_assert!(!reader.passed_eof());
        }

        #[test]
        fn prop_block_roundtrip(block in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..300))) {
            let mut writer = Writer::new();
            writer.write_block(block.as_deref());
            let data = writer.finish().unwrap();

            let mut reader = Reader::new(&data[..]);
            let read = reader.read_block();
            let expected = block.filter(|b| !b.is_empty());
            prop_assert_eq!(read, expected);
            prop_assert!(!reader.passed_eof());
        }
    }
}
