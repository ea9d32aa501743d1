//! Push-based streaming PNG decoder
//!
//! Bytes are fed in arbitrary slices as they arrive from the network. Chunks
//! are parsed incrementally, IDAT data is inflated as it comes in, and each
//! scanline is unfiltered and handed to an [`RgbSink`] as soon as it is
//! complete, so memory use is two scanlines plus the inflate window no matter
//! how large the image is.
//!
//! Supported: colour types 0, 2, 3, 4 and 6; bit depths 1/2/4/8/16 for grey,
//! 1/2/4/8 for palette and 8/16 for the rest; all five row filters.
//! Not supported: interlacing. Ancillary chunks are skipped, alpha is ignored
//! and CRCs are not checked.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use miniz_oxide::inflate::stream::{inflate, InflateState};
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};

use crate::backend::RgbSink;
use crate::image::PNG_SIGNATURE as SIGNATURE;

/// Widest image accepted; bounds the scanline allocation
pub const MAX_WIDTH: u32 = 4096;

const INFLATE_OUT_BYTES: usize = 1024;
const MAX_PALETTE_BYTES: usize = 256 * 3;

/// PNG decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PngError {
    /// Stream does not start with the PNG signature
    Signature,
    /// IHDR missing, malformed, or out of order
    Header,
    /// Valid PNG feature this decoder does not handle
    Unsupported,
    /// Image wider than [`MAX_WIDTH`]
    TooLarge,
    /// Missing or malformed PLTE, or a pixel index outside it
    Palette,
    /// Corrupt zlib stream
    Inflate,
    /// Unknown scanline filter type
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    Header,
    Palette,
    Data,
    End,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Signature,
    ChunkHeader,
    Chunk { kind: ChunkKind, remaining: usize },
    Crc { last: bool },
    Done,
}

#[derive(Debug, Clone, Copy)]
struct Header {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    /// Bytes per complete pixel, at least one (filter stride)
    stride: usize,
    /// Bytes in an unfiltered scanline, excluding the filter byte
    row_bytes: usize,
}

impl Header {
    fn parse(bytes: &[u8; 13]) -> Result<Self, PngError> {
        let width = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let height = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let bit_depth = bytes[8];
        let color_type = bytes[9];
        let (compression, filter, interlace) = (bytes[10], bytes[11], bytes[12]);

        if width == 0 || height == 0 || compression != 0 || filter != 0 {
            return Err(PngError::Header);
        }
        if interlace != 0 {
            return Err(PngError::Unsupported);
        }
        if width > MAX_WIDTH {
            return Err(PngError::TooLarge);
        }

        let channels = match (color_type, bit_depth) {
            (0, 1 | 2 | 4 | 8 | 16) => 1,
            (3, 1 | 2 | 4 | 8) => 1,
            (2, 8 | 16) => 3,
            (4, 8 | 16) => 2,
            (6, 8 | 16) => 4,
            (0 | 2 | 3 | 4 | 6, _) => return Err(PngError::Header),
            _ => return Err(PngError::Unsupported),
        };
        let bits_per_pixel = channels * bit_depth as usize;
        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            stride: bits_per_pixel.div_ceil(8).max(1),
            row_bytes: (width as usize * bits_per_pixel).div_ceil(8),
        })
    }
}

/// Streaming PNG decoder
///
/// Holds about 11 KB of inflate state, so keep one around and [`reset`] it
/// between images rather than building a new one each time.
///
/// [`reset`]: PngDecoder::reset
pub struct PngDecoder {
    stage: Stage,
    scratch: [u8; 13],
    scratch_len: usize,
    header: Option<Header>,
    palette: Vec<u8>,
    inflater: Box<InflateState>,
    inflate_out: Vec<u8>,
    stream_ended: bool,
    /// Current scanline including its leading filter byte
    row: Vec<u8>,
    prev_row: Vec<u8>,
    row_fill: usize,
    row_index: u32,
}

impl Default for PngDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PngDecoder {
    pub fn new() -> Self {
        Self {
            stage: Stage::Signature,
            scratch: [0; 13],
            scratch_len: 0,
            header: None,
            palette: Vec::new(),
            inflater: InflateState::new_boxed(DataFormat::Zlib),
            inflate_out: vec![0; INFLATE_OUT_BYTES],
            stream_ended: false,
            row: Vec::new(),
            prev_row: Vec::new(),
            row_fill: 0,
            row_index: 0,
        }
    }

    /// Forget the current image and get ready for a new one
    pub fn reset(&mut self) {
        self.stage = Stage::Signature;
        self.scratch_len = 0;
        self.header = None;
        self.palette.clear();
        self.inflater.reset(DataFormat::Zlib);
        self.stream_ended = false;
        self.row.clear();
        self.prev_row.clear();
        self.row_fill = 0;
        self.row_index = 0;
    }

    /// Image dimensions, once IHDR has been seen
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.header.map(|h| (h.width, h.height))
    }

    /// Whether the IEND chunk has been consumed
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Decode the next slice of the file, emitting finished rows to `sink`
    ///
    /// After an error the decoder is stuck until [`PngDecoder::reset`]; bytes
    /// after IEND are ignored.
    pub fn feed<S: RgbSink + ?Sized>(
        &mut self,
        mut data: &[u8],
        sink: &mut S,
    ) -> Result<(), PngError> {
        loop {
            match self.stage {
                Stage::Done => return Ok(()),
                Stage::Chunk { kind, remaining: 0 } => {
                    self.end_chunk(kind)?;
                    self.stage = Stage::Crc {
                        last: kind == ChunkKind::End,
                    };
                    continue;
                }
                _ => {}
            }
            if data.is_empty() {
                return Ok(());
            }

            match self.stage {
                Stage::Signature => {
                    if self.fill_scratch(&mut data, SIGNATURE.len()) {
                        if self.scratch[..8] != SIGNATURE {
                            return Err(PngError::Signature);
                        }
                        self.stage = Stage::ChunkHeader;
                    }
                }
                Stage::ChunkHeader => {
                    if self.fill_scratch(&mut data, 8) {
                        let s = &self.scratch;
                        let len = u32::from_be_bytes([s[0], s[1], s[2], s[3]]) as usize;
                        let tag = [s[4], s[5], s[6], s[7]];
                        let kind = self.begin_chunk(&tag, len)?;
                        self.stage = Stage::Chunk {
                            kind,
                            remaining: len,
                        };
                    }
                }
                Stage::Chunk { kind, remaining } => {
                    let take = remaining.min(data.len());
                    let (now, rest) = data.split_at(take);
                    match kind {
                        ChunkKind::Header => {
                            let start = 13 - remaining;
                            self.scratch[start..start + take].copy_from_slice(now);
                        }
                        ChunkKind::Palette => self.palette.extend_from_slice(now),
                        ChunkKind::Data => self.inflate_data(now, sink)?,
                        ChunkKind::End | ChunkKind::Skip => {}
                    }
                    data = rest;
                    self.stage = Stage::Chunk {
                        kind,
                        remaining: remaining - take,
                    };
                }
                Stage::Crc { last } => {
                    if self.fill_scratch(&mut data, 4) {
                        self.stage = if last { Stage::Done } else { Stage::ChunkHeader };
                    }
                }
                Stage::Done => {}
            }
        }
    }

    /// Accumulate `want` bytes into the scratch buffer; true once complete
    fn fill_scratch(&mut self, data: &mut &[u8], want: usize) -> bool {
        let take = (want - self.scratch_len).min(data.len());
        self.scratch[self.scratch_len..self.scratch_len + take].copy_from_slice(&data[..take]);
        self.scratch_len += take;
        *data = &data[take..];
        if self.scratch_len == want {
            self.scratch_len = 0;
            true
        } else {
            false
        }
    }

    fn begin_chunk(&mut self, tag: &[u8; 4], len: usize) -> Result<ChunkKind, PngError> {
        let kind = match tag {
            b"IHDR" => ChunkKind::Header,
            b"PLTE" => ChunkKind::Palette,
            b"IDAT" => ChunkKind::Data,
            b"IEND" => ChunkKind::End,
            _ => ChunkKind::Skip,
        };
        match kind {
            ChunkKind::Header if len != 13 || self.header.is_some() => Err(PngError::Header),
            ChunkKind::Header => Ok(kind),
            _ if self.header.is_none() => Err(PngError::Header),
            ChunkKind::Palette if len % 3 != 0 || len > MAX_PALETTE_BYTES => {
                Err(PngError::Palette)
            }
            ChunkKind::Data if self.is_indexed() && self.palette.is_empty() => {
                Err(PngError::Palette)
            }
            _ => Ok(kind),
        }
    }

    fn end_chunk(&mut self, kind: ChunkKind) -> Result<(), PngError> {
        if kind == ChunkKind::Header {
            let header = Header::parse(&self.scratch)?;
            self.row = vec![0; header.row_bytes + 1];
            self.prev_row = vec![0; header.row_bytes];
            self.header = Some(header);
        }
        Ok(())
    }

    fn is_indexed(&self) -> bool {
        self.header.is_some_and(|h| h.color_type == 3)
    }

    fn inflate_data<S: RgbSink + ?Sized>(
        &mut self,
        mut input: &[u8],
        sink: &mut S,
    ) -> Result<(), PngError> {
        while !self.stream_ended {
            let result = inflate(&mut self.inflater, input, &mut self.inflate_out, MZFlush::None);
            input = &input[result.bytes_consumed..];
            for i in 0..result.bytes_written {
                let byte = self.inflate_out[i];
                self.push_byte(byte, sink)?;
            }

            match result.status {
                Ok(MZStatus::StreamEnd) => self.stream_ended = true,
                Ok(_) | Err(MZError::Buf) => {}
                Err(_) => return Err(PngError::Inflate),
            }

            // Stop once the input is used up and the output buffer was not
            // filled, meaning the inflater has nothing more buffered.
            let output_full = result.bytes_written == self.inflate_out.len();
            if (input.is_empty() && !output_full)
                || (result.bytes_consumed == 0 && result.bytes_written == 0)
            {
                break;
            }
        }
        Ok(())
    }

    fn push_byte<S: RgbSink + ?Sized>(&mut self, byte: u8, sink: &mut S) -> Result<(), PngError> {
        let Some(header) = self.header else {
            return Err(PngError::Header);
        };
        if self.row_index >= header.height {
            return Ok(());
        }
        self.row[self.row_fill] = byte;
        self.row_fill += 1;
        if self.row_fill < self.row.len() {
            return Ok(());
        }

        let (filter, line) = self.row.split_at_mut(1);
        unfilter(filter[0], line, &self.prev_row, header.stride)?;
        emit_row(&header, line, &self.palette, self.row_index, sink)?;
        self.prev_row.copy_from_slice(line);
        self.row_fill = 0;
        self.row_index += 1;
        Ok(())
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverse a scanline filter in place
fn unfilter(filter: u8, line: &mut [u8], prev: &[u8], stride: usize) -> Result<(), PngError> {
    match filter {
        0 => {}
        1 => {
            for i in stride..line.len() {
                line[i] = line[i].wrapping_add(line[i - stride]);
            }
        }
        2 => {
            for (byte, &up) in line.iter_mut().zip(prev) {
                *byte = byte.wrapping_add(up);
            }
        }
        3 => {
            for i in 0..line.len() {
                let left = if i >= stride { line[i - stride] } else { 0 };
                let avg = ((left as u16 + prev[i] as u16) / 2) as u8;
                line[i] = line[i].wrapping_add(avg);
            }
        }
        4 => {
            for i in 0..line.len() {
                let (left, up_left) = if i >= stride {
                    (line[i - stride], prev[i - stride])
                } else {
                    (0, 0)
                };
                line[i] = line[i].wrapping_add(paeth(left, prev[i], up_left));
            }
        }
        _ => return Err(PngError::Filter),
    }
    Ok(())
}

/// Sample `index` from a row of packed sub-byte values (MSB first)
fn packed(line: &[u8], index: usize, depth: u8) -> u8 {
    let depth = depth as usize;
    let bit = index * depth;
    let shift = 8 - depth - bit % 8;
    let mask = ((1u16 << depth) - 1) as u8;
    (line[bit / 8] >> shift) & mask
}

fn emit_row<S: RgbSink + ?Sized>(
    header: &Header,
    line: &[u8],
    palette: &[u8],
    y: u32,
    sink: &mut S,
) -> Result<(), PngError> {
    let depth = header.bit_depth;
    // 16-bit samples keep their high byte
    let sample_bytes = if depth == 16 { 2 } else { 1 };
    let sample = |offset: usize| line[offset * sample_bytes];

    for x in 0..header.width {
        let i = x as usize;
        let rgb = match header.color_type {
            0 => {
                let value = if depth < 8 {
                    let max = (1u16 << depth) - 1;
                    (packed(line, i, depth) as u16 * 255 / max) as u8
                } else {
                    sample(i)
                };
                [value; 3]
            }
            2 => [sample(i * 3), sample(i * 3 + 1), sample(i * 3 + 2)],
            3 => {
                let index = usize::from(if depth < 8 {
                    packed(line, i, depth)
                } else {
                    line[i]
                });
                match palette.get(index * 3..index * 3 + 3) {
                    Some(entry) => [entry[0], entry[1], entry[2]],
                    None => return Err(PngError::Palette),
                }
            }
            4 => [sample(i * 2); 3],
            6 => [sample(i * 4), sample(i * 4 + 1), sample(i * 4 + 2)],
            _ => return Err(PngError::Unsupported),
        };
        sink.put_rgb(x, y, rgb);
    }
    Ok(())
}
