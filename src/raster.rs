//! Raster encoding.
//!
//! The tape feeds perpendicular to the rows of the source image, so each
//! column of the image becomes one raster line of the print head. Lines are
//! centered on the 128-pin head with blank margin bits on both sides, packed
//! MSB first, and sent in 16-byte chunks compressed with PackBits.

use image::{DynamicImage, GenericImageView, RgbaImage};
use log::debug;

use crate::{error::Error, media::Tape};

/// Number of pins on the print head.
pub const HEAD_DOTS: u32 = 128;

/// Bytes per raster line transfer.
pub const CHUNK_SIZE: usize = 16;

const ZERO_COMMAND: u8 = 0x5A;
const RASTER_COMMAND: u8 = 0x47;

const MAX_RUN: usize = 128;

/// Source of per-pixel ink samples.
///
/// A sample above zero prints a dot.
pub trait Bitmap {
    fn dimensions(&self) -> (u32, u32);
    fn ink(&self, x: u32, y: u32) -> u8;
}

/// Ink is the alpha channel.
impl Bitmap for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn ink(&self, x: u32, y: u32) -> u8 {
        self.get_pixel(x, y)[3]
    }
}

impl Bitmap for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn ink(&self, x: u32, y: u32) -> u8 {
        self.get_pixel(x, y)[3]
    }
}

/// Blank dots on each side of a line for a given printable height.
pub fn margin(target_height: u32) -> u32 {
    (HEAD_DOTS - target_height) / 2
}

struct BitWriter {
    buf: Vec<u8>,
    byte: u8,
    bits: u8,
}

impl BitWriter {
    fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            buf: Vec::with_capacity(capacity),
            byte: 0,
            bits: 0,
        }
    }

    fn push(&mut self, bit: bool) {
        if bit {
            self.byte |= 1 << (7 - self.bits);
        }
        self.bits += 1;
        if self.bits == 8 {
            self.buf.push(self.byte);
            self.byte = 0;
            self.bits = 0;
        }
    }

    fn skip(&mut self, count: u32) {
        for _ in 0..count {
            self.push(false);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.buf.push(self.byte);
        }
        self.buf
    }
}

/// Convert a bitmap into the raster payload for the given tape.
///
/// The bitmap height must match the printable dots of the tape exactly.
pub fn encode(bitmap: &impl Bitmap, tape: Tape) -> Result<Vec<u8>, Error> {
    let target_height = tape.dots();
    let (width, height) = bitmap.dimensions();

    if height != target_height {
        return Err(Error::SizeMismatch {
            expected: target_height,
            actual: height,
        });
    }

    let margin = margin(target_height);
    let line_bits = (margin * 2 + height) as usize;
    let mut writer = BitWriter::with_capacity(width as usize * line_bits / 8 + 1);

    for x in 0..width {
        writer.skip(margin);
        for y in 0..height {
            writer.push(bitmap.ink(x, y) > 0);
        }
        writer.skip(margin);
    }

    let payload = writer.finish();
    debug!(
        "encoded {}x{} bitmap with margin {} into {} bytes",
        width,
        height,
        margin,
        payload.len()
    );
    Ok(payload)
}

/// PackBits compression.
///
/// A header `n` in `0..=127` is followed by `n + 1` literal bytes, a header
/// `-n` in `-127..=-1` by one byte repeated `n + 1` times.
pub fn pack_bits(data: &[u8]) -> Vec<u8> {
    let mut packed = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let run_value = data[i];
        let mut run_length = 1;

        while i + run_length < data.len()
            && run_length < MAX_RUN
            && data[i + run_length] == run_value
        {
            run_length += 1;
        }

        if run_length > 1 {
            packed.push((1 - run_length as i16) as i8 as u8);
            packed.push(run_value);
            i += run_length;
        } else {
            let start = i;
            while i < data.len() && i - start < MAX_RUN {
                if i + 1 < data.len() && data[i] == data[i + 1] {
                    break;
                }
                i += 1;
            }

            packed.push((i - start - 1) as u8);
            packed.extend_from_slice(&data[start..i]);
        }
    }

    packed
}

/// Lazily compressed raster lines of a payload.
///
/// Each item is one complete transfer unit ready to be written to the
/// printer.
pub struct CompressedLines<'a> {
    chunks: std::slice::Chunks<'a, u8>,
    compress: bool,
}

impl<'a> CompressedLines<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        CompressedLines {
            chunks: payload.chunks(CHUNK_SIZE),
            compress: true,
        }
    }

    /// Send every chunk as an uncompressed raster line.
    pub fn uncompressed(payload: &'a [u8]) -> Self {
        CompressedLines {
            chunks: payload.chunks(CHUNK_SIZE),
            compress: false,
        }
    }
}

impl Iterator for CompressedLines<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;

        if chunk.iter().all(|b| *b == 0) {
            return Some(vec![ZERO_COMMAND]);
        }

        let mut data = if self.compress {
            pack_bits(chunk)
        } else {
            chunk.to_vec()
        };
        let mut line = Vec::with_capacity(data.len() + 3);
        line.push(RASTER_COMMAND);
        line.extend_from_slice(&(data.len() as u16).to_le_bytes());
        line.append(&mut data);
        Some(line)
    }
}

/// Compressed lines of a payload, see [`CompressedLines`].
pub fn rasterize(payload: &[u8]) -> CompressedLines<'_> {
    CompressedLines::new(payload)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    pub(crate) fn unpack_bits(packed: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        let mut i = 0;
        while i < packed.len() {
            let header = packed[i] as i8;
            i += 1;
            if header >= 0 {
                let n = header as usize + 1;
                data.extend_from_slice(&packed[i..i + n]);
                i += n;
            } else if header != -128 {
                let n = (1 - header as i16) as usize;
                data.extend(std::iter::repeat(packed[i]).take(n));
                i += 1;
            }
        }
        data
    }

    pub(crate) struct Mask {
        pub width: u32,
        pub height: u32,
        pub ink: fn(u32, u32) -> bool,
    }

    impl Bitmap for Mask {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn ink(&self, x: u32, y: u32) -> u8 {
            if (self.ink)(x, y) {
                0xFF
            } else {
                0
            }
        }
    }

    struct Untouchable;

    impl Bitmap for Untouchable {
        fn dimensions(&self) -> (u32, u32) {
            (10, 64)
        }

        fn ink(&self, _x: u32, _y: u32) -> u8 {
            panic!("pixels must not be read when the size is wrong")
        }
    }

    #[test]
    fn size_mismatch_never_packs() {
        match encode(&Untouchable, Tape::Tape12) {
            Err(Error::SizeMismatch { expected, actual }) => {
                assert_eq!(expected, 70);
                assert_eq!(actual, 64);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn margins() {
        assert_eq!(margin(24), 52);
        assert_eq!(margin(50), 39);
        assert_eq!(margin(70), 29);
        assert_eq!(margin(112), 8);
        assert_eq!(margin(128), 0);
    }

    #[test]
    fn full_column_on_12mm_tape() {
        let mask = Mask {
            width: 2,
            height: 70,
            ink: |x, _| x == 0,
        };
        let payload = encode(&mask, Tape::Tape12).unwrap();

        let mut expected = vec![0x00, 0x00, 0x00, 0x07];
        expected.extend_from_slice(&[0xFF; 8]);
        expected.extend_from_slice(&[0xE0, 0x00, 0x00, 0x00]);
        expected.extend_from_slice(&[0x00; 16]);
        assert_eq!(payload, expected);
    }

    #[test]
    fn columns_are_read_top_to_bottom() {
        // only the top pixel of the single column is inked
        let mask = Mask {
            width: 1,
            height: 128,
            ink: |_, y| y == 0,
        };
        let payload = encode(&mask, Tape::Tape24).unwrap();
        assert_eq!(payload[0], 0x80);
        assert!(payload[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn alpha_channel_is_the_ink() {
        let mut image = RgbaImage::new(1, 32);
        // opaque white still prints, transparent black does not
        image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 0, 0]));
        image.put_pixel(0, 31, Rgba([0, 0, 0, 1]));

        let payload = encode(&image, Tape::Tape6).unwrap();
        // margin of 48 bits, then the 32 samples
        assert_eq!(payload.len(), 16);
        assert_eq!(&payload[0..6], &[0u8; 6]);
        assert_eq!(payload[6], 0b1000_0000);
        assert_eq!(payload[9], 0b0000_0001);
    }

    #[test]
    fn zero_chunk_is_a_single_marker() {
        let payload = [0u8; 16];
        let lines: Vec<Vec<u8>> = rasterize(&payload).collect();
        assert_eq!(lines, vec![vec![0x5A]]);
    }

    #[test]
    fn data_chunk_has_length_and_round_trips() {
        let chunk: [u8; 16] = [
            0x00, 0x00, 0x00, 0x07, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xE0, 0x00,
            0x00, 0x00,
        ];
        let lines: Vec<Vec<u8>> = rasterize(&chunk).collect();
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line[0], 0x47);
        let len = u16::from_le_bytes([line[1], line[2]]) as usize;
        assert_eq!(len, line.len() - 3);
        assert_eq!(unpack_bits(&line[3..]), chunk.to_vec());
    }

    #[test]
    fn repeated_chunk_vector() {
        let chunk = [0xAAu8; 16];
        let lines: Vec<Vec<u8>> = rasterize(&chunk).collect();
        assert_eq!(lines, vec![vec![0x47, 0x02, 0x00, 0xF1, 0xAA]]);
    }

    #[test]
    fn literal_chunk_vector() {
        let chunk: Vec<u8> = (1..=16).collect();
        let mut expected = vec![0x47, 0x11, 0x00, 0x0F];
        expected.extend_from_slice(&chunk);
        let lines: Vec<Vec<u8>> = rasterize(&chunk).collect();
        assert_eq!(lines, vec![expected]);
    }

    #[test]
    fn short_tail_is_its_own_chunk() {
        let mut payload = vec![0u8; 16];
        payload.extend_from_slice(&[0x01, 0x01, 0x01]);
        let lines: Vec<Vec<u8>> = rasterize(&payload).collect();
        assert_eq!(lines, vec![vec![0x5A], vec![0x47, 0x02, 0x00, 0xFE, 0x01]]);
    }

    #[test]
    fn uncompressed_lines() {
        let chunk = [0xAAu8; 16];
        let lines: Vec<Vec<u8>> = CompressedLines::uncompressed(&chunk).collect();
        let mut expected = vec![0x47, 0x10, 0x00];
        expected.extend_from_slice(&chunk);
        assert_eq!(lines, vec![expected]);
    }

    #[test]
    fn pack_bits_round_trips_long_runs() {
        let mut data = vec![0x55u8; 300];
        data.extend((0..=255u8).chain(0..=255u8));
        data.extend_from_slice(&[7, 7, 8, 9, 9, 9, 10]);

        let packed = pack_bits(&data);
        assert_eq!(unpack_bits(&packed), data);
    }

    #[test]
    fn pack_bits_run_headers_stay_in_range() {
        let data = vec![0x01u8; 128];
        assert_eq!(pack_bits(&data), vec![0x81, 0x01]);

        let data: Vec<u8> = (0..130u8).collect();
        let packed = pack_bits(&data);
        assert_eq!(packed[0], 0x7F);
        assert_eq!(packed[129], 0x01);
        assert_eq!(unpack_bits(&packed), data);
    }
}
