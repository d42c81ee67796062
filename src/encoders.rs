//! Low-level encoders.
//!
//! This module provides the primitive encoders the module builder is built
//! on: fixed-width little-endian integers, unsigned LEB128 varints, and
//! length-prefixed strings. They can also be used on their own, for example
//! to assemble function bodies or explicit sections by hand. Raw byte runs
//! need no helper; append them with `Vec::extend_from_slice`.

/// Encode a fixed-width byte, truncating `v` to its low 8 bits.
pub fn u8(v: u32) -> [u8; 1] {
    [v as u8]
}

/// Encode a fixed-width little-endian `u16`, truncating `v` to its low 16
/// bits.
pub fn u16(v: u32) -> [u8; 2] {
    (v as u16).to_le_bytes()
}

/// Encode a fixed-width little-endian `u32`.
pub fn u32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

/// Encode a `u32` as a ULEB128 varint.
///
/// This is the sole integer encoding used for counts, indices, and lengths
/// throughout the module format. Zero encodes as the single byte `0x00`.
pub fn varint(n: u32) -> impl ExactSizeIterator<Item = u8> {
    let mut buf = [0; 5];
    let n = leb128::write::unsigned(&mut &mut buf[..], n.into()).unwrap();
    BufIter { buf, range: 0..n }
}

/// Encode a length-prefixed string: a varint character count followed by one
/// byte per character.
///
/// The legacy format has no wider text encoding; characters outside the
/// single-byte range are truncated to their low 8 bits, matching the
/// fixed-width integer encoders.
pub fn str(s: &str) -> impl Iterator<Item = u8> + '_ {
    let count = u32::try_from(s.chars().count()).unwrap();
    varint(count).chain(s.chars().map(|c| c as u32 as u8))
}

// Fixed size arrays don't have `into_iter()` so we can't simply do
// `[..].into_iter().take(n)` :(
struct BufIter {
    buf: [u8; 5],
    range: std::ops::Range<usize>,
}

impl Iterator for BufIter {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        Some(self.buf[self.range.next()?])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl ExactSizeIterator for BufIter {}

#[cfg(test)]
mod test {
    #[test]
    fn fixed_width_truncates() {
        assert_eq!(super::u8(0x1FF), [0xFF]);
        assert_eq!(super::u16(0x12345), [0x45, 0x23]);
        assert_eq!(super::u32(0xDEADBEEF), [0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn varint_boundaries() {
        let enc = |n| super::varint(n).collect::<Vec<u8>>();
        assert_eq!(enc(0), [0x00]);
        assert_eq!(enc(127), [0x7F]);
        assert_eq!(enc(128), [0x80, 0x01]);
        assert_eq!(enc(u32::MAX), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn varint_round_trips() {
        for n in [0, 1, 2, 127, 128, 129, 255, 256, 16383, 16384, u32::MAX] {
            let bytes = super::varint(n).collect::<Vec<u8>>();
            let decoded = leb128::read::unsigned(&mut &bytes[..]).unwrap();
            assert_eq!(decoded, u64::from(n));
        }
    }

    #[test]
    fn strings_are_character_counted_and_byte_truncated() {
        let enc = |s| super::str(s).collect::<Vec<u8>>();
        assert_eq!(enc(""), [0x00]);
        assert_eq!(enc("hi"), [0x02, b'h', b'i']);
        // U+00E9 fits a byte once the prefix is dropped; U+2200 does not and
        // truncates to its low 8 bits. The count field is characters, not
        // encoded bytes.
        assert_eq!(enc("é"), [0x01, 0xE9]);
        assert_eq!(enc("∀"), [0x01, 0x00]);
    }
}
