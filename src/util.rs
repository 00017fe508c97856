use crate::bytesearch::ByteBitmap;
use crate::charclass::{CharRange, CODE_POINT_MAX};

/// \return the first byte of a UTF-8 encoded code point.
/// We do not use char because we don't want to deal with failing on surrogates.
#[inline(always)]
pub fn utf8_first_byte(cp: u32) -> u8 {
    debug_assert!(cp <= CODE_POINT_MAX);
    if cp < 0x80 {
        // One byte encoding.
        cp as u8
    } else if cp < 0x800 {
        // Two byte encoding.
        ((cp >> 6) & 0x1F) as u8 | 0b1100_0000
    } else if cp < 0x10000 {
        // Three byte encoding.
        ((cp >> 12) & 0x0F) as u8 | 0b1110_0000
    } else {
        // Four byte encoding.
        ((cp >> 18) & 0x07) as u8 | 0b1111_0000
    }
}

/// Add all of the first bytes of a code point range to a byte bitmap.
pub fn add_utf8_first_bytes_to_bitmap(range: CharRange, bitmap: &mut ByteBitmap) {
    // Note this is an inclusive range.
    let CharRange { first, last } = range;
    let ranges = [
        (first, last.min(0x7F)),              // 1 byte range
        (first.max(0x80), last.min(0x7FF)),   // 2 byte range
        (first.max(0x800), last.min(0xFFFF)), // 3 byte range
        (first.max(0x10000), last),           // 4 byte range
    ];
    for (first, last) in ranges.into_iter() {
        if first <= last {
            for byte in utf8_first_byte(first)..=utf8_first_byte(last) {
                bitmap.set(byte);
            }
        }
    }
}

/// \return the char boundary following `pos`, or None at the end.
#[inline]
pub fn next_char_pos(text: &str, pos: usize) -> Option<usize> {
    text[pos..].chars().next().map(|c| pos + c.len_utf8())
}

/// \return the char boundary preceding `pos`, or None at the start.
#[inline]
pub fn prev_char_pos(text: &str, pos: usize) -> Option<usize> {
    text[..pos].chars().next_back().map(|c| pos - c.len_utf8())
}
