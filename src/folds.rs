//! Lower-case mapping used for case-insensitive matching.
//! Both the pattern and the input are lowered through the same table, so two
//! characters match case-insensitively when their lowered forms are equal.

use crate::charclass::CharRange;
use std::cmp::Ordering;

/// A run of code points sharing a lower-case delta.
/// Only offsets that are multiples of `modulo` are transformed; this encodes
/// the alternating upper/lower runs of the Latin Extended blocks.
#[derive(Debug, Copy, Clone)]
pub struct FoldRange {
    start: u32,
    length: u32,
    delta: i32,
    modulo: u8,
}

const fn fr(start: u32, length: u32, delta: i32, modulo: u8) -> FoldRange {
    FoldRange {
        start,
        length,
        delta,
        modulo,
    }
}

/// Dotted capital I, which lowers to plain 'i' unless culture-invariant.
const CAPITAL_I_DOT: char = '\u{130}';

/// Sorted, disjoint.
static FOLDS: &[FoldRange] = &[
    fr(0x41, 26, 32, 1),
    fr(0xC0, 23, 32, 1),
    fr(0xD8, 7, 32, 1),
    fr(0x100, 48, 1, 2),
    fr(0x132, 6, 1, 2),
    fr(0x139, 16, 1, 2),
    fr(0x14A, 46, 1, 2),
    fr(0x178, 1, -121, 1),
    fr(0x179, 6, 1, 2),
    fr(0x181, 1, 210, 1),
    fr(0x182, 4, 1, 2),
    fr(0x186, 1, 206, 1),
    fr(0x187, 1, 1, 1),
    fr(0x189, 2, 205, 1),
    fr(0x18B, 1, 1, 1),
    fr(0x18E, 1, 79, 1),
    fr(0x18F, 1, 202, 1),
    fr(0x190, 1, 203, 1),
    fr(0x191, 1, 1, 1),
    fr(0x193, 1, 205, 1),
    fr(0x194, 1, 207, 1),
    fr(0x196, 1, 211, 1),
    fr(0x197, 1, 209, 1),
    fr(0x198, 1, 1, 1),
    fr(0x19C, 1, 211, 1),
    fr(0x19D, 1, 213, 1),
    fr(0x19F, 1, 214, 1),
    fr(0x1A0, 6, 1, 2),
    fr(0x1A7, 1, 1, 1),
    fr(0x1A9, 1, 218, 1),
    fr(0x1AC, 1, 1, 1),
    fr(0x1AE, 1, 218, 1),
    fr(0x1AF, 1, 1, 1),
    fr(0x1B1, 2, 217, 1),
    fr(0x1B3, 4, 1, 2),
    fr(0x1B7, 1, 219, 1),
    fr(0x1B8, 1, 1, 1),
    fr(0x1BC, 1, 1, 1),
    fr(0x1C4, 1, 2, 1),
    fr(0x1C5, 1, 1, 1),
    fr(0x1C7, 1, 2, 1),
    fr(0x1C8, 1, 1, 1),
    fr(0x1CA, 1, 2, 1),
    fr(0x1CB, 17, 1, 2),
    fr(0x1DE, 18, 1, 2),
    fr(0x1F1, 1, 2, 1),
    fr(0x1F2, 4, 1, 2),
    fr(0x1F6, 1, -97, 1),
    fr(0x1F7, 1, -56, 1),
    fr(0x1F8, 40, 1, 2),
    fr(0x220, 1, -130, 1),
    fr(0x222, 18, 1, 2),
    fr(0x23A, 1, 10795, 1),
    fr(0x23B, 1, 1, 1),
    fr(0x23D, 1, -163, 1),
    fr(0x23E, 1, 10792, 1),
    fr(0x241, 1, 1, 1),
    fr(0x243, 1, -195, 1),
    fr(0x244, 1, 69, 1),
    fr(0x245, 1, 71, 1),
    fr(0x246, 10, 1, 2),
    fr(0x370, 4, 1, 2),
    fr(0x376, 1, 1, 1),
    fr(0x37F, 1, 116, 1),
    fr(0x386, 1, 38, 1),
    fr(0x388, 3, 37, 1),
    fr(0x38C, 1, 64, 1),
    fr(0x38E, 2, 63, 1),
    fr(0x391, 17, 32, 1),
    fr(0x3A3, 9, 32, 1),
    fr(0x3CF, 1, 8, 1),
    fr(0x3D8, 24, 1, 2),
    fr(0x3F4, 1, -60, 1),
    fr(0x3F7, 1, 1, 1),
    fr(0x3F9, 1, -7, 1),
    fr(0x3FA, 1, 1, 1),
    fr(0x3FD, 3, -130, 1),
    fr(0x400, 16, 80, 1),
    fr(0x410, 32, 32, 1),
    fr(0x460, 34, 1, 2),
    fr(0x48A, 54, 1, 2),
    fr(0x4C0, 1, 15, 1),
    fr(0x4C1, 14, 1, 2),
    fr(0x4D0, 96, 1, 2),
    fr(0x531, 38, 48, 1),
    fr(0x10A0, 38, 7264, 1),
    fr(0x10C7, 1, 7264, 1),
    fr(0x10CD, 1, 7264, 1),
    fr(0x13A0, 80, 38864, 1),
    fr(0x13F0, 6, 8, 1),
    fr(0x1E00, 150, 1, 2),
    fr(0x1E9E, 1, -7615, 1),
    fr(0x1EA0, 96, 1, 2),
    fr(0x1F08, 8, -8, 1),
    fr(0x1F18, 6, -8, 1),
    fr(0x1F28, 8, -8, 1),
    fr(0x1F38, 8, -8, 1),
    fr(0x1F48, 6, -8, 1),
    fr(0x1F59, 7, -8, 2),
    fr(0x1F68, 8, -8, 1),
    fr(0x1F88, 8, -8, 1),
    fr(0x1F98, 8, -8, 1),
    fr(0x1FA8, 8, -8, 1),
    fr(0x1FB8, 2, -8, 1),
    fr(0x1FBA, 2, -74, 1),
    fr(0x1FBC, 1, -9, 1),
    fr(0x1FC8, 4, -86, 1),
    fr(0x1FCC, 1, -9, 1),
    fr(0x1FD8, 2, -8, 1),
    fr(0x1FDA, 2, -100, 1),
    fr(0x1FE8, 2, -8, 1),
    fr(0x1FEA, 2, -112, 1),
    fr(0x1FEC, 1, -7, 1),
    fr(0x1FF8, 2, -128, 1),
    fr(0x1FFA, 2, -126, 1),
    fr(0x1FFC, 1, -9, 1),
    fr(0x2126, 1, -7517, 1),
    fr(0x212A, 1, -8383, 1),
    fr(0x212B, 1, -8262, 1),
    fr(0x2132, 1, 28, 1),
    fr(0x2160, 16, 16, 1),
    fr(0x2183, 1, 1, 1),
    fr(0x24B6, 26, 26, 1),
    fr(0x2C00, 48, 48, 1),
    fr(0x2C60, 1, 1, 1),
    fr(0x2C62, 1, -10743, 1),
    fr(0x2C63, 1, -3814, 1),
    fr(0x2C64, 1, -10727, 1),
    fr(0x2C67, 6, 1, 2),
    fr(0x2C6D, 1, -10780, 1),
    fr(0x2C6E, 1, -10749, 1),
    fr(0x2C6F, 1, -10783, 1),
    fr(0x2C70, 1, -10782, 1),
    fr(0x2C72, 1, 1, 1),
    fr(0x2C75, 1, 1, 1),
    fr(0x2C7E, 2, -10815, 1),
    fr(0x2C80, 100, 1, 2),
    fr(0x2CEB, 4, 1, 2),
    fr(0x2CF2, 1, 1, 1),
    fr(0xA640, 46, 1, 2),
    fr(0xA680, 28, 1, 2),
    fr(0xA722, 14, 1, 2),
    fr(0xA732, 62, 1, 2),
    fr(0xA779, 4, 1, 2),
    fr(0xA77D, 1, -35332, 1),
    fr(0xA77E, 10, 1, 2),
    fr(0xA78B, 1, 1, 1),
    fr(0xA78D, 1, -42280, 1),
    fr(0xA790, 4, 1, 2),
    fr(0xA796, 20, 1, 2),
    fr(0xA7AA, 1, -42308, 1),
    fr(0xA7AB, 1, -42319, 1),
    fr(0xA7AC, 1, -42315, 1),
    fr(0xA7AD, 1, -42305, 1),
    fr(0xA7AE, 1, -42308, 1),
    fr(0xA7B0, 1, -42258, 1),
    fr(0xA7B1, 1, -42282, 1),
    fr(0xA7B2, 1, -42261, 1),
    fr(0xA7B3, 1, 928, 1),
    fr(0xA7B4, 16, 1, 2),
    fr(0xFF21, 26, 32, 1),
    fr(0x10400, 40, 40, 1),
    fr(0x104B0, 36, 40, 1),
    fr(0x10C80, 51, 64, 1),
    fr(0x118A0, 32, 32, 1),
    fr(0x16E40, 32, 32, 1),
    fr(0x1E900, 34, 34, 1),
];

impl FoldRange {
    fn first(&self) -> u32 {
        self.start
    }

    fn last(&self) -> u32 {
        self.start + self.length - 1
    }

    fn add_delta(&self, cu: u32) -> u32 {
        let cs = (cu as i32) + self.delta;
        debug_assert!(0 <= cs && cs <= 0x10FFFF);
        cs as u32
    }

    fn applies_to(&self, cu: u32) -> bool {
        (cu - self.first()) % (self.modulo as u32) == 0
    }

    fn apply(&self, cu: u32) -> u32 {
        debug_assert!(self.first() <= cu && cu <= self.last());
        if self.applies_to(cu) {
            self.add_delta(cu)
        } else {
            cu
        }
    }
}

fn lookup(cu: u32) -> Option<&'static FoldRange> {
    FOLDS
        .binary_search_by(|fr| {
            if fr.first() > cu {
                Ordering::Greater
            } else if fr.last() < cu {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        })
        .ok()
        .map(|idx| &FOLDS[idx])
}

/// \return the lower-case form of `c` used for case-insensitive comparison.
#[inline]
pub fn fold(c: char, culture_invariant: bool) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    if c == CAPITAL_I_DOT {
        return if culture_invariant { c } else { 'i' };
    }
    match lookup(c as u32) {
        Some(fr) => char::from_u32(fr.apply(c as u32)).unwrap_or(c),
        None => c,
    }
}

/// \return whether two characters are equal ignoring case.
#[inline]
pub fn eq_icase(a: char, b: char, culture_invariant: bool) -> bool {
    a == b || fold(a, culture_invariant) == fold(b, culture_invariant)
}

/// Append to `out` the lower-case images of every code point in the inclusive
/// range `first..=last`. Ranges with no lower-case mapping contribute nothing.
pub fn lowercase_ranges(first: u32, last: u32, culture_invariant: bool, out: &mut Vec<CharRange>) {
    if !culture_invariant && first <= CAPITAL_I_DOT as u32 && CAPITAL_I_DOT as u32 <= last {
        out.push(CharRange::single('i'));
    }
    let start_idx = FOLDS.partition_point(|fr| fr.last() < first);
    for fr in &FOLDS[start_idx..] {
        if fr.first() > last {
            break;
        }
        let lo = fr.first().max(first);
        let hi = fr.last().min(last);
        if fr.modulo == 1 {
            out.push(CharRange::new(fr.add_delta(lo), fr.add_delta(hi)));
        } else {
            for cu in lo..=hi {
                if fr.applies_to(cu) {
                    let lowered = fr.add_delta(cu);
                    out.push(CharRange::new(lowered, lowered));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_disjoint() {
        for w in FOLDS.windows(2) {
            assert!(w[0].last() < w[1].first(), "{:?} overlaps {:?}", w[0], w[1]);
        }
        for fr in FOLDS {
            assert!(fr.length > 0);
            for cu in fr.first()..=fr.last() {
                assert!(char::from_u32(fr.apply(cu)).is_some());
            }
        }
    }

    #[test]
    fn folds_match_std_lowercase() {
        // Every mapping in the table must agree with the single-char std lowering.
        for fr in FOLDS {
            for cu in fr.first()..=fr.last() {
                let c = char::from_u32(cu).unwrap();
                let mut lower = c.to_lowercase();
                let (Some(l), None) = (lower.next(), lower.next()) else {
                    continue;
                };
                assert_eq!(fold(c, false), l, "mismatch at {:#x}", cu);
            }
        }
    }

    #[test]
    fn simple_folds() {
        assert_eq!(fold('A', false), 'a');
        assert_eq!(fold('a', false), 'a');
        assert_eq!(fold('Ā', false), 'ā');
        assert_eq!(fold('ā', false), 'ā');
        assert_eq!(fold('Σ', false), 'σ');
        assert_eq!(fold('\u{212A}', false), 'k');
        assert_eq!(fold('Ж', false), 'ж');
        assert!(eq_icase('ß', '\u{1E9E}', false));
        assert!(!eq_icase('a', 'b', false));
    }

    #[test]
    fn dotted_capital_i() {
        assert_eq!(fold('\u{130}', false), 'i');
        assert_eq!(fold('\u{130}', true), '\u{130}');
    }

    #[test]
    fn lowercase_images() {
        let mut out = Vec::new();
        lowercase_ranges('A' as u32, 'Z' as u32, false, &mut out);
        assert_eq!(out, vec![CharRange::new('a' as u32, 'z' as u32)]);

        out.clear();
        lowercase_ranges(0x100, 0x103, false, &mut out);
        assert_eq!(
            out,
            vec![CharRange::new(0x101, 0x101), CharRange::new(0x103, 0x103)]
        );

        out.clear();
        lowercase_ranges('0' as u32, '9' as u32, false, &mut out);
        assert!(out.is_empty());
    }
}
