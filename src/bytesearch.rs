use std::fmt;

/// A ByteSet is any set of bytes.
pub trait ByteSet {
    /// \return whether the ByteSet contains the byte.
    fn contains(&self, b: u8) -> bool;
}

/// A helper function for formatting bitmaps, using - ranges.
fn format_bitmap<Func>(name: &str, f: &mut fmt::Formatter<'_>, contains: Func) -> fmt::Result
where
    Func: Fn(u8) -> bool,
{
    write!(f, "{}[", name)?;
    let mut idx = 0;
    let mut maybe_space = "";
    while idx <= 256 {
        // Compute the next value not contained.
        let mut end = idx;
        while end < 256 && contains(end as u8) {
            end += 1;
        }
        match end - idx {
            0 => (),
            1 => write!(f, "{}{}", maybe_space, idx)?,
            _ => write!(f, "{}{}-{}", maybe_space, idx, end - 1)?,
        };
        if end > idx {
            maybe_space = " ";
        }
        idx = end + 1
    }
    write!(f, "]")?;
    Ok(())
}

/// A bitmap covering ASCII characters.
#[derive(Default, Copy, Clone, PartialEq, Eq)]
#[repr(align(4))]
pub struct AsciiBitmap(pub [u8; 16]);

impl AsciiBitmap {
    /// Set a byte val in this bitmap.
    #[inline(always)]
    pub fn set(&mut self, val: u8) {
        debug_assert!(val <= 127, "Value should be ASCII");
        self.0[(val >> 3) as usize] |= 1 << (val & 0x7);
    }
}

impl fmt::Debug for AsciiBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_bitmap("AsciiBitmap", f, |v| self.contains(v))
    }
}

impl ByteSet for AsciiBitmap {
    /// \return whether this bitmap contains a given value.
    /// The value does NOT have to be ASCII.
    #[inline(always)]
    fn contains(&self, val: u8) -> bool {
        // Mask off the MSB so the byte index is always in range, then zero
        // the probe mask for non-ASCII values.
        let byte = (val & 0x7F) >> 3;
        let bit = val & 0x7;
        let mask = ((val >> 7) ^ 1) << bit;
        (self.0[byte as usize] & mask) != 0
    }
}

/// A bitmap covering all bytes.
#[derive(Default, Copy, Clone, PartialEq, Eq)]
#[repr(align(4))]
pub struct ByteBitmap([u16; 16]);

impl ByteBitmap {
    /// Construct from a sequence of bytes.
    pub fn new(bytes: &[u8]) -> ByteBitmap {
        let mut bb = ByteBitmap::default();
        for &b in bytes {
            bb.set(b)
        }
        bb
    }

    /// \return whether this bitmap contains a given byte val.
    #[inline(always)]
    pub fn contains(&self, val: u8) -> bool {
        let byte = val >> 4;
        let bit = val & 0xF;
        (self.0[byte as usize] & (1 << bit)) != 0
    }

    /// Set a bit in this bitmap.
    #[inline(always)]
    pub fn set(&mut self, val: u8) {
        let byte = val >> 4;
        let bit = val & 0xF;
        self.0[byte as usize] |= 1 << bit;
    }

    /// Update ourselves from another bitmap, in place.
    pub fn bitor(&mut self, rhs: &ByteBitmap) {
        for idx in 0..self.0.len() {
            self.0[idx] |= rhs.0[idx];
        }
    }

    /// Count number of set bits.
    pub fn count_bits(&self) -> u32 {
        self.0.iter().map(|v| v.count_ones()).sum()
    }

    /// \return all set bytes, as a vec.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_vec(&self) -> Vec<u8> {
        (0..=255).filter(|b| self.contains(*b)).collect()
    }

    /// \return the index of the first byte in the slice present in this bitmap.
    #[inline]
    pub fn find_in(&self, bytes: &[u8]) -> Option<usize> {
        bytes.iter().position(|&b| self.contains(b))
    }

    /// \return the index of the last byte in the slice present in this bitmap.
    #[inline]
    pub fn rfind_in(&self, bytes: &[u8]) -> Option<usize> {
        bytes.iter().rposition(|&b| self.contains(b))
    }
}

impl ByteSet for ByteBitmap {
    #[inline(always)]
    fn contains(&self, b: u8) -> bool {
        ByteBitmap::contains(self, b)
    }
}

impl fmt::Debug for ByteBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_bitmap("ByteBitmap", f, |v| self.contains(v))
    }
}

/// A set of up to three bytes, searched with memchr.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SmallByteSet {
    One(u8),
    Two(u8, u8),
    Three(u8, u8, u8),
}

impl SmallByteSet {
    /// \return a set for the given bytes, if there are between one and three.
    pub fn new(bytes: &[u8]) -> Option<SmallByteSet> {
        match *bytes {
            [a] => Some(SmallByteSet::One(a)),
            [a, b] => Some(SmallByteSet::Two(a, b)),
            [a, b, c] => Some(SmallByteSet::Three(a, b, c)),
            _ => None,
        }
    }

    #[inline]
    pub fn find_in(&self, bytes: &[u8]) -> Option<usize> {
        match *self {
            SmallByteSet::One(a) => memchr::memchr(a, bytes),
            SmallByteSet::Two(a, b) => memchr::memchr2(a, b, bytes),
            SmallByteSet::Three(a, b, c) => memchr::memchr3(a, b, c, bytes),
        }
    }

    #[inline]
    pub fn rfind_in(&self, bytes: &[u8]) -> Option<usize> {
        match *self {
            SmallByteSet::One(a) => memchr::memrchr(a, bytes),
            SmallByteSet::Two(a, b) => memchr::memrchr2(a, b, bytes),
            SmallByteSet::Three(a, b, c) => memchr::memrchr3(a, b, c, bytes),
        }
    }
}

/// Boyer-Moore literal scanner with bad-character and good-suffix tables.
/// Scans left to right, or right to left with the shift direction mirrored.
/// Case-insensitive scanning is supported for ASCII patterns only.
#[derive(Clone)]
pub struct BoyerMoore {
    /// The pattern in scan order: reversed when scanning right to left, and
    /// lowered when case-insensitive.
    pattern: Box<[u8]>,
    icase: bool,
    right_to_left: bool,
    /// Bad-character shift for ASCII bytes: distance from the last
    /// occurrence of the byte to the end of the pattern.
    ascii: [usize; 128],
    /// Bad-character shifts for the non-ASCII bytes present, sorted by byte.
    sparse: Box<[(u8, usize)]>,
    /// Shift for a mismatch at each index once the suffix after it matched.
    good_suffix: Box<[usize]>,
}

impl BoyerMoore {
    pub fn new(literal: &[u8], icase: bool, right_to_left: bool) -> BoyerMoore {
        debug_assert!(!literal.is_empty());
        debug_assert!(!icase || literal.is_ascii());
        let mut pattern: Vec<u8> = literal
            .iter()
            .map(|b| if icase { b.to_ascii_lowercase() } else { *b })
            .collect();
        if right_to_left {
            pattern.reverse();
        }
        let len = pattern.len();

        let mut ascii = [len; 128];
        let mut sparse: Vec<(u8, usize)> = Vec::new();
        for (idx, &b) in pattern[..len - 1].iter().enumerate() {
            let shift = len - 1 - idx;
            if b < 128 {
                ascii[b as usize] = shift;
            } else {
                match sparse.iter_mut().find(|(sb, _)| *sb == b) {
                    Some(entry) => entry.1 = shift,
                    None => sparse.push((b, shift)),
                }
            }
        }
        sparse.sort_unstable();

        BoyerMoore {
            good_suffix: good_suffix_table(&pattern),
            pattern: pattern.into_boxed_slice(),
            icase,
            right_to_left,
            ascii,
            sparse: sparse.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn right_to_left(&self) -> bool {
        self.right_to_left
    }

    #[inline]
    fn bad_char_shift(&self, b: u8) -> usize {
        if b < 128 {
            self.ascii[b as usize]
        } else {
            match self.sparse.binary_search_by_key(&b, |&(sb, _)| sb) {
                Ok(idx) => self.sparse[idx].1,
                Err(_) => self.pattern.len(),
            }
        }
    }

    /// Search over a virtual haystack of `n` bytes given by `at`, returning
    /// the offset of the first occurrence.
    #[inline]
    fn search<F: Fn(usize) -> u8>(&self, n: usize, at: F) -> Option<usize> {
        let m = self.pattern.len();
        let fold = |b: u8| if self.icase { b.to_ascii_lowercase() } else { b };
        let mut s = 0;
        while s + m <= n {
            let mut j = m;
            while j > 0 && self.pattern[j - 1] == fold(at(s + j - 1)) {
                j -= 1;
            }
            if j == 0 {
                return Some(s);
            }
            let bad = self.bad_char_shift(fold(at(s + m - 1)));
            s += bad.max(self.good_suffix[j - 1]);
        }
        None
    }

    /// Find the first occurrence at or after `start`, returning its start.
    pub fn find(&self, haystack: &[u8], start: usize) -> Option<usize> {
        debug_assert!(!self.right_to_left);
        let hay = haystack.get(start..)?;
        self.search(hay.len(), |i| hay[i]).map(|i| i + start)
    }

    /// Find the last occurrence ending at or before `end`, returning its end.
    pub fn rfind(&self, haystack: &[u8], end: usize) -> Option<usize> {
        debug_assert!(self.right_to_left);
        let hay = haystack.get(..end)?;
        self.search(hay.len(), |i| hay[hay.len() - 1 - i])
            .map(|i| hay.len() - i)
    }
}

/// Build the good-suffix shift table. Entry `j` is the shift to apply when
/// `pattern[j]` mismatched after `pattern[j+1..]` matched.
fn good_suffix_table(pattern: &[u8]) -> Box<[usize]> {
    let m = pattern.len();
    let mut shift = vec![0usize; m + 1];
    let mut border = vec![0usize; m + 1];

    // Case 1: the matched suffix occurs elsewhere in the pattern.
    let mut i = m;
    let mut j = m + 1;
    border[i] = j;
    while i > 0 {
        while j <= m && pattern[i - 1] != pattern[j - 1] {
            if shift[j] == 0 {
                shift[j] = j - i;
            }
            j = border[j];
        }
        i -= 1;
        j -= 1;
        border[i] = j;
    }

    // Case 2: only a prefix of the pattern matches a suffix of the match.
    let mut j = border[0];
    for (i, s) in shift.iter_mut().enumerate() {
        if *s == 0 {
            *s = j;
        }
        if i == j {
            j = border[j];
        }
    }

    // shift[k] applies when the mismatch was at k - 1.
    shift[1..].to_vec().into_boxed_slice()
}

impl fmt::Debug for BoyerMoore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut literal = self.pattern.to_vec();
        if self.right_to_left {
            literal.reverse();
        }
        write!(
            f,
            "BoyerMoore({:?}{}{})",
            String::from_utf8_lossy(&literal),
            if self.icase { ", icase" } else { "" },
            if self.right_to_left { ", rtl" } else { "" }
        )
    }
}
