//! Character class model: ranges, general-category tests, negation and
//! subtraction, plus the immutable descriptor stored in compiled programs.

use crate::bytesearch::{AsciiBitmap, ByteBitmap, ByteSet};
use crate::categories::CategorySet;
use crate::folds;
use crate::util::add_utf8_first_bytes_to_bitmap;
use std::cmp::{self, Ordering};
use std::fmt;
use std::sync::OnceLock;

/// The maximum (inclusive) code point.
pub const CODE_POINT_MAX: u32 = 0x10FFFF;

/// An inclusive range of code points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CharRange {
    pub first: u32,
    pub last: u32,
}

impl CharRange {
    pub const fn new(first: u32, last: u32) -> CharRange {
        debug_assert!(first <= last);
        CharRange { first, last }
    }

    pub const fn single(c: char) -> CharRange {
        CharRange::new(c as u32, c as u32)
    }

    #[inline(always)]
    pub fn compare(self, cp: u32) -> Ordering {
        if self.first > cp {
            Ordering::Greater
        } else if self.last < cp {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// Overlapping *or abutting* ranges compare equal.
    fn mergecmp(self, rhs: CharRange) -> Ordering {
        if self.last.saturating_add(1) < rhs.first {
            Ordering::Less
        } else if rhs.last.saturating_add(1) < self.first {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    #[inline]
    pub fn contains(self, cp: u32) -> bool {
        self.first <= cp && cp <= self.last
    }

    pub fn count(self) -> usize {
        (self.last - self.first + 1) as usize
    }
}

#[inline]
fn ranges_contain(ranges: &[CharRange], cp: u32) -> bool {
    ranges.binary_search_by(|r| r.compare(cp)).is_ok()
}

/// Sort and merge a list of ranges so no two touch or overlap.
fn canonicalize_ranges(ranges: &mut Vec<CharRange>) {
    if ranges.len() < 2 {
        return;
    }
    ranges.sort_unstable_by_key(|r| r.first);
    let mut merged: Vec<CharRange> = Vec::with_capacity(ranges.len());
    for &r in ranges.iter() {
        match merged.last_mut() {
            Some(last) if last.mergecmp(r) == Ordering::Equal => {
                last.last = cmp::max(last.last, r.last);
            }
            _ => merged.push(r),
        }
    }
    *ranges = merged;
}

/// \return the complement of canonical ranges.
fn invert_ranges(ranges: &[CharRange]) -> Vec<CharRange> {
    let mut result = Vec::with_capacity(ranges.len() + 1);
    let mut start = 0;
    for r in ranges {
        if r.first > start {
            result.push(CharRange::new(start, r.first - 1));
        }
        start = r.last + 1;
    }
    if start <= CODE_POINT_MAX {
        result.push(CharRange::new(start, CODE_POINT_MAX));
    }
    result
}

/// A general-category membership test.
/// A negated test may carry exceptions: code points that also fail the test.
/// This is how a negated shorthand such as `\S` is stored inside a bracket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryTest {
    pub set: CategorySet,
    pub negate: bool,
    pub except: Box<[CharRange]>,
}

impl CategoryTest {
    #[inline]
    fn matches(&self, c: char) -> bool {
        if self.negate {
            !self.set.matches(c) && !ranges_contain(&self.except, c as u32)
        } else {
            self.set.matches(c)
        }
    }
}

/// A mutable character class, built by the parser.
#[derive(Debug, Clone, Default)]
pub struct CharClass {
    ranges: Vec<CharRange>,
    categories: Vec<CategoryTest>,
    negated: bool,
    subtraction: Option<Box<CharClass>>,
    /// Nested classes whose members are unioned into the base set.
    unions: Vec<CharClass>,
}

impl CharClass {
    pub fn new() -> CharClass {
        CharClass::default()
    }

    pub fn add_char(&mut self, c: char) {
        self.add_code_points(c as u32, c as u32)
    }

    pub fn add_range(&mut self, first: char, last: char) {
        self.add_code_points(first as u32, last as u32)
    }

    pub fn add_code_points(&mut self, first: u32, last: u32) {
        self.ranges.push(CharRange::new(first, last));
    }

    pub fn add_categories(&mut self, set: CategorySet, negate: bool) {
        self.categories.push(CategoryTest {
            set,
            negate,
            except: Box::new([]),
        });
    }

    /// Union another (non-negated, unsubtracted) class into this one.
    pub fn add_class(&mut self, other: &CharClass) {
        debug_assert!(!other.negated && other.subtraction.is_none());
        self.ranges.extend_from_slice(&other.ranges);
        self.categories.extend(other.categories.iter().cloned());
        self.unions.extend(other.unions.iter().cloned());
    }

    /// Union the complement of a shorthand class (`\W`, `\S`, `\D`, `\P{..}`)
    /// into this one.
    pub fn add_negated_class(&mut self, other: &CharClass) {
        debug_assert!(!other.negated && other.subtraction.is_none() && other.unions.is_empty());
        let mut ranges = other.ranges.clone();
        canonicalize_ranges(&mut ranges);
        match other.categories.as_slice() {
            [] => self.ranges.extend(invert_ranges(&ranges)),
            [test] if !test.negate => self.categories.push(CategoryTest {
                set: test.set,
                negate: true,
                except: ranges.into_boxed_slice(),
            }),
            tests => self.unions.push(CharClass {
                ranges,
                categories: tests.to_vec(),
                negated: true,
                subtraction: None,
                unions: Vec::new(),
            }),
        }
    }

    /// Invert the class.
    pub fn negate(&mut self) {
        self.negated = !self.negated;
    }

    /// Remove every member of `other` from this class.
    pub fn subtract(&mut self, other: CharClass) {
        match &mut self.subtraction {
            // (A - B) - C == A - (B | C)
            Some(existing) => existing.union_with(other),
            None => self.subtraction = Some(Box::new(other)),
        }
    }

    fn union_with(&mut self, other: CharClass) {
        if self.negated || self.subtraction.is_some() {
            let me = std::mem::take(self);
            self.unions = vec![me, other];
        } else if !other.negated && other.subtraction.is_none() {
            self.add_class(&other);
        } else {
            self.unions.push(other);
        }
    }

    /// Put the range list in canonical form.
    pub fn canonicalize(&mut self) {
        canonicalize_ranges(&mut self.ranges);
        self.unions.iter_mut().for_each(CharClass::canonicalize);
        if let Some(sub) = &mut self.subtraction {
            sub.canonicalize();
        }
    }

    /// Add the lower-case images of every range, for case-insensitive
    /// matching against lowered input.
    pub fn add_lowercase(&mut self, culture_invariant: bool) {
        let mut lowered = Vec::new();
        for r in &self.ranges {
            folds::lowercase_ranges(r.first, r.last, culture_invariant, &mut lowered);
        }
        self.ranges.extend(lowered);
        for u in &mut self.unions {
            u.add_lowercase(culture_invariant);
        }
        if let Some(sub) = &mut self.subtraction {
            sub.add_lowercase(culture_invariant);
        }
        self.canonicalize();
    }

    pub fn contains(&self, c: char) -> bool {
        let cp = c as u32;
        let base = self.ranges.iter().any(|r| r.contains(cp))
            || self.categories.iter().any(|t| t.matches(c))
            || self.unions.iter().any(|u| u.contains(c));
        if base == self.negated {
            return false;
        }
        match &self.subtraction {
            Some(sub) => !sub.contains(c),
            None => true,
        }
    }

    /// Produce the immutable, canonical descriptor.
    pub fn to_descriptor(&self) -> ClassDescriptor {
        let mut ranges = self.ranges.clone();
        canonicalize_ranges(&mut ranges);
        ClassDescriptor {
            ranges: ranges.into_boxed_slice(),
            categories: self.categories.clone().into_boxed_slice(),
            negated: self.negated,
            subtraction: self
                .subtraction
                .as_ref()
                .map(|sub| Box::new(sub.to_descriptor())),
            unions: self.unions.iter().map(CharClass::to_descriptor).collect(),
            ascii: OnceLock::new(),
        }
    }

    pub fn from_descriptor(desc: &ClassDescriptor) -> CharClass {
        CharClass {
            ranges: desc.ranges.to_vec(),
            categories: desc.categories.to_vec(),
            negated: desc.negated,
            subtraction: desc
                .subtraction
                .as_ref()
                .map(|sub| Box::new(CharClass::from_descriptor(sub))),
            unions: desc.unions.iter().map(CharClass::from_descriptor).collect(),
        }
    }
}

/// Immutable class stored in a compiled program.
/// The ASCII membership bitmap is built on first use.
#[derive(Clone)]
pub struct ClassDescriptor {
    ranges: Box<[CharRange]>,
    categories: Box<[CategoryTest]>,
    negated: bool,
    subtraction: Option<Box<ClassDescriptor>>,
    unions: Box<[ClassDescriptor]>,
    ascii: OnceLock<AsciiBitmap>,
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ranges == other.ranges
            && self.categories == other.categories
            && self.negated == other.negated
            && self.subtraction == other.subtraction
            && self.unions == other.unions
    }
}

impl Eq for ClassDescriptor {}

impl ClassDescriptor {
    /// A descriptor that matches every code point.
    pub fn any() -> ClassDescriptor {
        let mut cc = CharClass::new();
        cc.negate();
        cc.to_descriptor()
    }

    fn contains_slow(&self, c: char) -> bool {
        let cp = c as u32;
        let base = ranges_contain(&self.ranges, cp)
            || self.categories.iter().any(|t| t.matches(c))
            || self.unions.iter().any(|u| u.contains(c));
        if base == self.negated {
            return false;
        }
        match &self.subtraction {
            Some(sub) => !sub.contains(c),
            None => true,
        }
    }

    fn ascii_bitmap(&self) -> &AsciiBitmap {
        self.ascii.get_or_init(|| {
            let mut bm = AsciiBitmap::default();
            for b in 0..128u8 {
                if self.contains_slow(b as char) {
                    bm.set(b);
                }
            }
            bm
        })
    }

    /// \return whether the class contains `c`.
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        if c.is_ascii() {
            self.ascii_bitmap().contains(c as u8)
        } else {
            self.contains_slow(c)
        }
    }

    /// \return whether this class is plain: ranges only, no negation,
    /// categories or subtraction.
    pub fn is_plain(&self) -> bool {
        !self.negated
            && self.categories.is_empty()
            && self.subtraction.is_none()
            && self.unions.is_empty()
    }

    /// The canonical range list (meaningful on its own only if plain).
    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    /// \return the single member if this class contains exactly one code point.
    pub fn singleton(&self) -> Option<char> {
        match &*self.ranges {
            [r] if self.is_plain() && r.first == r.last => char::from_u32(r.first),
            _ => None,
        }
    }

    /// \return the single excluded code point if this is `[^c]`.
    pub fn negated_singleton(&self) -> Option<char> {
        match &*self.ranges {
            [r] if self.negated
                && self.categories.is_empty()
                && self.subtraction.is_none()
                && self.unions.is_empty()
                && r.first == r.last =>
            {
                char::from_u32(r.first)
            }
            _ => None,
        }
    }

    /// \return whether the class matches nothing.
    pub fn is_empty(&self) -> bool {
        self.is_plain() && self.ranges.is_empty()
    }

    /// \return the member count when plain and small.
    pub fn small_members(&self, limit: usize) -> Option<Vec<char>> {
        if !self.is_plain() {
            return None;
        }
        let count: usize = self.ranges.iter().map(|r| r.count()).sum();
        if count > limit {
            return None;
        }
        Some(
            self.ranges
                .iter()
                .flat_map(|r| r.first..=r.last)
                .filter_map(char::from_u32)
                .collect(),
        )
    }

    /// \return whether some code point may belong to both classes.
    /// Conservative: answers true whenever it cannot prove disjointness.
    pub fn may_overlap(&self, other: &ClassDescriptor) -> bool {
        let as_ranges = |d: &ClassDescriptor| -> Option<Vec<CharRange>> {
            if d.categories.is_empty() && d.subtraction.is_none() && d.unions.is_empty() {
                Some(if d.negated {
                    invert_ranges(&d.ranges)
                } else {
                    d.ranges.to_vec()
                })
            } else {
                None
            }
        };
        match (as_ranges(self), as_ranges(other)) {
            (Some(lhs), Some(rhs)) => lhs
                .iter()
                .any(|l| rhs.binary_search_by(|r| overlap_cmp(*r, *l)).is_ok()),
            _ => true,
        }
    }

    /// Compute the set of first UTF-8 bytes of every member, if the class is
    /// plain. Used to scan for a leading class byte-wise.
    pub fn first_byte_bitmap(&self) -> Option<ByteBitmap> {
        if !self.is_plain() {
            return None;
        }
        let mut bitmap = ByteBitmap::default();
        for r in self.ranges.iter() {
            add_utf8_first_bytes_to_bitmap(*r, &mut bitmap);
        }
        Some(bitmap)
    }
}

fn overlap_cmp(r: CharRange, probe: CharRange) -> Ordering {
    if r.last < probe.first {
        Ordering::Less
    } else if r.first > probe.last {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

fn fmt_cp(f: &mut fmt::Formatter<'_>, cp: u32) -> fmt::Result {
    match char::from_u32(cp) {
        Some(c) if c.is_ascii_graphic() => write!(f, "{}", c),
        _ => write!(f, "\\u{{{:X}}}", cp),
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if self.negated {
            write!(f, "^")?;
        }
        for r in self.ranges.iter() {
            fmt_cp(f, r.first)?;
            if r.last != r.first {
                write!(f, "-")?;
                fmt_cp(f, r.last)?;
            }
        }
        for t in self.categories.iter() {
            write!(f, "{}{:?}", if t.negate { "\\P" } else { "\\p" }, t.set)?;
        }
        for u in self.unions.iter() {
            write!(f, "{}", u)?;
        }
        if let Some(sub) = &self.subtraction {
            write!(f, "-{}", sub)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{self, Category};

    fn class(ranges: &[(char, char)]) -> CharClass {
        let mut cc = CharClass::new();
        for &(a, b) in ranges {
            cc.add_range(a, b);
        }
        cc
    }

    #[test]
    fn canonicalize_merges() {
        let mut ranges = vec![
            CharRange::new(10, 20),
            CharRange::new(0, 5),
            CharRange::new(6, 8),
            CharRange::new(15, 30),
        ];
        canonicalize_ranges(&mut ranges);
        assert_eq!(ranges, vec![CharRange::new(0, 8), CharRange::new(10, 30)]);
    }

    #[test]
    fn invert() {
        let inv = invert_ranges(&[CharRange::new(0, 9), CharRange::new(20, 30)]);
        assert_eq!(
            inv,
            vec![CharRange::new(10, 19), CharRange::new(31, CODE_POINT_MAX)]
        );
        assert_eq!(invert_ranges(&[]), vec![CharRange::new(0, CODE_POINT_MAX)]);
    }

    #[test]
    fn membership() {
        let cc = class(&[('a', 'z')]);
        let d = cc.to_descriptor();
        assert!(d.contains('q') && !d.contains('Q') && !d.contains('é'));

        let mut neg = class(&[('a', 'z')]);
        neg.negate();
        let d = neg.to_descriptor();
        assert!(!d.contains('q') && d.contains('Q') && d.contains('é'));
    }

    #[test]
    fn subtraction() {
        let mut cc = class(&[('a', 'z')]);
        cc.subtract(class(&[('a', 'a'), ('e', 'e'), ('i', 'i'), ('o', 'o'), ('u', 'u')]));
        let d = cc.to_descriptor();
        assert!(d.contains('b') && !d.contains('e') && !d.contains('B'));
        assert_eq!(CharClass::from_descriptor(&d).to_descriptor(), d);
    }

    #[test]
    fn categories_and_negated_shorthands() {
        let mut cc = CharClass::new();
        cc.add_categories(CategorySet::of(&[Category::Lu]), false);
        let d = cc.to_descriptor();
        assert!(d.contains('Ä') && !d.contains('ä'));

        let mut not_space = CharClass::new();
        not_space.add_negated_class(&categories::space_class(false));
        let d = not_space.to_descriptor();
        assert!(d.contains('x') && !d.contains(' ') && !d.contains('\n') && !d.contains('\u{2003}'));

        let mut not_digit = CharClass::new();
        not_digit.add_negated_class(&categories::digit_class(true));
        let d = not_digit.to_descriptor();
        assert!(d.contains('x') && !d.contains('7'));
    }

    #[test]
    fn lowercase_closure() {
        let mut cc = class(&[('A', 'C')]);
        cc.add_lowercase(false);
        let d = cc.to_descriptor();
        assert!(d.contains('a') && d.contains('C') && !d.contains('d'));
    }

    #[test]
    fn singletons() {
        assert_eq!(class(&[('x', 'x')]).to_descriptor().singleton(), Some('x'));
        assert_eq!(class(&[('x', 'y')]).to_descriptor().singleton(), None);
        let mut neg = class(&[('\n', '\n')]);
        neg.negate();
        assert_eq!(neg.to_descriptor().negated_singleton(), Some('\n'));
        assert!(CharClass::new().to_descriptor().is_empty());
    }

    #[test]
    fn overlap_oracle() {
        let digits = class(&[('0', '9')]).to_descriptor();
        let letters = class(&[('a', 'z')]).to_descriptor();
        assert!(!digits.may_overlap(&letters));
        assert!(digits.may_overlap(&digits));
        let mut not_digits = class(&[('0', '9')]);
        not_digits.negate();
        assert!(!digits.may_overlap(&not_digits.to_descriptor()));
        assert!(letters.may_overlap(&not_digits.to_descriptor()));
        assert!(categories::word_class(false).to_descriptor().may_overlap(&digits));
    }
}
