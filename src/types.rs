use std::ops;

/// A capture slot index is u16.
/// Slot 0 always corresponds to the whole match; slots are assigned in
/// ascending order of group number.
pub type CaptureGroupID = u16;

/// The name of a named capture group.
pub type CaptureGroupName = String;

/// The maximum number of capture groups supported.
pub const MAX_CAPTURE_GROUPS: usize = 65535;

/// The maximum number of loops supported.
pub const MAX_LOOPS: usize = 65535;
pub type LoopID = u16;

/// The maximum nesting of groups accepted by the parser.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Loop bound used for `*`, `+` and `{n,}`.
pub const INFINITE: usize = usize::MAX;

/// An instruction pointer.
pub type IP = usize;

/// A jump target. While emitting, this holds a label; after relocation it
/// holds an instruction index.
pub type JumpTarget = u32;

/// Representation of a loop.
#[derive(Debug, Copy, Clone)]
pub struct LoopData {
    pub iters: usize,
    pub entry: usize,
}

impl LoopData {
    pub fn new(entry: usize) -> LoopData {
        LoopData { iters: 0, entry }
    }
}

/// A single recorded capture: a range of byte offsets into the subject.
pub type Capture = ops::Range<usize>;

/// Maps between user-visible group numbers, group names and capture slots.
/// Shared between a compiled regex and every match it produces.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    /// Group number for each slot, ascending. Entry 0 is always 0.
    pub numbers: Box<[usize]>,

    /// Optional name for each slot.
    pub names: Box<[Option<Box<str>>]>,
}

impl GroupTable {
    /// The number of capture slots, including slot 0.
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// \return the slot for a group number.
    pub fn slot_for_number(&self, number: usize) -> Option<usize> {
        self.numbers.binary_search(&number).ok()
    }

    /// \return the slot for a group name.
    pub fn slot_for_name(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// \return the name that identifies a slot: its explicit name, or its
    /// number rendered in decimal.
    pub fn display_name(&self, slot: usize) -> String {
        match &self.names[slot] {
            Some(name) => name.to_string(),
            None => self.numbers[slot].to_string(),
        }
    }
}

/// A set of flags for configuring a regex.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// If set, make the regex case-insensitive.
    /// Equivalent to the 'i' flag.
    pub icase: bool,

    /// If set, `^` and `$` match at line separators, not just the input
    /// boundaries. Equivalent to the 'm' flag.
    pub multiline: bool,

    /// If set, only named or explicitly numbered groups capture.
    /// Equivalent to the 'n' flag.
    pub explicit_capture: bool,

    /// If set, `.` matches at line separators as well as any other
    /// character. Equivalent to the 's' flag.
    pub singleline: bool,

    /// If set, unescaped whitespace in the pattern is ignored and `#`
    /// starts a comment. Equivalent to the 'x' flag.
    pub ignore_whitespace: bool,

    /// If set, the regex scans from right to left.
    /// Equivalent to the 'r' flag.
    pub right_to_left: bool,

    /// If set, use ECMAScript-compatible behavior.
    /// Equivalent to the 'e' flag.
    pub ecmascript: bool,

    /// If set, case mappings ignore culture-specific rules.
    /// Equivalent to the 'c' flag.
    pub culture_invariant: bool,

    /// If set, disable regex IR passes.
    pub no_opt: bool,
}

impl Flags {
    /// Construct a Flags from a Unicode codepoints iterator, using the
    /// letters shown above. Unknown letters are ignored.
    #[inline]
    pub fn new<T: Iterator<Item = char>>(chars: T) -> Self {
        let mut result = Self::default();
        for c in chars {
            match c {
                'i' => result.icase = true,
                'm' => result.multiline = true,
                'n' => result.explicit_capture = true,
                's' => result.singleline = true,
                'x' => result.ignore_whitespace = true,
                'r' => result.right_to_left = true,
                'e' => result.ecmascript = true,
                'c' => result.culture_invariant = true,
                _ => {}
            }
        }
        result
    }

    /// ECMAScript behavior may only be combined with case-insensitivity and
    /// multiline mode.
    pub fn is_valid(&self) -> bool {
        !self.ecmascript
            || !(self.explicit_capture
                || self.singleline
                || self.ignore_whitespace
                || self.right_to_left
                || self.culture_invariant)
    }
}

impl From<&str> for Flags {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s.chars())
    }
}

impl core::fmt::Display for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let letters = [
            (self.icase, 'i'),
            (self.multiline, 'm'),
            (self.explicit_capture, 'n'),
            (self.singleline, 's'),
            (self.ignore_whitespace, 'x'),
            (self.right_to_left, 'r'),
            (self.ecmascript, 'e'),
            (self.culture_invariant, 'c'),
        ];
        for (set, letter) in letters {
            if set {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_from_str() {
        let flags = Flags::from("imx");
        assert!(flags.icase && flags.multiline && flags.ignore_whitespace);
        assert!(!flags.singleline && !flags.right_to_left);
        assert_eq!(flags.to_string(), "imx");
        assert_eq!(Flags::from("rcnse").to_string(), "nsrec");
    }

    #[test]
    fn ecmascript_combinations() {
        assert!(Flags::from("eim").is_valid());
        assert!(!Flags::from("es").is_valid());
        assert!(!Flags::from("er").is_valid());
        assert!(Flags::from("sr").is_valid());
    }

    #[test]
    fn group_table_lookup() {
        let table = GroupTable {
            numbers: vec![0, 1, 3, 4].into_boxed_slice(),
            names: vec![None, None, None, Some("year".into())].into_boxed_slice(),
        };
        assert_eq!(table.slot_for_number(3), Some(2));
        assert_eq!(table.slot_for_number(2), None);
        assert_eq!(table.slot_for_name("year"), Some(3));
        assert_eq!(table.display_name(2), "3");
        assert_eq!(table.display_name(3), "year");
    }
}
