//! Bytecode instructions for a compiled regex

use crate::bytesearch::{BoyerMoore, ByteBitmap, SmallByteSet};
use crate::charclass::ClassDescriptor;
use crate::ir::AnchorType;
use crate::types::{CaptureGroupID, Flags, GroupTable, JumpTarget, LoopID};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LoopFields {
    pub loop_id: LoopID,
    pub min_iters: usize,
    pub max_iters: usize,
    pub greedy: bool,
    pub exit: JumpTarget,
}

#[derive(Debug, Clone)]
/// The list of bytecode instructions.
pub enum Insn {
    /// The match was successful. Also terminates the body of an atomic group
    /// or lookaround.
    Goal,

    /// Match a single char. If icase, the char is lowered and the input is
    /// lowered before comparing.
    Char { c: char, icase: bool },

    /// Match any char but the given one.
    NotChar { c: char, icase: bool },

    /// Match any char.
    MatchAny,

    /// Match the next char against the class at the given index.
    Class { idx: usize, icase: bool },

    /// Match the literal string at the given index.
    Literal { idx: usize, icase: bool },

    /// The next instruction is a "1Char" instruction which always matches one
    /// character. Attempt to match it [min, max] times. Atomic loops leave no
    /// choice point.
    Loop1CharBody {
        min_iters: usize,
        max_iters: usize,
        greedy: bool,
        atomic: bool,
    },

    /// Match the most recent capture of the given slot.
    BackRef { slot: CaptureGroupID, icase: bool },

    /// Zero-width position test.
    Anchor(AnchorType),

    /// \b or \B.
    WordBoundary { invert: bool, ecma: bool },

    /// Enter a capture group, remembering the position.
    BeginCapture,

    /// Exit a capture group. Records a capture of `slot` and/or balances
    /// away the last capture of `uncapture`.
    EndCapture {
        slot: Option<CaptureGroupID>,
        uncapture: Option<CaptureGroupID>,
    },

    /// Run the following body to its Goal and discard its choice points,
    /// then continue at `continuation`.
    Atomic { continuation: JumpTarget },

    /// Perform a lookahead assertion.
    Lookahead {
        negate: bool,
        continuation: JumpTarget,
    },

    /// Perform a lookbehind assertion.
    Lookbehind {
        negate: bool,
        continuation: JumpTarget,
    },

    /// Enter a loop from "outside".
    EnterLoop(LoopFields),

    /// Re-enter a loop.
    LoopAgain { begin: JumpTarget },

    /// The next instruction is the primary branch.
    /// If it fails to match, jump to secondary.
    Alt { secondary: JumpTarget },

    /// Set the IP to a new value.
    Jump { target: JumpTarget },

    /// Continue with the next instruction if the slot has a capture, else
    /// jump to `no`.
    BackrefCondition { slot: CaptureGroupID, no: JumpTarget },

    /// Test the lookahead body that follows; continue at `yes` if it
    /// matched, else at `no`.
    ExprCondition { yes: JumpTarget, no: JumpTarget },

    /// An instruction that always fails.
    JustFail,
}

impl Insn {
    /// \return whether executing this instruction may push a choice point.
    pub fn may_backtrack(&self) -> bool {
        match self {
            Insn::Loop1CharBody { atomic, .. } => !*atomic,
            Insn::Alt { .. }
            | Insn::EnterLoop(..)
            | Insn::LoopAgain { .. }
            | Insn::BeginCapture
            | Insn::EndCapture { .. } => true,
            _ => false,
        }
    }
}

/// The leading-position predicate.
/// This is a fast way of locating the first potential match.
#[derive(Debug, Clone)]
pub enum StartPredicate {
    /// May match an arbitrary sequence.
    Arbitrary,

    /// The regex can only match at positions satisfying this anchor.
    Anchored(AnchorType),

    /// Look for a literal string.
    Literal(Box<BoyerMoore>),

    /// Look for the first instance of any of up to three bytes.
    ByteSet(SmallByteSet),

    /// Look for a byte which matches the bitmap.
    ByteBracket(ByteBitmap),

    /// Test each char against a class.
    LeadingClass { class: ClassDescriptor, icase: bool },
}

impl fmt::Display for StartPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPredicate::Arbitrary => write!(f, "arbitrary"),
            StartPredicate::Anchored(anchor) => write!(f, "anchored {:?}", anchor),
            StartPredicate::Literal(bm) => write!(f, "{:?}", bm),
            StartPredicate::ByteSet(bytes) => write!(f, "{:?}", bytes),
            StartPredicate::ByteBracket(bitmap) => write!(f, "{:?}", bitmap),
            StartPredicate::LeadingClass { class, icase } => {
                write!(f, "class {}{}", class, if *icase { " (icase)" } else { "" })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRegex {
    // Sequence of instructions.
    pub insns: Vec<Insn>,

    // Interned class descriptors, indexed by `Class` instructions.
    pub classes: Vec<ClassDescriptor>,

    // Interned literals, indexed by `Literal` instructions.
    pub literals: Vec<Box<str>>,

    // Predicate to rapidly find the first potential match.
    pub start_pred: StartPredicate,

    // No match is shorter than this many bytes.
    pub min_length: usize,

    // Number of loops, used to populate loop data.
    pub loops: usize,

    // Upper bound on choice points pushed per pass over the program, used
    // to presize the track stack.
    pub track_count: usize,

    // Group numbers and names for every capture slot.
    pub groups: Arc<GroupTable>,

    // Flags controlling matching.
    pub flags: Flags,
}

impl fmt::Display for CompiledRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start predicate: {}", self.start_pred)?;
        writeln!(f, "min length: {}", self.min_length)?;
        for (idx, insn) in self.insns.iter().enumerate() {
            match insn {
                Insn::Class { idx: cidx, icase } => {
                    writeln!(f, "{:4} Class {} icase={}", idx, self.classes[*cidx], icase)?
                }
                Insn::Literal { idx: lidx, icase } => {
                    writeln!(f, "{:4} Literal {:?} icase={}", idx, self.literals[*lidx], icase)?
                }
                _ => writeln!(f, "{:4} {:?}", idx, insn)?,
            }
        }
        Ok(())
    }
}
