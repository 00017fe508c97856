//! Support for quickly finding potential match locations.
use crate::bytesearch::{BoyerMoore, ByteBitmap, SmallByteSet};
use crate::charclass::{CharClass, ClassDescriptor};
use crate::insn::StartPredicate;
use crate::ir;
use crate::ir::{AnchorType, Node};
use crate::util::utf8_first_byte;

/// \return the bytes that may begin a char which lowers to the ASCII char
/// `c`, or None if `c` is not ASCII.
/// U+212A KELVIN SIGN lowers to 'k', and U+0130 lowers to 'i' unless the
/// casing is culture-invariant.
fn icase_first_bytes(c: char) -> Option<Vec<u8>> {
    if !c.is_ascii() {
        return None;
    }
    let lower = c as u8;
    let mut bytes = vec![lower];
    let upper = lower.to_ascii_uppercase();
    if upper != lower {
        bytes.push(upper);
    }
    match c {
        'k' => bytes.push(utf8_first_byte(0x212A)),
        'i' => bytes.push(utf8_first_byte(0x130)),
        _ => {}
    }
    Some(bytes)
}

/// \return whether a case-insensitive literal may be scanned byte-wise,
/// i.e. every char that lowers into it is ASCII.
fn icase_literal_is_bytewise(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii() && c != 'k' && c != 'i')
}

/// Find the anchor that every match must begin at, walking the leading
/// edge of the tree in matching order.
fn leading_anchor(n: &Node, backwards: bool) -> Option<AnchorType> {
    match n {
        Node::Anchor(anchor) => match anchor {
            AnchorType::Beginning | AnchorType::Start | AnchorType::End | AnchorType::EndZ => {
                Some(*anchor)
            }
            AnchorType::StartOfLine if !backwards => Some(*anchor),
            _ => None,
        },
        Node::Cat(nodes) => nodes.first().and_then(|nn| leading_anchor(nn, backwards)),
        Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => {
            leading_anchor(contents, backwards)
        }
        _ => None,
    }
}

/// The "IR" for a start predicate.
enum AbstractStartPredicate {
    /// No predicate.
    Arbitrary,

    /// A non-empty literal, lowered if icase.
    Literal { text: String, icase: bool },

    /// Set of first bytes.
    Set(ByteBitmap),

    /// A single class which has no useful byte set.
    Class { class: ClassDescriptor, icase: bool },
}

impl AbstractStartPredicate {
    /// \return the first bytes this predicate may begin with, or None if
    /// that cannot be bounded.
    fn first_bytes(&self, backwards: bool) -> Option<ByteBitmap> {
        match self {
            Self::Arbitrary | Self::Class { .. } => None,
            Self::Set(bitmap) => Some(*bitmap),
            Self::Literal { text, icase } => {
                let c = if backwards {
                    text.chars().next_back()?
                } else {
                    text.chars().next()?
                };
                if *icase {
                    icase_first_bytes(c).map(|bytes| ByteBitmap::new(&bytes))
                } else {
                    Some(ByteBitmap::new(&[utf8_first_byte(c as u32)]))
                }
            }
        }
    }

    /// \return the disjunction of two predicates.
    /// That is, a predicate that matches x OR y.
    fn disjunction(x: Self, y: Self, backwards: bool) -> Self {
        match (x, y) {
            (Self::Arbitrary, _) | (_, Self::Arbitrary) => Self::Arbitrary,
            (
                Self::Literal {
                    text: t1,
                    icase: i1,
                },
                Self::Literal {
                    text: t2,
                    icase: i2,
                },
            ) if i1 == i2 => {
                // Keep the shared leading text, if any.
                let shared: String = if backwards {
                    let mut rev: Vec<char> = t1
                        .chars()
                        .rev()
                        .zip(t2.chars().rev())
                        .take_while(|(a, b)| a == b)
                        .map(|(a, _)| a)
                        .collect();
                    rev.reverse();
                    rev.into_iter().collect()
                } else {
                    t1.chars()
                        .zip(t2.chars())
                        .take_while(|(a, b)| a == b)
                        .map(|(a, _)| a)
                        .collect()
                };
                if !shared.is_empty() {
                    Self::Literal {
                        text: shared,
                        icase: i1,
                    }
                } else {
                    Self::disjoin_bytes(
                        &Self::Literal {
                            text: t1,
                            icase: i1,
                        },
                        &Self::Literal {
                            text: t2,
                            icase: i2,
                        },
                        backwards,
                    )
                }
            }
            (x, y) => Self::disjoin_bytes(&x, &y, backwards),
        }
    }

    fn disjoin_bytes(x: &Self, y: &Self, backwards: bool) -> Self {
        match (x.first_bytes(backwards), y.first_bytes(backwards)) {
            (Some(mut b1), Some(b2)) => {
                b1.bitor(&b2);
                Self::Set(b1)
            }
            _ => Self::Arbitrary,
        }
    }

    /// Resolve ourselves to a concrete start predicate.
    fn resolve(self, backwards: bool) -> StartPredicate {
        match self {
            Self::Arbitrary => StartPredicate::Arbitrary,
            Self::Literal { text, icase } => {
                let bytewise = !icase || icase_literal_is_bytewise(&text);
                if bytewise && text.len() > 1 {
                    StartPredicate::Literal(Box::new(BoyerMoore::new(
                        text.as_bytes(),
                        icase,
                        backwards,
                    )))
                } else if backwards {
                    // Single chars scanning backwards test the char to the left.
                    let mut chars = text.chars();
                    match (chars.next_back(), icase) {
                        (Some(c), false) if c.is_ascii() => {
                            StartPredicate::ByteSet(SmallByteSet::One(c as u8))
                        }
                        (Some(c), _) => {
                            let mut cc = CharClass::new();
                            cc.add_char(c);
                            StartPredicate::LeadingClass {
                                class: cc.to_descriptor(),
                                icase,
                            }
                        }
                        (None, _) => StartPredicate::Arbitrary,
                    }
                } else {
                    match (Self::Literal { text, icase }).first_bytes(backwards) {
                        Some(bitmap) => Self::Set(bitmap).resolve(backwards),
                        None => StartPredicate::Arbitrary,
                    }
                }
            }
            Self::Set(bitmap) => {
                // Bytes to the left of a position are only meaningful for ASCII.
                if backwards && bitmap.to_vec().iter().any(|b| !b.is_ascii()) {
                    return StartPredicate::Arbitrary;
                }
                match bitmap.count_bits() {
                    0 => StartPredicate::Arbitrary,
                    1..=3 => match SmallByteSet::new(&bitmap.to_vec()) {
                        Some(set) => StartPredicate::ByteSet(set),
                        None => StartPredicate::ByteBracket(bitmap),
                    },
                    _ => StartPredicate::ByteBracket(bitmap),
                }
            }
            Self::Class { class, icase } => StartPredicate::LeadingClass { class, icase },
        }
    }
}

/// Predicate for a class node.
fn class_predicate(class: &ClassDescriptor, icase: bool, backwards: bool) -> AbstractStartPredicate {
    if !icase && !backwards {
        if let Some(bitmap) = class.first_byte_bitmap() {
            return AbstractStartPredicate::Set(bitmap);
        }
    }
    if !icase && backwards && class.is_plain() && class.ranges().iter().all(|r| r.last < 0x80) {
        let bytes: Vec<u8> = class
            .ranges()
            .iter()
            .flat_map(|r| r.first..=r.last)
            .map(|cp| cp as u8)
            .collect();
        return AbstractStartPredicate::Set(ByteBitmap::new(&bytes));
    }
    if *class == ClassDescriptor::any() {
        return AbstractStartPredicate::Arbitrary;
    }
    AbstractStartPredicate::Class {
        class: class.clone(),
        icase,
    }
}

/// Compute any start-predicate for a node.
/// If this returns None, then the node is zero-width (e.g. lookahead
/// assertion) and does not contribute to the predicate.
/// If this returns Arbitrary, then there is no predicate.
fn compute_start_predicate(n: &Node, backwards: bool) -> Option<AbstractStartPredicate> {
    let arbitrary = Some(AbstractStartPredicate::Arbitrary);
    match n {
        Node::Literal { chars, icase } if !chars.is_empty() => {
            Some(AbstractStartPredicate::Literal {
                text: chars.clone(),
                icase: *icase,
            })
        }
        Node::Char { c, icase } => Some(AbstractStartPredicate::Literal {
            text: c.to_string(),
            icase: *icase,
        }),
        Node::Class { class, icase } => Some(class_predicate(class, *icase, backwards)),

        Node::Empty
        | Node::Anchor(..)
        | Node::WordBoundary { .. }
        | Node::LookaroundAssertion { .. } => None,

        Node::Literal { .. }
        | Node::Goal
        | Node::Fail
        | Node::BackRef { .. }
        | Node::NotChar { .. }
        | Node::MatchAny
        | Node::BackrefConditional { .. }
        | Node::ExprConditional { .. } => arbitrary,

        // Cats return the first non-None value, if any.
        Node::Cat(nodes) => nodes
            .iter()
            .find_map(|nn| compute_start_predicate(nn, backwards)),

        Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => {
            compute_start_predicate(contents, backwards)
        }

        Node::Loop { loopee, quant } | Node::Loop1CharBody { loopee, quant, .. } => {
            if quant.min > 0 {
                compute_start_predicate(loopee, backwards)
            } else {
                arbitrary
            }
        }

        // Disjunction of the predicates of every branch.
        Node::Alt(branches) => {
            let mut result: Option<AbstractStartPredicate> = None;
            for branch in branches {
                // A zero-width branch could match anywhere.
                let pred = match compute_start_predicate(branch, backwards) {
                    Some(pred) => pred,
                    None => return arbitrary,
                };
                result = Some(match result {
                    None => pred,
                    Some(prev) => AbstractStartPredicate::disjunction(prev, pred, backwards),
                });
            }
            result.or(arbitrary)
        }
    }
}

/// \return the start predicate for a Regex.
pub fn predicate_for_re(re: &ir::Regex) -> StartPredicate {
    let backwards = re.flags.right_to_left;
    if let Some(anchor) = leading_anchor(&re.node, backwards) {
        return StartPredicate::Anchored(anchor);
    }
    compute_start_predicate(&re.node, backwards)
        .unwrap_or(AbstractStartPredicate::Arbitrary)
        .resolve(backwards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer;
    use crate::parse;
    use crate::types::Flags;

    fn predicate(pattern: &str, flags: &str) -> StartPredicate {
        let mut re = parse::try_parse(pattern, Flags::from(flags)).expect("should parse");
        optimizer::optimize(&mut re);
        predicate_for_re(&re)
    }

    #[test]
    fn anchors() {
        assert!(matches!(
            predicate("^abc", ""),
            StartPredicate::Anchored(AnchorType::Beginning)
        ));
        assert!(matches!(
            predicate("^abc", "m"),
            StartPredicate::Anchored(AnchorType::StartOfLine)
        ));
        assert!(matches!(
            predicate(r"\Gx", ""),
            StartPredicate::Anchored(AnchorType::Start)
        ));
        assert!(matches!(
            predicate("abc$", "r"),
            StartPredicate::Anchored(AnchorType::EndZ)
        ));
        // Line anchors are only used left to right.
        assert!(!matches!(predicate("abc$", "mr"), StartPredicate::Anchored(..)));
    }

    #[test]
    fn literals() {
        match predicate("hello", "") {
            StartPredicate::Literal(bm) => {
                assert_eq!(bm.len(), 5);
                assert!(!bm.right_to_left());
            }
            other => panic!("unexpected predicate {:?}", other),
        }
        match predicate("hello", "r") {
            StartPredicate::Literal(bm) => assert!(bm.right_to_left()),
            other => panic!("unexpected predicate {:?}", other),
        }
        // Kelvin sign lowers to k, so this cannot be scanned byte-wise.
        assert!(!matches!(predicate("kelvin", "i"), StartPredicate::Literal(..)));
        assert!(matches!(predicate("hello", "i"), StartPredicate::Literal(..)));
    }

    #[test]
    fn sets() {
        assert!(matches!(
            predicate("x|y", ""),
            StartPredicate::ByteSet(SmallByteSet::Two(..))
        ));
        assert!(matches!(predicate(r"[a-z]+\d", ""), StartPredicate::ByteBracket(..)));
        assert!(matches!(predicate(r"(?=a)", ""), StartPredicate::Arbitrary));
        assert!(matches!(predicate(r"a?b", ""), StartPredicate::Arbitrary));
        assert!(matches!(
            predicate(r"\p{Lu}", ""),
            StartPredicate::LeadingClass { .. }
        ));
    }

    #[test]
    fn zero_width_branches() {
        // An alternation with a branch that consumes nothing may start
        // anywhere, so whatever follows it cannot be scanned for.
        for (pattern, flags) in [
            ("(a|)b", ""),
            ("(?:x|)b", ""),
            (r"(?:ab|(?=z))c", ""),
            (r"(?:a|^)b", ""),
            (r"(?:a|\b)c", ""),
            ("b(?:x|)", "r"),
            (r"c(?:ba|(?<=z))", "r"),
        ] {
            let pred = predicate(pattern, flags);
            assert!(
                matches!(pred, StartPredicate::Arbitrary),
                "pattern {} flags {:?} gave {:?}",
                pattern,
                flags,
                pred
            );
        }
        // Branches that all consume still combine.
        assert!(matches!(
            predicate("(?:x|y)z", ""),
            StartPredicate::ByteSet(SmallByteSet::Two(..))
        ));
    }
}
