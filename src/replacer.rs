//! Replacement templates: `$` references compiled once and rendered per match.

use crate::api::Match;
use crate::types::GroupTable;
use memchr::memchr;

/// One piece of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),

    /// The last capture of a slot. Empty if the group did not participate.
    Group(usize),

    /// `` $` ``: the text before the match.
    LeftPortion,

    /// `$'`: the text after the match.
    RightPortion,

    /// `$+`: the highest numbered group.
    LastGroup,

    /// `$_`: the entire input.
    WholeInput,
}

/// A compiled replacement template.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReplacementProgram {
    segments: Vec<Segment>,
}

/// A `$` reference and the template text following it.
struct CaptureRef<'a> {
    rest: &'a str,
    segment: Segment,
}

fn is_valid_cap_letter(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse the decimal number at the start of `s`, with its length in bytes.
/// Numbers too large to be a group are treated as no group.
fn scan_decimal(s: &str) -> (Option<usize>, usize) {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    (s[..len].parse().ok(), len)
}

/// Try to parse the reference starting at the `$` which begins `template`.
fn find_cap_ref<'a>(template: &'a str, groups: &GroupTable, ecmascript: bool) -> Option<CaptureRef<'a>> {
    debug_assert!(template.starts_with('$'));
    let after = &template[1..];
    let first = after.chars().next()?;

    if first == '{' {
        let inner = &after[1..];
        let close = inner.find('}')?;
        let name = &inner[..close];
        let rest = &inner[close + 1..];
        let slot = if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            groups.slot_for_number(name.parse().ok()?)?
        } else if name.chars().next().map_or(false, is_valid_cap_letter) {
            if !name.chars().all(is_valid_cap_letter) {
                return None;
            }
            groups.slot_for_name(name)?
        } else {
            return None;
        };
        return Some(CaptureRef {
            rest,
            segment: Segment::Group(slot),
        });
    }

    if first.is_ascii_digit() {
        if ecmascript {
            // Take digits for as long as they still name a group.
            let mut number = (first as u8 - b'0') as usize;
            let mut slot = groups.slot_for_number(number)?;
            let mut len = 1;
            for b in after[1..].bytes() {
                if !b.is_ascii_digit() {
                    break;
                }
                let longer = number
                    .checked_mul(10)
                    .and_then(|n| n.checked_add((b - b'0') as usize));
                match longer.and_then(|n| groups.slot_for_number(n).map(|s| (n, s))) {
                    Some((n, s)) => {
                        number = n;
                        slot = s;
                        len += 1;
                    }
                    None => break,
                }
            }
            return Some(CaptureRef {
                rest: &after[len..],
                segment: Segment::Group(slot),
            });
        }
        let (number, len) = scan_decimal(after);
        let slot = groups.slot_for_number(number?)?;
        return Some(CaptureRef {
            rest: &after[len..],
            segment: Segment::Group(slot),
        });
    }

    let segment = match first {
        '&' => Segment::Group(0),
        '`' => Segment::LeftPortion,
        '\'' => Segment::RightPortion,
        '+' => Segment::LastGroup,
        '_' => Segment::WholeInput,
        _ => return None,
    };
    Some(CaptureRef {
        rest: &after[1..],
        segment,
    })
}

impl ReplacementProgram {
    /// Compile a template against a regex's groups. References to groups
    /// which do not exist are kept as literal text.
    pub(crate) fn compile(mut template: &str, groups: &GroupTable, ecmascript: bool) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        while !template.is_empty() {
            match memchr(b'$', template.as_bytes()) {
                None => break,
                Some(i) => {
                    literal.push_str(&template[..i]);
                    template = &template[i..];
                }
            }
            if template[1..].starts_with('$') {
                literal.push('$');
                template = &template[2..];
                continue;
            }
            match find_cap_ref(template, groups, ecmascript) {
                Some(cap_ref) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(cap_ref.segment);
                    template = cap_ref.rest;
                }
                None => {
                    literal.push('$');
                    template = &template[1..];
                }
            }
        }
        literal.push_str(template);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        ReplacementProgram { segments }
    }

    /// \return the replacement text if it does not depend on the match.
    pub(crate) fn as_literal(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Literal(s)] => Some(s),
            _ => None,
        }
    }

    /// Append the replacement for one match to `out`.
    pub(crate) fn render_into(&self, m: &Match, out: &mut String) {
        let text = m.text();
        for segment in &self.segments {
            let piece = match segment {
                Segment::Literal(s) => s.as_str(),
                Segment::Group(slot) => m.slot_str(*slot),
                Segment::LeftPortion => &text[..m.start()],
                Segment::RightPortion => &text[m.end()..],
                Segment::LastGroup => m.slot_str(m.slot_count() - 1),
                Segment::WholeInput => text,
            };
            out.push_str(piece);
        }
    }

    #[cfg(test)]
    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Regex;

    fn table(numbers: &[usize], names: &[Option<&str>]) -> GroupTable {
        GroupTable {
            numbers: numbers.to_vec().into_boxed_slice(),
            names: names.iter().map(|n| n.map(Into::into)).collect(),
        }
    }

    #[test]
    fn compiles_references() {
        let groups = table(&[0, 1, 2], &[None, None, Some("word")]);
        let program = ReplacementProgram::compile("<$1|${word}|$&|$$>", &groups, false);
        assert_eq!(
            program.segments(),
            &[
                Segment::Literal("<".into()),
                Segment::Group(1),
                Segment::Literal("|".into()),
                Segment::Group(2),
                Segment::Literal("|".into()),
                Segment::Group(0),
                Segment::Literal("|$>".into()),
            ]
        );
        let program = ReplacementProgram::compile("$`$'$+$_", &groups, false);
        assert_eq!(
            program.segments(),
            &[
                Segment::LeftPortion,
                Segment::RightPortion,
                Segment::LastGroup,
                Segment::WholeInput
            ]
        );
    }

    #[test]
    fn unknown_references_are_literal() {
        let groups = table(&[0, 1], &[None, None]);
        for template in ["$9", "${nope}", "$", "a$", "${1", "$x", "${}"] {
            let program = ReplacementProgram::compile(template, &groups, false);
            assert_eq!(program.as_literal(), Some(template), "template {}", template);
        }
    }

    #[test]
    fn digits_are_greedy() {
        let groups = table(&(0..=11).collect::<Vec<_>>(), &[None; 12]);
        let program = ReplacementProgram::compile("$111", &groups, false);
        assert_eq!(program.as_literal(), Some("$111"));
        let program = ReplacementProgram::compile("$111", &groups, true);
        assert_eq!(
            program.segments(),
            &[Segment::Group(11), Segment::Literal("1".into())]
        );
    }

    #[test]
    fn renders_against_a_match() {
        let re = Regex::new(r"(\w+)@(\w+)").expect("should compile");
        let m = re
            .find("mail user@host now")
            .expect("should not time out")
            .expect("should match");
        let mut out = String::new();
        let program = ReplacementProgram::compile("[$2@$1] [$`] [$'] [$+]", &re.cr.groups, false);
        program.render_into(&m, &mut out);
        assert_eq!(out, "[host@user] [mail ] [ now] [host]");
    }
}
