//! Execution engine bits: the scan driver and match enumeration.

use crate::api::{Match, Regex};
use crate::classicalbacktrack::{MatchAttempter, State, TimedOut};
use crate::error::Error;
use crate::folds;
use crate::indexing::Input;
use crate::insn::{CompiledRegex, StartPredicate};
use crate::ir::AnchorType;
use crate::types::Capture;
use crate::util::{next_char_pos, prev_char_pos};
use log::trace;
use std::iter::FusedIterator;
use std::ops::Range;
use std::time::{Duration, Instant};

/// A successful scan, before it is wrapped up as a Match.
#[derive(Debug)]
pub(crate) struct RawMatch {
    pub range: Range<usize>,

    /// Capture history for every slot. Slot 0 holds the match itself.
    pub groups: Vec<Vec<Capture>>,
}

/// Runs scans of one compiled regex over one text.
#[derive(Debug)]
pub(crate) struct Executor<'r, 't> {
    re: &'r CompiledRegex,
    input: Input<'t>,
    deadline: Option<Instant>,
}

impl<'r, 't> Executor<'r, 't> {
    /// Prepare to scan `text`. The timeout, if any, starts now.
    pub(crate) fn new(re: &'r CompiledRegex, text: &'t str, timeout: Option<Duration>) -> Self {
        Executor {
            re,
            input: Input::new(text),
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    /// \return whether the char at a candidate position passes a leading class.
    fn class_accepts(&self, c: char, pred: &StartPredicate) -> bool {
        match pred {
            StartPredicate::LeadingClass { class, icase } => {
                let c = if *icase {
                    folds::fold(c, self.re.flags.culture_invariant)
                } else {
                    c
                };
                class.contains(c)
            }
            _ => true,
        }
    }

    /// \return the first position at or after `pos` where a left to right
    /// match could begin.
    fn next_candidate(&self, pos: usize, scan_start: usize) -> Option<usize> {
        let text = self.input.text();
        let bytes = self.input.bytes();
        let len = bytes.len();
        if pos > len {
            return None;
        }
        match &self.re.start_pred {
            StartPredicate::Arbitrary => Some(pos),
            StartPredicate::Anchored(anchor) => match anchor {
                AnchorType::Beginning => Some(0).filter(|&p| p == pos),
                AnchorType::Start => Some(scan_start).filter(|&p| p >= pos),
                AnchorType::End => Some(len),
                AnchorType::EndZ => {
                    if bytes.last() == Some(&b'\n') && len - 1 >= pos {
                        Some(len - 1)
                    } else {
                        Some(len)
                    }
                }
                AnchorType::StartOfLine => {
                    if pos == 0 || bytes[pos - 1] == b'\n' {
                        Some(pos)
                    } else {
                        memchr::memchr(b'\n', &bytes[pos..]).map(|idx| pos + idx + 1)
                    }
                }
                AnchorType::EndOfLine => Some(pos),
            },
            StartPredicate::Literal(bm) => bm.find(bytes, pos),
            StartPredicate::ByteSet(set) => set.find_in(&bytes[pos..]).map(|idx| pos + idx),
            StartPredicate::ByteBracket(bitmap) => {
                bitmap.find_in(&bytes[pos..]).map(|idx| pos + idx)
            }
            pred @ StartPredicate::LeadingClass { .. } => text[pos..]
                .char_indices()
                .find(|&(_, c)| self.class_accepts(c, pred))
                .map(|(idx, _)| pos + idx),
        }
    }

    /// \return the last position at or before `pos` where a right to left
    /// match could begin.
    fn prev_candidate(&self, pos: usize, scan_start: usize) -> Option<usize> {
        let text = self.input.text();
        let bytes = self.input.bytes();
        let len = bytes.len();
        match &self.re.start_pred {
            StartPredicate::Arbitrary => Some(pos),
            StartPredicate::Anchored(anchor) => match anchor {
                AnchorType::Beginning => Some(0),
                AnchorType::Start => Some(scan_start).filter(|&p| p <= pos),
                AnchorType::End => Some(len).filter(|&p| p == pos),
                AnchorType::EndZ => {
                    if pos == len {
                        Some(len)
                    } else if bytes.last() == Some(&b'\n') && pos + 1 == len {
                        Some(pos)
                    } else {
                        None
                    }
                }
                AnchorType::StartOfLine | AnchorType::EndOfLine => Some(pos),
            },
            StartPredicate::Literal(bm) => bm.rfind(bytes, pos),
            // Backwards byte sets only hold ASCII, so the char ends right after.
            StartPredicate::ByteSet(set) => set.rfind_in(&bytes[..pos]).map(|idx| idx + 1),
            StartPredicate::ByteBracket(bitmap) => bitmap.rfind_in(&bytes[..pos]).map(|idx| idx + 1),
            pred @ StartPredicate::LeadingClass { .. } => text[..pos]
                .char_indices()
                .rev()
                .find(|&(_, c)| self.class_accepts(c, pred))
                .map(|(idx, c)| idx + c.len_utf8()),
        }
    }

    /// Scan for the first match, beginning at `start` and moving in the
    /// direction of the regex.
    pub(crate) fn find(&self, state: &mut State, start: usize) -> Result<Option<RawMatch>, TimedOut> {
        let rtl = self.re.flags.right_to_left;
        let text = self.input.text();
        let len = text.len();
        let mut attempter = MatchAttempter::new(self.re, self.input, state, self.deadline);
        let mut pos = start;
        loop {
            let candidate = if rtl {
                self.prev_candidate(pos, start)
            } else {
                self.next_candidate(pos, start)
            };
            let candidate = match candidate {
                Some(candidate) => candidate,
                None => {
                    trace!("No candidate from {}", pos);
                    return Ok(None);
                }
            };

            // Every char takes at least one byte.
            let room = if rtl { candidate } else { len - candidate };
            if room < self.re.min_length {
                trace!("Too little text left at {}", candidate);
                return Ok(None);
            }

            if let Some(end) = attempter.attempt(candidate, start)? {
                let range = if rtl { end..candidate } else { candidate..end };
                trace!("Matched {:?}", range);
                let mut groups = attempter.state().groups().to_vec();
                groups[0] = vec![range.clone()];
                return Ok(Some(RawMatch { range, groups }));
            }
            trace!("No match at {}", candidate);

            let next = if rtl {
                prev_char_pos(text, candidate)
            } else {
                next_char_pos(text, candidate)
            };
            pos = match next {
                Some(next) => next,
                None => return Ok(None),
            };
        }
    }
}

/// \return where the search following a match should begin, or None if the
/// text is exhausted. An empty match bumps the next search by one char.
pub(crate) fn next_start(text: &str, range: &Range<usize>, right_to_left: bool) -> Option<usize> {
    match (range.is_empty(), right_to_left) {
        (false, false) => Some(range.end),
        (false, true) => Some(range.start),
        (true, false) => next_char_pos(text, range.end),
        (true, true) => prev_char_pos(text, range.start),
    }
}

/// Check out a state and run one scan, mapping a timeout to its error.
pub(crate) fn search<'r, 't>(
    regex: &'r Regex,
    text: &'t str,
    start: usize,
) -> Result<Option<Match<'r, 't>>, Error> {
    let mut state = regex.pool.get();
    let exec = Executor::new(&regex.cr, text, regex.timeout);
    match exec.find(&mut state, start) {
        Ok(Some(raw)) => Ok(Some(Match::new(regex, text, raw))),
        Ok(None) => Ok(None),
        Err(TimedOut) => Err(Error::MatchTimeout {
            pattern: regex.pattern.clone(),
            input_len: text.len(),
            timeout: regex.timeout.unwrap_or_default(),
        }),
    }
}

/// An iterator over successive non-overlapping matches.
/// A timeout is yielded as an error, after which the iterator is exhausted.
#[derive(Debug)]
pub struct Matches<'r, 't> {
    regex: &'r Regex,
    text: &'t str,
    next: Option<usize>,
}

impl<'r, 't> Matches<'r, 't> {
    pub(crate) fn new(regex: &'r Regex, text: &'t str, start: usize) -> Self {
        Matches {
            regex,
            text,
            next: Some(start),
        }
    }
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = Result<Match<'r, 't>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        match search(self.regex, self.text, start) {
            Ok(Some(m)) => {
                self.next = m.next_start();
                Some(Ok(m))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl FusedIterator for Matches<'_, '_> {}
