//! Classical backtracking execution engine

use crate::categories;
use crate::folds;
use crate::indexing::{Backward, Direction, Forward, Input};
use crate::insn::{CompiledRegex, Insn, LoopFields};
use crate::ir::AnchorType;
use crate::types::{Capture, CaptureGroupID, LoopData, LoopID, IP};
use crate::util::{next_char_pos, prev_char_pos};
use log::trace;
use std::time::Instant;

/// How many steps may pass between checks of the deadline.
const TIMEOUT_CHECK_INTERVAL: usize = 1 << 10;

/// Raised when an attempt runs past its deadline. Aborts the whole scan.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimedOut;

#[derive(Clone, Debug)]
enum BacktrackInsn {
    /// Nothing more to backtrack.
    /// This "backstops" our stack, and fences off the choice points of an
    /// atomic group or lookaround from the enclosing ones.
    Exhausted,

    /// Restore the IP and position.
    SetPosition { ip: IP, pos: usize, crawl: usize },

    SetLoopData {
        id: LoopID,
        data: LoopData,
    },

    EnterNonGreedyLoop {
        // The IP of the loop.
        // This is guaranteed to point to an EnterLoop.
        ip: IP,
        data: LoopData,
        crawl: usize,
    },

    GreedyLoop1Char {
        continuation: IP,
        min: usize,
        max: usize,
        crawl: usize,
    },

    NonGreedyLoop1Char {
        continuation: IP,
        min: usize,
        max: usize,
        crawl: usize,
    },

    /// Undo the mark pushed when entering a capture group.
    PopMark,

    /// Undo the mark consumed when exiting a capture group.
    RestoreMark(usize),
}

/// An entry in the capture undo log.
#[derive(Clone, Debug)]
enum Crawl {
    /// A capture was appended to this slot.
    Captured(CaptureGroupID),

    /// This capture was balanced away from the slot.
    Balanced(CaptureGroupID, Capture),
}

/// Scratch state for match attempts. It is reused from attempt to attempt
/// and pooled by each regex.
#[derive(Debug, Default)]
pub struct State {
    // Track stack: choice points and the undo entries between them.
    bts: Vec<BacktrackInsn>,

    // Data stack: start positions of open capture groups.
    marks: Vec<usize>,

    // Crawl stack: capture undo log.
    crawl: Vec<Crawl>,

    loops: Vec<LoopData>,

    // Capture history for every slot.
    groups: Vec<Vec<Capture>>,

    steps: usize,
    next_check: usize,
}

impl State {
    pub fn new(re: &CompiledRegex) -> State {
        State {
            bts: Vec::with_capacity(re.track_count.max(1) * 2),
            marks: Vec::new(),
            crawl: Vec::new(),
            loops: vec![LoopData::new(0); re.loops],
            groups: vec![Vec::new(); re.groups.len()],
            steps: 0,
            next_check: TIMEOUT_CHECK_INTERVAL,
        }
    }

    /// The capture history of every slot after a successful attempt.
    /// Slot 0 is not filled in.
    pub fn groups(&self) -> &[Vec<Capture>] {
        &self.groups
    }
}

#[derive(Debug)]
pub(crate) struct MatchAttempter<'r, 't, 's> {
    re: &'r CompiledRegex,
    input: Input<'t>,
    s: &'s mut State,

    // Where the current scan began, for \G.
    scan_start: usize,

    deadline: Option<Instant>,
}

impl<'r, 't, 's> MatchAttempter<'r, 't, 's> {
    pub(crate) fn new(
        re: &'r CompiledRegex,
        input: Input<'t>,
        s: &'s mut State,
        deadline: Option<Instant>,
    ) -> Self {
        s.steps = 0;
        s.next_check = TIMEOUT_CHECK_INTERVAL;
        Self {
            re,
            input,
            s,
            scan_start: 0,
            deadline,
        }
    }

    /// The scratch state, holding the captures of the last successful attempt.
    pub(crate) fn state(&self) -> &State {
        self.s
    }

    /// Attempt a match beginning at `pos`, in the direction of the regex.
    /// \return the position where the match ended.
    pub(crate) fn attempt(
        &mut self,
        pos: usize,
        scan_start: usize,
    ) -> Result<Option<usize>, TimedOut> {
        self.scan_start = scan_start;
        self.uncapture_to(0);
        self.s.marks.clear();
        self.s.bts.clear();
        if self.re.flags.right_to_left {
            self.run_sub::<Backward>(0, pos)
        } else {
            self.run_sub::<Forward>(0, pos)
        }
    }

    /// Count a step, checking the deadline every so often.
    #[inline(always)]
    fn tick(&mut self, steps: usize) -> Result<(), TimedOut> {
        self.s.steps += steps;
        if self.s.steps >= self.s.next_check {
            self.s.next_check = self.s.steps + TIMEOUT_CHECK_INTERVAL;
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    trace!("Timed out after {} steps", self.s.steps);
                    return Err(TimedOut);
                }
            }
        }
        Ok(())
    }

    #[inline(always)]
    fn pop_backtrack(&mut self) {
        // Note the barrier is never popped here, so this will never be empty.
        debug_assert!(!self.s.bts.is_empty());
        self.s.bts.pop();
    }

    /// Roll back captures until the crawl stack has the given length.
    fn uncapture_to(&mut self, len: usize) {
        while self.s.crawl.len() > len {
            match self.s.crawl.pop() {
                Some(Crawl::Captured(slot)) => {
                    self.s.groups[slot as usize].pop();
                }
                Some(Crawl::Balanced(slot, capture)) => {
                    self.s.groups[slot as usize].push(capture);
                }
                None => unreachable!("Crawl stack shorter than its watermark"),
            }
        }
    }

    fn capture(&mut self, slot: CaptureGroupID, capture: Capture) {
        self.s.groups[slot as usize].push(capture);
        self.s.crawl.push(Crawl::Captured(slot));
    }

    /// Close a capture group that began at `mark` and ends at `pos`.
    /// \return false if a balancing group had nothing to balance.
    fn end_capture(
        &mut self,
        slot: Option<CaptureGroupID>,
        uncapture: Option<CaptureGroupID>,
        mark: usize,
        pos: usize,
    ) -> bool {
        let (mut start, mut end) = if mark <= pos { (mark, pos) } else { (pos, mark) };
        let Some(uncapture) = uncapture else {
            match slot {
                Some(slot) => self.capture(slot, start..end),
                None => unreachable!("Capture group with neither slot nor uncapture"),
            }
            return true;
        };

        let Some(balanced) = self.s.groups[uncapture as usize].pop() else {
            return false;
        };
        self.s.crawl.push(Crawl::Balanced(uncapture, balanced.clone()));
        if let Some(slot) = slot {
            // The new capture spans the text between the two.
            if start >= balanced.end {
                end = start;
                start = balanced.end;
            } else if end <= balanced.start {
                start = end;
                end = balanced.start;
            } else {
                end = end.min(balanced.end);
                start = start.max(balanced.start);
            }
            self.capture(slot, start..end);
        }
        true
    }

    /// Run a body that ends in its own Goal, with a fresh barrier so that
    /// its choice points are discarded when it completes.
    fn run_sub<Dir: Direction>(
        &mut self,
        ip: IP,
        pos: usize,
    ) -> Result<Option<usize>, TimedOut> {
        let base = self.s.bts.len();
        self.s.bts.push(BacktrackInsn::Exhausted);
        let result = self.try_at_pos::<Dir>(ip, pos);
        self.s.bts.truncate(base);
        result
    }

    fn prepare_to_enter_loop(
        bts: &mut Vec<BacktrackInsn>,
        pos: usize,
        loop_fields: &LoopFields,
        loop_data: &mut LoopData,
    ) {
        bts.push(BacktrackInsn::SetLoopData {
            id: loop_fields.loop_id,
            data: *loop_data,
        });
        loop_data.iters += 1;
        loop_data.entry = pos;
    }

    fn run_loop(&mut self, loop_fields: &LoopFields, pos: usize, ip: IP) -> Option<IP> {
        let crawl = self.s.crawl.len();
        let loop_data = &mut self.s.loops[loop_fields.loop_id as usize];
        let iteration = loop_data.iters;

        let loop_taken_ip = ip + 1;
        let loop_not_taken_ip = loop_fields.exit as IP;

        // Once the minimum is met, an iteration that matched the empty string
        // ends the loop.
        if loop_data.entry == pos && iteration > loop_fields.min_iters {
            return Some(loop_not_taken_ip);
        }

        let do_taken = iteration < loop_fields.max_iters;
        let do_not_taken = iteration >= loop_fields.min_iters;

        match (do_taken, do_not_taken) {
            (false, false) => {
                // No arms viable.
                None
            }
            (false, true) => {
                // Only skipping is viable.
                Some(loop_not_taken_ip)
            }
            (true, false) => {
                // Only entering is viable.
                Self::prepare_to_enter_loop(&mut self.s.bts, pos, loop_fields, loop_data);
                Some(loop_taken_ip)
            }
            (true, true) if !loop_fields.greedy => {
                // Both arms are viable; backtrack into the loop.
                loop_data.entry = pos;
                self.s.bts.push(BacktrackInsn::EnterNonGreedyLoop {
                    ip,
                    data: *loop_data,
                    crawl,
                });
                Some(loop_not_taken_ip)
            }
            (true, true) => {
                debug_assert!(loop_fields.greedy, "Should be greedy");
                // Both arms are viable; backtrack out of the loop.
                self.s.bts.push(BacktrackInsn::SetPosition {
                    ip: loop_not_taken_ip,
                    pos,
                    crawl,
                });
                Self::prepare_to_enter_loop(&mut self.s.bts, pos, loop_fields, loop_data);
                Some(loop_taken_ip)
            }
        }
    }

    /// \return whether a single-char instruction accepts `c`.
    #[inline(always)]
    fn test_char(&self, insn: &Insn, c: char) -> bool {
        let invariant = self.re.flags.culture_invariant;
        match *insn {
            Insn::Char { c: expected, icase } => {
                if icase {
                    folds::fold(c, invariant) == expected
                } else {
                    c == expected
                }
            }
            Insn::NotChar { c: excluded, icase } => {
                if icase {
                    folds::fold(c, invariant) != excluded
                } else {
                    c != excluded
                }
            }
            Insn::MatchAny => true,
            Insn::Class { idx, icase } => {
                let c = if icase { folds::fold(c, invariant) } else { c };
                self.re.classes[idx].contains(c)
            }
            _ => unreachable!("Not a single char instruction: {:?}", insn),
        }
    }

    /// Match one char in direction Dir.
    #[inline(always)]
    fn match_char<Dir: Direction>(&self, insn: &Insn, pos: &mut usize) -> bool {
        let mut p = *pos;
        match self.input.next::<Dir>(&mut p) {
            Some(c) if self.test_char(insn, c) => {
                *pos = p;
                true
            }
            _ => false,
        }
    }

    // Given that ip points at a loop whose body matches exactly one character, run
    // a "single character loop". The big idea here is that we don't need to save
    // our position every iteration: we know that our loop body matches a single
    // character so we can backtrack by stepping back a character.
    // \return the next IP, or None if the loop failed.
    #[allow(clippy::too_many_arguments)]
    fn run_scm_loop<Dir: Direction>(
        &mut self,
        pos: &mut usize,
        min: usize,
        max: usize,
        ip: IP,
        greedy: bool,
        atomic: bool,
    ) -> Result<Option<IP>, TimedOut> {
        let re = self.re;
        let body = &re.insns[ip + 1];
        let mut p = *pos;
        let mut count = 0;
        while count < min {
            if !self.match_char::<Dir>(body, &mut p) {
                self.tick(count)?;
                return Ok(None);
            }
            count += 1;
        }
        let min_pos = p;

        // Drive it up to the max.
        while count < max && self.match_char::<Dir>(body, &mut p) {
            count += 1;
        }
        let max_pos = p;
        self.tick(count)?;

        // The continuation is one past the loop body, which is one past the loop.
        let continuation = ip + 2;
        if !atomic && min_pos != max_pos {
            // Backtracking is possible.
            let crawl = self.s.crawl.len();
            let bti = if greedy {
                BacktrackInsn::GreedyLoop1Char {
                    continuation,
                    min: min_pos,
                    max: max_pos,
                    crawl,
                }
            } else {
                BacktrackInsn::NonGreedyLoop1Char {
                    continuation,
                    min: min_pos,
                    max: max_pos,
                    crawl,
                }
            };
            self.s.bts.push(bti);
        }

        // Start at the max (min) if greedy (nongreedy).
        *pos = if greedy { max_pos } else { min_pos };
        Ok(Some(continuation))
    }

    /// Attempt to backtrack.
    /// \return true if we backtracked, false if we exhaust the backtrack stack.
    fn try_backtrack<Dir: Direction>(&mut self, ip: &mut IP, pos: &mut usize) -> bool {
        let text = self.input.text();
        loop {
            let bt = match self.s.bts.last_mut() {
                Some(bt) => bt,
                None => unreachable!("BT stack should never be empty"),
            };
            match bt {
                BacktrackInsn::Exhausted => return false,

                &mut BacktrackInsn::SetPosition {
                    ip: saved_ip,
                    pos: saved_pos,
                    crawl,
                } => {
                    *ip = saved_ip;
                    *pos = saved_pos;
                    self.pop_backtrack();
                    self.uncapture_to(crawl);
                    return true;
                }
                &mut BacktrackInsn::SetLoopData { id, data } => {
                    self.s.loops[id as usize] = data;
                    self.pop_backtrack();
                }
                BacktrackInsn::PopMark => {
                    self.s.marks.pop();
                    self.pop_backtrack();
                }
                &mut BacktrackInsn::RestoreMark(mark) => {
                    self.s.marks.push(mark);
                    self.pop_backtrack();
                }

                &mut BacktrackInsn::EnterNonGreedyLoop {
                    ip: loop_ip,
                    data,
                    crawl,
                } => {
                    // Must pop before we enter the loop.
                    self.pop_backtrack();
                    self.uncapture_to(crawl);
                    *ip = loop_ip + 1;
                    *pos = data.entry;
                    let re = self.re;
                    let loop_fields = match &re.insns[loop_ip] {
                        Insn::EnterLoop(loop_fields) => loop_fields,
                        _ => unreachable!("EnterNonGreedyLoop must point at a loop instruction"),
                    };
                    let loop_data = &mut self.s.loops[loop_fields.loop_id as usize];
                    *loop_data = data;
                    Self::prepare_to_enter_loop(&mut self.s.bts, *pos, loop_fields, loop_data);
                    return true;
                }

                BacktrackInsn::GreedyLoop1Char {
                    continuation,
                    min,
                    max,
                    crawl,
                } => {
                    // The match failed at the max location.
                    // If min is equal to max, there is no more backtracking to be done;
                    // otherwise move opposite the direction of the cursor.
                    if *max == *min {
                        // We have backtracked this loop as far as possible.
                        self.pop_backtrack();
                        continue;
                    }
                    let newmax = if Dir::FORWARD {
                        prev_char_pos(text, *max)
                    } else {
                        next_char_pos(text, *max)
                    };
                    match newmax {
                        Some(newmax) => {
                            *pos = newmax;
                            *max = newmax;
                        }
                        None => unreachable!("Should always be able to step since min != max"),
                    }
                    *ip = *continuation;
                    let crawl = *crawl;
                    self.uncapture_to(crawl);
                    return true;
                }

                BacktrackInsn::NonGreedyLoop1Char {
                    continuation,
                    min,
                    max,
                    crawl,
                } => {
                    // The match failed at the min location.
                    if *max == *min {
                        // We have backtracked this loop as far as possible.
                        self.pop_backtrack();
                        continue;
                    }
                    // Move in the direction of the cursor.
                    let newmin = if Dir::FORWARD {
                        next_char_pos(text, *min)
                    } else {
                        prev_char_pos(text, *min)
                    };
                    match newmin {
                        Some(newmin) => {
                            *pos = newmin;
                            *min = newmin;
                        }
                        None => unreachable!("Should always be able to step since min != max"),
                    }
                    *ip = *continuation;
                    let crawl = *crawl;
                    self.uncapture_to(crawl);
                    return true;
                }
            }
        }
    }

    /// \return whether an anchor holds at `pos`.
    fn anchor_matches(&self, anchor: AnchorType, pos: usize) -> bool {
        let bytes = self.input.bytes();
        let len = bytes.len();
        match anchor {
            AnchorType::StartOfLine => pos == 0 || bytes[pos - 1] == b'\n',
            AnchorType::EndOfLine => pos == len || bytes[pos] == b'\n',
            AnchorType::Beginning => pos == 0,
            AnchorType::Start => pos == self.scan_start,
            AnchorType::EndZ => pos == len || (pos + 1 == len && bytes[pos] == b'\n'),
            AnchorType::End => pos == len,
        }
    }

    /// \return whether `pos` is at a word boundary.
    fn is_boundary(&self, pos: usize, ecma: bool) -> bool {
        let is_word = |c: char| {
            if ecma {
                categories::is_ecma_word_char(c)
            } else {
                categories::is_boundary_word_char(c)
            }
        };
        let prev = self.input.peek_left(pos).map_or(false, is_word);
        let next = self.input.peek_right(pos).map_or(false, is_word);
        prev != next
    }

    /// Attempt to match at a given IP and position.
    /// The caller has pushed a barrier onto the backtrack stack.
    fn try_at_pos<Dir: Direction>(
        &mut self,
        mut ip: IP,
        mut pos: usize,
    ) -> Result<Option<usize>, TimedOut> {
        let re = self.re;
        let input = self.input;
        let invariant = re.flags.culture_invariant;
        // These are not really loops, they are just labels that we effectively 'goto'
        // to.
        #[allow(clippy::never_loop)]
        'nextinsn: loop {
            'backtrack: loop {
                self.tick(1)?;

                // Helper macro to either increment ip and go to the next insn, or backtrack.
                macro_rules! next_or_bt {
                    ($e:expr) => {
                        if $e {
                            ip += 1;
                            continue 'nextinsn;
                        } else {
                            break 'backtrack;
                        }
                    };
                }

                match &re.insns[ip] {
                    insn @ (Insn::Char { .. }
                    | Insn::NotChar { .. }
                    | Insn::MatchAny
                    | Insn::Class { .. }) => {
                        next_or_bt!(self.match_char::<Dir>(insn, &mut pos))
                    }

                    &Insn::Literal { idx, icase } => {
                        let lit = &re.literals[idx];
                        let m = if icase {
                            input.match_str_icase::<Dir>(&mut pos, lit, invariant)
                        } else {
                            input.match_str::<Dir>(&mut pos, lit)
                        };
                        next_or_bt!(m)
                    }

                    &Insn::Anchor(anchor) => next_or_bt!(self.anchor_matches(anchor, pos)),

                    &Insn::WordBoundary { invert, ecma } => {
                        next_or_bt!(self.is_boundary(pos, ecma) != invert)
                    }

                    &Insn::Jump { target } => {
                        ip = target as IP;
                        continue 'nextinsn;
                    }

                    Insn::BeginCapture => {
                        self.s.marks.push(pos);
                        self.s.bts.push(BacktrackInsn::PopMark);
                        next_or_bt!(true)
                    }

                    &Insn::EndCapture { slot, uncapture } => {
                        let mark = match self.s.marks.pop() {
                            Some(mark) => mark,
                            None => unreachable!("Capture group exited without being entered"),
                        };
                        self.s.bts.push(BacktrackInsn::RestoreMark(mark));
                        next_or_bt!(self.end_capture(slot, uncapture, mark, pos))
                    }

                    &Insn::BackRef { slot, icase } => {
                        let matched = match self.s.groups[slot as usize].last() {
                            Some(capture) => input.match_capture::<Dir>(
                                &mut pos,
                                capture.clone(),
                                icase,
                                invariant,
                            ),
                            // A reference to a group that has not captured
                            // only matches under ECMAScript rules.
                            None => re.flags.ecmascript,
                        };
                        next_or_bt!(matched)
                    }

                    &Insn::BackrefCondition { slot, no } => {
                        if self.s.groups[slot as usize].is_empty() {
                            ip = no as IP;
                        } else {
                            ip += 1;
                        }
                        continue 'nextinsn;
                    }

                    &Insn::ExprCondition { yes, no } => {
                        let crawl = self.s.crawl.len();
                        if self.run_sub::<Forward>(ip + 1, pos)?.is_some() {
                            ip = yes as IP;
                        } else {
                            self.uncapture_to(crawl);
                            ip = no as IP;
                        }
                        continue 'nextinsn;
                    }

                    &Insn::Atomic { continuation } => {
                        let crawl = self.s.crawl.len();
                        match self.run_sub::<Dir>(ip + 1, pos)? {
                            Some(end) => {
                                pos = end;
                                ip = continuation as IP;
                                continue 'nextinsn;
                            }
                            None => {
                                self.uncapture_to(crawl);
                                break 'backtrack;
                            }
                        }
                    }

                    &Insn::Lookahead {
                        negate,
                        continuation,
                    } => {
                        let crawl = self.s.crawl.len();
                        let matched = self.run_sub::<Forward>(ip + 1, pos)?.is_some();
                        if negate || !matched {
                            self.uncapture_to(crawl);
                        }
                        if matched != negate {
                            ip = continuation as IP;
                            continue 'nextinsn;
                        } else {
                            break 'backtrack;
                        }
                    }

                    &Insn::Lookbehind {
                        negate,
                        continuation,
                    } => {
                        let crawl = self.s.crawl.len();
                        let matched = self.run_sub::<Backward>(ip + 1, pos)?.is_some();
                        if negate || !matched {
                            self.uncapture_to(crawl);
                        }
                        if matched != negate {
                            ip = continuation as IP;
                            continue 'nextinsn;
                        } else {
                            break 'backtrack;
                        }
                    }

                    &Insn::Alt { secondary } => {
                        self.s.bts.push(BacktrackInsn::SetPosition {
                            ip: secondary as IP,
                            pos,
                            crawl: self.s.crawl.len(),
                        });
                        next_or_bt!(true);
                    }

                    Insn::EnterLoop(fields) => {
                        // Entering a loop, not re-entering it.
                        let loop_data = &mut self.s.loops[fields.loop_id as usize];
                        self.s.bts.push(BacktrackInsn::SetLoopData {
                            id: fields.loop_id,
                            data: *loop_data,
                        });
                        *loop_data = LoopData::new(pos);
                        match self.run_loop(fields, pos, ip) {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => {
                                break 'backtrack;
                            }
                        }
                    }

                    &Insn::LoopAgain { begin } => {
                        let act = match &re.insns[begin as IP] {
                            Insn::EnterLoop(fields) => self.run_loop(fields, pos, begin as IP),
                            _ => unreachable!("LoopAgain should always refer to an EnterLoop"),
                        };
                        match act {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => break 'backtrack,
                        }
                    }

                    &Insn::Loop1CharBody {
                        min_iters,
                        max_iters,
                        greedy,
                        atomic,
                    } => {
                        let next = self.run_scm_loop::<Dir>(
                            &mut pos, min_iters, max_iters, ip, greedy, atomic,
                        )?;
                        match next {
                            Some(next_ip) => {
                                ip = next_ip;
                                continue 'nextinsn;
                            }
                            None => break 'backtrack,
                        }
                    }

                    Insn::Goal => {
                        return Ok(Some(pos));
                    }

                    Insn::JustFail => {
                        break 'backtrack;
                    }
                }
            }

            // This after the backtrack loop.
            // A break 'backtrack will jump here.
            if !self.try_backtrack::<Dir>(&mut ip, &mut pos) {
                // We have exhausted the backtracking stack.
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit;
    use crate::optimizer;
    use crate::parse;
    use crate::types::Flags;

    fn compile(pattern: &str, flags: &str) -> CompiledRegex {
        let mut re = parse::try_parse(pattern, Flags::from(flags)).expect("should parse");
        optimizer::optimize(&mut re);
        emit::emit(&re)
    }

    /// Attempt at a single position, returning the end and slot 1's history.
    fn attempt_at(pattern: &str, flags: &str, text: &str, pos: usize) -> Option<(usize, Vec<Capture>)> {
        let re = compile(pattern, flags);
        let mut state = State::new(&re);
        let mut attempter = MatchAttempter::new(&re, Input::new(text), &mut state, None);
        let end = attempter.attempt(pos, pos).expect("should not time out")?;
        let history = attempter.state().groups().get(1).cloned().unwrap_or_default();
        Some((end, history))
    }

    #[test]
    fn single_attempts() {
        assert_eq!(attempt_at("a*b", "", "aaab", 0).map(|r| r.0), Some(4));
        assert_eq!(attempt_at("a|ab", "", "ab", 0).map(|r| r.0), Some(1));
        assert_eq!(attempt_at("a+?", "", "aaa", 0).map(|r| r.0), Some(1));
        assert_eq!(attempt_at("a+?b", "", "aaab", 0).map(|r| r.0), Some(4));
        assert_eq!(attempt_at("(?>a+)a", "", "aaa", 0), None);
        assert_eq!(attempt_at("x", "", "ax", 0), None);
    }

    #[test]
    fn capture_histories() {
        let (end, caps) = attempt_at("(a|b)+", "", "abba", 0).expect("should match");
        assert_eq!(end, 4);
        assert_eq!(caps, vec![0..1, 1..2, 2..3, 3..4]);

        // Backtracking discards captures made on the abandoned path.
        let (_, caps) = attempt_at("(?:(a)|ab)c", "", "abc", 0).expect("should match");
        assert!(caps.is_empty());
    }

    #[test]
    fn balancing_groups() {
        // Each close paren balances away one open paren.
        let pattern = r"^(?:(?<o>\()|(?<-o>\))|[^()])*(?(o)(?!))$";
        assert!(attempt_at(pattern, "", "(a(b)c)", 0).is_some());
        assert!(attempt_at(pattern, "", "(a(b)c", 0).is_none());
        assert!(attempt_at(pattern, "", "a)(", 0).is_none());
    }

    #[test]
    fn right_to_left_attempt() {
        let text = "abcabc";
        assert_eq!(attempt_at("abc", "r", text, text.len()).map(|r| r.0), Some(3));
        assert_eq!(attempt_at(r"(?<=b)c", "", text, 2).map(|r| r.0), Some(3));
        assert_eq!(attempt_at(r"(?<!b)c", "", text, 2), None);
    }

    #[test]
    fn timeout_fires() {
        let re = compile("(a+)+$", "");
        let text = "a".repeat(40) + "!";
        let mut state = State::new(&re);
        let deadline = Instant::now();
        let mut attempter = MatchAttempter::new(&re, Input::new(&text), &mut state, Some(deadline));
        assert_eq!(attempter.attempt(0, 0), Err(TimedOut));
    }
}
