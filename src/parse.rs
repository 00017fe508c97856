//! Parser from regex patterns to IR

use crate::categories::{self, Category, CategorySet, Property};
use crate::charclass::CharClass;
use crate::error::{ParseError, ParseErrorKind};
use crate::folds;
use crate::ir::{self, AnchorType, Node, Quantifier};
use crate::types::{
    CaptureGroupID, Flags, GroupTable, INFINITE, MAX_CAPTURE_GROUPS, MAX_LOOPS, MAX_PARSE_DEPTH,
};
use std::collections::HashMap;

type PResult<T> = Result<T, ParseError>;

fn make_cat(mut nodes: ir::NodeList) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.pop().unwrap_or(Node::Empty),
        _ => Node::Cat(nodes),
    }
}

fn make_alt(mut nodes: ir::NodeList) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.pop().unwrap_or(Node::Empty),
        _ => Node::Alt(nodes),
    }
}

fn is_word_char(c: char) -> bool {
    categories::word_categories().matches(c)
}

/// Whitespace skipped in free-spacing mode.
fn is_blank(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' ')
}

/// \return whether some other char may compare equal to `c` when ignoring
/// case. A false return lets the matcher compare exactly.
fn has_case(c: char, culture_invariant: bool) -> bool {
    folds::fold(c, culture_invariant) != c || c.to_uppercase().next() != Some(c)
}

/// \return the class for a shorthand escape letter like `d` or `W`,
/// before any negation.
fn shorthand_class(letter: char, ecmascript: bool) -> CharClass {
    match letter.to_ascii_lowercase() {
        'd' => categories::digit_class(ecmascript),
        's' => categories::space_class(ecmascript),
        _ => categories::word_class(ecmascript),
    }
}

/// What an opening paren introduces.
#[derive(Debug, Copy, Clone)]
enum GroupKind {
    NonCapturing,
    Capture {
        group: Option<CaptureGroupID>,
        uncapture: Option<CaptureGroupID>,
    },
    Lookaround {
        negate: bool,
        backwards: bool,
    },
    Atomic,
    BackrefConditional(CaptureGroupID),
    ExprConditional,
}

/// Represents the state used to parse a regex.
struct Parser {
    /// The pattern, one entry per char.
    chars: Vec<char>,

    /// Byte offset of each char, plus the pattern length.
    offsets: Vec<usize>,

    /// Index of the next char.
    pos: usize,

    /// Flags the regex was built with.
    flags: Flags,

    /// Options in effect at the current position.
    options: Flags,

    /// Capture slots, filled in by the group prescan.
    groups: GroupTable,

    /// Char index at which each group number is first defined.
    group_positions: HashMap<usize, usize>,

    /// Next number for an unnamed group.
    autocap: usize,

    /// Set when the next paren is a condition and must not capture.
    ignore_next_paren: bool,

    /// Number of enclosing groups.
    depth: usize,

    /// Number of loops.
    loop_count: usize,
}

impl Parser {
    fn new(pattern: &str, flags: Flags) -> Parser {
        let chars: Vec<char> = pattern.chars().collect();
        let offsets = pattern
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(pattern.len()))
            .collect();
        Parser {
            chars,
            offsets,
            pos: 0,
            flags,
            options: flags,
            groups: GroupTable::default(),
            group_positions: HashMap::new(),
            autocap: 1,
            ignore_next_paren: false,
            depth: 0,
            loop_count: 0,
        }
    }

    /// Peek at the next character.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Peek `n` characters past the next one.
    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    /// \return the next character.
    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Number of chars not yet consumed.
    fn remaining(&self) -> usize {
        self.chars.len() - self.pos
    }

    /// If our contents begin with the char c, consume it from our contents
    /// and return true. Otherwise return false.
    fn try_consume(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_at<T>(&self, kind: ParseErrorKind, pos: usize) -> PResult<T> {
        Err(ParseError {
            kind,
            offset: self.offsets[pos.min(self.chars.len())],
        })
    }

    fn error<T>(&self, kind: ParseErrorKind) -> PResult<T> {
        self.error_at(kind, self.pos)
    }

    fn slot_for_number(&self, number: usize) -> Option<CaptureGroupID> {
        self.groups
            .slot_for_number(number)
            .map(|slot| slot as CaptureGroupID)
    }

    fn slot_for_name(&self, name: &str) -> Option<CaptureGroupID> {
        self.groups
            .slot_for_name(name)
            .map(|slot| slot as CaptureGroupID)
    }

    /// Scan a decimal number, which must fit in an i32.
    fn scan_decimal(&mut self) -> PResult<usize> {
        let start = self.pos;
        let mut value: usize = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.pos += 1;
            value = value * 10 + digit as usize;
            if value > i32::MAX as usize {
                return self.error_at(ParseErrorKind::QuantifierOverflow, start);
            }
        }
        Ok(value)
    }

    /// Scan a run of word characters.
    fn scan_capname(&mut self) -> String {
        let start = self.pos;
        while self.peek().map_or(false, is_word_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Scan inline option letters like `im-sx`, applying them to `options`.
    /// \return the position of the first letter that ECMAScript forbids.
    fn scan_options(&mut self, options: &mut Flags) -> Option<usize> {
        let mut off = false;
        let mut ecma_violation = None;
        while let Some(c) = self.peek() {
            match c {
                '-' => off = true,
                '+' => off = false,
                'i' => options.icase = !off,
                'm' => options.multiline = !off,
                'n' | 's' | 'x' => {
                    if options.ecmascript && ecma_violation.is_none() {
                        ecma_violation = Some(self.pos);
                    }
                    match c {
                        'n' => options.explicit_capture = !off,
                        's' => options.singleline = !off,
                        _ => options.ignore_whitespace = !off,
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
        ecma_violation
    }

    /// Skip over a bracket expression without interpreting it.
    /// The opening bracket has been consumed.
    fn skip_class(&mut self, depth: usize) {
        self.try_consume('^');
        let mut first = true;
        while let Some(c) = self.next() {
            match c {
                ']' if !first => return,
                '\\' => {
                    self.next();
                }
                '-' if !first && self.peek() == Some('[') && depth < MAX_PARSE_DEPTH => {
                    self.pos += 1;
                    self.skip_class(depth + 1);
                }
                _ => {}
            }
            first = false;
        }
    }

    /// Walk the whole pattern once to number every capture group, so that
    /// references may precede the groups they name.
    fn scan_groups(&mut self) -> PResult<()> {
        let mut numbers: Vec<usize> = vec![0];
        let mut names: Vec<(String, usize)> = Vec::new();
        let mut option_stack: Vec<Flags> = Vec::new();
        let mut options = self.flags;
        let mut autocap = 1;
        let mut positions: HashMap<usize, usize> = HashMap::new();

        let mut note_number = |number: usize, pos: usize, numbers: &mut Vec<usize>| {
            if !numbers.contains(&number) {
                numbers.push(number);
                positions.insert(number, pos);
            }
        };

        self.pos = 0;
        while let Some(c) = self.next() {
            let open = self.pos - 1;
            match c {
                '\\' => {
                    self.next();
                }
                '#' if options.ignore_whitespace => {
                    while !matches!(self.next(), Some('\n') | None) {}
                }
                '[' => self.skip_class(0),
                ')' => {
                    if let Some(saved) = option_stack.pop() {
                        options = saved;
                    }
                }
                '(' if self.peek() == Some('?') && self.peek_at(1) == Some('#') => {
                    while !matches!(self.next(), Some(')') | None) {}
                    self.ignore_next_paren = false;
                }
                '(' => {
                    option_stack.push(options);
                    if self.try_consume('?') {
                        if matches!(self.peek(), Some('<' | '\'')) && self.remaining() > 1 {
                            self.pos += 1;
                            match self.peek() {
                                Some('1'..='9') => {
                                    let number = self.scan_decimal()?;
                                    note_number(number, open, &mut numbers);
                                }
                                Some(c) if c != '0' && is_word_char(c) => {
                                    let name = self.scan_capname();
                                    if !names.iter().any(|(n, _)| *n == name) {
                                        names.push((name, open));
                                    }
                                }
                                _ => {}
                            }
                        } else {
                            self.scan_options(&mut options);
                            if self.try_consume(')') {
                                // (?imnsx-imnsx) applies to the enclosing group.
                                option_stack.pop();
                            } else if self.peek() == Some('(') {
                                self.ignore_next_paren = true;
                                continue;
                            }
                        }
                    } else if !options.explicit_capture && !self.ignore_next_paren {
                        note_number(autocap, open, &mut numbers);
                        autocap += 1;
                    }
                    self.ignore_next_paren = false;
                }
                _ => {}
            }
        }

        // Names take the lowest numbers not already in use.
        let mut named: Vec<(usize, String)> = Vec::with_capacity(names.len());
        for (name, pos) in names {
            while numbers.contains(&autocap) {
                autocap += 1;
            }
            note_number(autocap, pos, &mut numbers);
            named.push((autocap, name));
            autocap += 1;
        }

        if numbers.len() > MAX_CAPTURE_GROUPS {
            return self.error_at(ParseErrorKind::CaptureGroupLimitExceeded, 0);
        }
        numbers.sort_unstable();
        let names = numbers
            .iter()
            .map(|number| {
                named
                    .iter()
                    .find(|(n, _)| n == number)
                    .map(|(_, name)| name.clone().into_boxed_str())
            })
            .collect();
        self.groups = GroupTable {
            numbers: numbers.into_boxed_slice(),
            names,
        };
        self.group_positions = positions;
        self.ignore_next_paren = false;
        self.pos = 0;
        Ok(())
    }

    /// Skip whitespace and `#` comments in free-spacing mode, and `(?#...)`
    /// comments always.
    fn skip_blanks(&mut self) -> PResult<()> {
        loop {
            if self.options.ignore_whitespace {
                while self.peek().map_or(false, is_blank) {
                    self.pos += 1;
                }
                if self.peek() == Some('#') {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.pos += 1;
                    }
                    continue;
                }
            }
            if self.peek() == Some('(') && self.peek_at(1) == Some('?') && self.peek_at(2) == Some('#')
            {
                let start = self.pos;
                while !matches!(self.peek(), Some(')') | None) {
                    self.pos += 1;
                }
                if !self.try_consume(')') {
                    return self.error_at(ParseErrorKind::UnterminatedComment, start);
                }
                continue;
            }
            return Ok(());
        }
    }

    fn try_parse(&mut self) -> PResult<ir::Regex> {
        self.scan_groups()?;
        let body = self.parse_disjunction()?;
        if self.pos < self.chars.len() {
            // Only an excess closing paren stops a top-level disjunction.
            return self.error(ParseErrorKind::TooManyParentheses);
        }
        let mut node = body;
        ir::walk_mut(
            false,
            self.flags.right_to_left,
            &mut node,
            &mut Node::reverse_cats,
        );
        Ok(ir::Regex {
            node: Node::Cat(vec![node, Node::Goal]),
            flags: self.flags,
            groups: std::mem::take(&mut self.groups),
        })
    }

    fn parse_disjunction(&mut self) -> PResult<Node> {
        let mut branches = vec![self.parse_concat()?];
        while self.try_consume('|') {
            branches.push(self.parse_concat()?);
        }
        Ok(make_alt(branches))
    }

    fn parse_concat(&mut self) -> PResult<Node> {
        let mut result: Vec<Node> = Vec::new();
        loop {
            self.skip_blanks()?;
            let Some(c) = self.peek() else { break };
            let start = self.pos;
            let atom = match c {
                // A concatenation is terminated by closing parens or vertical bar.
                ')' | '|' => break,
                '*' | '+' | '?' => {
                    return self.error_at(ParseErrorKind::QuantifierAfterNothing(c), start)
                }
                '{' if self.is_true_quantifier() => {
                    return self.error_at(ParseErrorKind::QuantifierAfterNothing(c), start)
                }
                '[' => {
                    self.pos += 1;
                    Some(self.parse_class_node()?)
                }
                '(' => {
                    self.pos += 1;
                    self.parse_group()?
                }
                '\\' => {
                    self.pos += 1;
                    Some(self.parse_atom_escape()?)
                }
                '.' => {
                    self.pos += 1;
                    Some(if self.options.singleline {
                        Node::MatchAny
                    } else {
                        Node::NotChar {
                            c: '\n',
                            icase: false,
                        }
                    })
                }
                '^' => {
                    self.pos += 1;
                    Some(Node::Anchor(if self.options.multiline {
                        AnchorType::StartOfLine
                    } else {
                        AnchorType::Beginning
                    }))
                }
                '$' => {
                    self.pos += 1;
                    Some(Node::Anchor(if self.options.multiline {
                        AnchorType::EndOfLine
                    } else {
                        AnchorType::EndZ
                    }))
                }
                _ => {
                    self.pos += 1;
                    Some(self.char_node(c))
                }
            };
            // Inline options produce no node.
            let Some(atom) = atom else { continue };

            self.skip_blanks()?;
            let node = match self.try_parse_quantifier()? {
                Some(quant) => {
                    self.skip_blanks()?;
                    if let Some(c) = self.peek() {
                        if matches!(c, '*' | '+' | '?') || (c == '{' && self.is_true_quantifier())
                        {
                            return self.error(ParseErrorKind::NestedQuantifier(c));
                        }
                    }
                    self.make_loop(atom, quant)?
                }
                None => atom,
            };
            result.push(node);
        }
        Ok(make_cat(result))
    }

    fn char_node(&self, c: char) -> Node {
        let invariant = self.flags.culture_invariant;
        if self.options.icase && has_case(c, invariant) {
            Node::Char {
                c: folds::fold(c, invariant),
                icase: true,
            }
        } else {
            Node::Char { c, icase: false }
        }
    }

    /// \return whether the `{` at the cursor begins `{n}`, `{n,}` or `{n,m}`.
    fn is_true_quantifier(&self) -> bool {
        let mut idx = self.pos + 1;
        let digit_at = |i: usize| self.chars.get(i).map_or(false, char::is_ascii_digit);
        if !digit_at(idx) {
            return false;
        }
        while digit_at(idx) {
            idx += 1;
        }
        match self.chars.get(idx) {
            Some('}') => true,
            Some(',') => {
                idx += 1;
                while digit_at(idx) {
                    idx += 1;
                }
                self.chars.get(idx) == Some(&'}')
            }
            _ => false,
        }
    }

    fn try_parse_quantifier(&mut self) -> PResult<Option<Quantifier>> {
        let start = self.pos;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.pos += 1;
                (0, INFINITE)
            }
            Some('+') => {
                self.pos += 1;
                (1, INFINITE)
            }
            Some('?') => {
                self.pos += 1;
                (0, 1)
            }
            Some('{') if self.is_true_quantifier() => {
                self.pos += 1;
                let min = self.scan_decimal()?;
                let max = if self.try_consume(',') {
                    if self.peek() == Some('}') {
                        INFINITE
                    } else {
                        self.scan_decimal()?
                    }
                } else {
                    min
                };
                self.try_consume('}');
                (min, max)
            }
            _ => return Ok(None),
        };
        if min > max {
            return self.error_at(ParseErrorKind::ReversedQuantifierRange, start);
        }
        let greedy = !self.try_consume('?');
        Ok(Some(Quantifier { min, max, greedy }))
    }

    fn make_loop(&mut self, loopee: Node, quant: Quantifier) -> PResult<Node> {
        if quant.max == 0 {
            return Ok(Node::Empty);
        }
        if quant.min == 1 && quant.max == 1 {
            return Ok(loopee);
        }
        self.loop_count += 1;
        if self.loop_count > MAX_LOOPS {
            return self.error(ParseErrorKind::LoopLimitExceeded);
        }
        Ok(if loopee.matches_exactly_one_char() {
            Node::Loop1CharBody {
                loopee: Box::new(loopee),
                quant,
                atomic: false,
            }
        } else {
            Node::Loop {
                loopee: Box::new(loopee),
                quant,
            }
        })
    }

    /// Parse a group. The open paren has been consumed.
    /// \return None for a group that only sets options.
    fn parse_group(&mut self) -> PResult<Option<Node>> {
        let open = self.pos - 1;
        if self.depth >= MAX_PARSE_DEPTH {
            return self.error_at(ParseErrorKind::PatternTooDeep, open);
        }
        let saved_options = self.options;
        let Some(kind) = self.scan_group_open(open)? else {
            return Ok(None);
        };
        self.depth += 1;
        let node = self.parse_group_body(kind);
        self.depth -= 1;
        self.options = saved_options;
        node.map(Some)
    }

    fn expect_close(&mut self) -> PResult<()> {
        if self.try_consume(')') {
            Ok(())
        } else {
            self.error(ParseErrorKind::UnbalancedParenthesis)
        }
    }

    fn parse_group_body(&mut self, kind: GroupKind) -> PResult<Node> {
        let node = match kind {
            GroupKind::BackrefConditional(group) => {
                let (yes, no) = self.parse_conditional_branches()?;
                Node::BackrefConditional { group, yes, no }
            }
            GroupKind::ExprConditional => {
                // The condition is the next group, and never captures.
                let cond_pos = self.pos;
                self.ignore_next_paren = true;
                if !self.try_consume('(') {
                    return self.error_at(ParseErrorKind::AlternationHasMalformedCondition, cond_pos);
                }
                let Some(condition) = self.parse_group()? else {
                    return self.error_at(ParseErrorKind::AlternationHasMalformedCondition, cond_pos);
                };
                let (yes, no) = self.parse_conditional_branches()?;
                Node::ExprConditional {
                    condition: Box::new(condition),
                    yes,
                    no,
                }
            }
            _ => {
                let contents = self.parse_disjunction()?;
                self.expect_close()?;
                match kind {
                    GroupKind::Capture { group, uncapture } => Node::CaptureGroup {
                        contents: Box::new(contents),
                        group,
                        uncapture,
                    },
                    GroupKind::Lookaround { negate, backwards } => Node::LookaroundAssertion {
                        negate,
                        backwards,
                        contents: Box::new(contents),
                    },
                    GroupKind::Atomic => Node::Atomic(Box::new(contents)),
                    _ => contents,
                }
            }
        };
        Ok(node)
    }

    /// Parse `yes|no)` of a conditional.
    fn parse_conditional_branches(&mut self) -> PResult<(Box<Node>, Box<Node>)> {
        let yes = self.parse_concat()?;
        let no = if self.try_consume('|') {
            self.parse_concat()?
        } else {
            Node::Empty
        };
        if self.peek() == Some('|') {
            return self.error(ParseErrorKind::AlternationHasTooManyConditions);
        }
        self.expect_close()?;
        Ok((Box::new(yes), Box::new(no)))
    }

    /// Determine what kind of group follows an open paren.
    /// \return None if it only sets options, like `(?i)`.
    fn scan_group_open(&mut self, open: usize) -> PResult<Option<GroupKind>> {
        let ignore = std::mem::take(&mut self.ignore_next_paren);
        if !self.try_consume('?') {
            if self.options.explicit_capture || ignore {
                return Ok(Some(GroupKind::NonCapturing));
            }
            let number = self.autocap;
            self.autocap += 1;
            return Ok(Some(match self.slot_for_number(number) {
                Some(slot) => GroupKind::Capture {
                    group: Some(slot),
                    uncapture: None,
                },
                None => GroupKind::NonCapturing,
            }));
        }

        let Some(c) = self.next() else {
            return self.error_at(ParseErrorKind::InvalidGroupModifier, open);
        };
        let kind = match c {
            ':' => GroupKind::NonCapturing,
            '=' => GroupKind::Lookaround {
                negate: false,
                backwards: false,
            },
            '!' => GroupKind::Lookaround {
                negate: true,
                backwards: false,
            },
            '>' => GroupKind::Atomic,
            '<' | '\'' => match self.peek() {
                None => return self.error_at(ParseErrorKind::InvalidGroupModifier, open),
                Some(sense @ ('=' | '!')) => {
                    if c == '\'' {
                        return self.error_at(ParseErrorKind::InvalidGroupModifier, open);
                    }
                    self.pos += 1;
                    GroupKind::Lookaround {
                        negate: sense == '!',
                        backwards: true,
                    }
                }
                Some(_) => {
                    let close = if c == '<' { '>' } else { '\'' };
                    self.scan_named_group_open(close, open)?
                }
            },
            '(' => self.scan_condition_open()?,
            _ => {
                self.pos -= 1;
                let mut options = self.options;
                if let Some(bad) = self.scan_options(&mut options) {
                    return self.error_at(ParseErrorKind::InvalidOptionForEcmaScript, bad);
                }
                match self.next() {
                    Some(')') => {
                        self.options = options;
                        return Ok(None);
                    }
                    Some(':') => {
                        self.options = options;
                        GroupKind::NonCapturing
                    }
                    _ => return self.error_at(ParseErrorKind::InvalidGroupModifier, open),
                }
            }
        };
        Ok(Some(kind))
    }

    /// Parse the rest of `(?<name>`, `(?<number>`, `(?<name-other>` or
    /// `(?<-other>`. The `<` or `'` has been consumed.
    fn scan_named_group_open(&mut self, close: char, open: usize) -> PResult<GroupKind> {
        let mut group = None;
        let mut proceed = false;
        let name_ok = |p: &Parser| match p.peek() {
            None => true,
            Some(c) => c == close || c == '-',
        };
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                let number = self.scan_decimal()?;
                if !name_ok(self) {
                    return self.error(ParseErrorKind::InvalidGroupName);
                }
                if number == 0 {
                    return self.error_at(ParseErrorKind::CaptureGroupNumberZero, start);
                }
                group = self.slot_for_number(number);
            }
            Some(c) if is_word_char(c) => {
                let name = self.scan_capname();
                if !name_ok(self) {
                    return self.error(ParseErrorKind::InvalidGroupName);
                }
                group = self.slot_for_name(&name);
            }
            Some('-') => proceed = true,
            _ => return self.error(ParseErrorKind::InvalidGroupName),
        }

        let mut uncapture = None;
        if (group.is_some() || proceed) && self.remaining() > 1 && self.peek() == Some('-') {
            self.pos += 1;
            let start = self.pos;
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    let number = self.scan_decimal()?;
                    match self.slot_for_number(number) {
                        Some(slot) => uncapture = Some(slot),
                        None => {
                            return self.error_at(
                                ParseErrorKind::UndefinedGroupInBalancing(number.to_string()),
                                start,
                            )
                        }
                    }
                }
                Some(c) if is_word_char(c) => {
                    let name = self.scan_capname();
                    match self.slot_for_name(&name) {
                        Some(slot) => uncapture = Some(slot),
                        None => {
                            return self
                                .error_at(ParseErrorKind::UndefinedGroupInBalancing(name), start)
                        }
                    }
                }
                _ => return self.error(ParseErrorKind::InvalidGroupName),
            }
            if self.peek().map_or(false, |c| c != close) {
                return self.error(ParseErrorKind::InvalidGroupName);
            }
        }

        if (group.is_some() || uncapture.is_some()) && self.next() == Some(close) {
            return Ok(GroupKind::Capture { group, uncapture });
        }
        self.error_at(ParseErrorKind::InvalidGroupModifier, open)
    }

    /// Parse the start of `(?(`. The second paren has been consumed.
    fn scan_condition_open(&mut self) -> PResult<GroupKind> {
        let paren = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let number = self.scan_decimal()?;
                if self.next() != Some(')') {
                    return self.error_at(ParseErrorKind::AlternationHasMalformedReference, paren);
                }
                return match self.slot_for_number(number) {
                    Some(slot) => Ok(GroupKind::BackrefConditional(slot)),
                    None => self.error_at(
                        ParseErrorKind::AlternationHasUndefinedReference(number),
                        paren,
                    ),
                };
            }
            Some(c) if is_word_char(c) => {
                let name = self.scan_capname();
                if let Some(slot) = self.slot_for_name(&name) {
                    if self.next() == Some(')') {
                        return Ok(GroupKind::BackrefConditional(slot));
                    }
                }
            }
            _ => {}
        }

        // Not a reference: the condition is an expression in the next group.
        self.pos = paren - 1;
        if self.peek_at(1) == Some('?') {
            match self.peek_at(2) {
                Some('#') => return self.error(ParseErrorKind::AlternationHasComment),
                Some('\'') => return self.error(ParseErrorKind::AlternationHasNamedCapture),
                Some('<') if !matches!(self.peek_at(3), Some('!' | '=') | None) => {
                    return self.error(ParseErrorKind::AlternationHasNamedCapture)
                }
                _ => {}
            }
        }
        Ok(GroupKind::ExprConditional)
    }

    /// Parse an escape outside of a bracket. The backslash has been consumed.
    fn parse_atom_escape(&mut self) -> PResult<Node> {
        let backslash = self.pos - 1;
        let Some(c) = self.peek() else {
            return self.error_at(ParseErrorKind::IllegalEndEscape, backslash);
        };
        let ecma = self.options.ecmascript;
        let node = match c {
            'b' | 'B' => Node::WordBoundary {
                invert: c == 'B',
                ecma,
            },
            'A' => Node::Anchor(AnchorType::Beginning),
            'G' => Node::Anchor(AnchorType::Start),
            'Z' => Node::Anchor(AnchorType::EndZ),
            'z' => Node::Anchor(AnchorType::End),
            'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                let mut cc = shorthand_class(c, ecma);
                if c.is_ascii_uppercase() {
                    cc.negate();
                }
                Node::Class {
                    class: cc.to_descriptor(),
                    icase: false,
                }
            }
            'p' | 'P' => {
                self.pos += 1;
                let mut cc = CharClass::new();
                self.add_property(&mut cc, false)?;
                if c == 'P' {
                    cc.negate();
                }
                return Ok(Node::Class {
                    class: cc.to_descriptor(),
                    icase: self.options.icase,
                });
            }
            _ => return self.parse_backref_or_char(),
        };
        self.pos += 1;
        Ok(node)
    }

    /// Parse a backreference like `\1`, `\k<name>` or `\<name>`, or else a
    /// character escape. The cursor is just past the backslash.
    fn parse_backref_or_char(&mut self) -> PResult<Node> {
        let start = self.pos;
        let backslash = start - 1;
        let mut close = None;
        match self.peek() {
            Some('k') => {
                if self.remaining() >= 2 {
                    self.pos += 1;
                    close = match self.next() {
                        Some('<') => Some('>'),
                        Some('\'') => Some('\''),
                        _ => None,
                    };
                }
                if close.is_none() || self.remaining() == 0 {
                    return self.error_at(ParseErrorKind::MalformedNamedReference, backslash);
                }
            }
            Some(c @ ('<' | '\'')) if self.remaining() > 1 => {
                close = Some(if c == '<' { '>' } else { '\'' });
                self.pos += 1;
            }
            _ => {}
        }

        let icase = self.options.icase;
        let c = self.peek().unwrap_or('\0');
        if let Some(close) = close {
            if c.is_ascii_digit() {
                let number = self.scan_decimal()?;
                if self.next() == Some(close) {
                    return match self.slot_for_number(number) {
                        Some(group) => Ok(Node::BackRef { group, icase }),
                        None => self
                            .error_at(ParseErrorKind::UndefinedNumberedReference(number), start),
                    };
                }
            } else if is_word_char(c) {
                let name = self.scan_capname();
                if self.next() == Some(close) {
                    return match self.slot_for_name(&name) {
                        Some(group) => Ok(Node::BackRef { group, icase }),
                        None => {
                            self.error_at(ParseErrorKind::UndefinedNamedReference(name), start)
                        }
                    };
                }
            }
        } else if ('1'..='9').contains(&c) {
            if self.options.ecmascript {
                if let Some(group) = self.scan_ecma_backref(backslash) {
                    return Ok(Node::BackRef { group, icase });
                }
            } else {
                let number = self.scan_decimal()?;
                if let Some(group) = self.slot_for_number(number) {
                    return Ok(Node::BackRef { group, icase });
                }
                if number <= 9 {
                    return self.error_at(ParseErrorKind::UndefinedNumberedReference(number), start);
                }
            }
        }

        // Not a backreference: must be a char code.
        self.pos = start;
        let c = self.scan_char_escape()?;
        Ok(self.char_node(c))
    }

    /// ECMAScript backreferences take the longest digit prefix that names a
    /// group defined before the reference.
    fn scan_ecma_backref(&mut self, backslash: usize) -> Option<CaptureGroupID> {
        let max_number = self.groups.numbers.last().copied().unwrap_or(0);
        let mut number = 0usize;
        let mut idx = self.pos;
        let mut best = None;
        while let Some(digit) = self.chars.get(idx).and_then(|c| c.to_digit(10)) {
            number = number * 10 + digit as usize;
            if number > max_number {
                break;
            }
            idx += 1;
            let defined_before = self
                .group_positions
                .get(&number)
                .map_or(false, |&pos| pos < backslash);
            if defined_before {
                if let Some(slot) = self.slot_for_number(number) {
                    best = Some((slot, idx));
                }
            }
        }
        let (slot, end) = best?;
        self.pos = end;
        Some(slot)
    }

    /// Scan a character escape. The cursor is just past the backslash.
    fn scan_char_escape(&mut self) -> PResult<char> {
        let start = self.pos;
        let Some(c) = self.next() else {
            return self.error_at(ParseErrorKind::IllegalEndEscape, start.saturating_sub(1));
        };
        if ('0'..='7').contains(&c) {
            self.pos -= 1;
            return Ok(self.scan_octal());
        }
        Ok(match c {
            'x' => self.scan_hex(2)?,
            'u' => self.scan_hex(4)?,
            'a' => '\u{07}',
            'b' => '\u{08}',
            'e' => '\u{1B}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            'c' => self.scan_control()?,
            _ => {
                if !self.options.ecmascript && is_word_char(c) {
                    return self.error_at(ParseErrorKind::UnrecognizedEscape(c), start);
                }
                c
            }
        })
    }

    /// Up to three octal digits. ECMAScript stops before exceeding 0x20.
    fn scan_octal(&mut self) -> char {
        let mut value = 0u32;
        for _ in 0..3 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    self.pos += 1;
                    value = value * 8 + digit;
                    if self.options.ecmascript && value >= 0x20 {
                        break;
                    }
                }
                None => break,
            }
        }
        char::from((value & 0xFF) as u8)
    }

    fn scan_hex(&mut self, digits: usize) -> PResult<char> {
        let start = self.pos;
        let mut value = 0u32;
        for _ in 0..digits {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    self.pos += 1;
                    value = value * 16 + digit;
                }
                None => return self.error(ParseErrorKind::InsufficientHexDigits),
            }
        }
        match char::from_u32(value) {
            Some(c) => Ok(c),
            // A lone surrogate can never occur in the subject.
            None => self.error_at(ParseErrorKind::UnrecognizedEscape('u'), start),
        }
    }

    fn scan_control(&mut self) -> PResult<char> {
        let Some(c) = self.next() else {
            return self.error(ParseErrorKind::MissingControlCharacter);
        };
        let code = (c.to_ascii_uppercase() as u32).wrapping_sub('@' as u32);
        if code < 0x20 {
            Ok(char::from(code as u8))
        } else {
            self.error_at(ParseErrorKind::UnrecognizedControlCharacter, self.pos - 1)
        }
    }

    /// Parse the `{Name}` of `\p{Name}` and add it to a class.
    /// The `p` has been consumed.
    fn add_property(&mut self, cc: &mut CharClass, negate: bool) -> PResult<()> {
        let start = self.pos.saturating_sub(2);
        if self.remaining() < 3 {
            return self.error_at(ParseErrorKind::InvalidUnicodePropertyEscape, start);
        }
        if self.next() != Some('{') {
            return self.error_at(ParseErrorKind::MalformedUnicodePropertyEscape, start);
        }
        let name_start = self.pos;
        while self.peek().map_or(false, |c| is_word_char(c) || c == '-') {
            self.pos += 1;
        }
        let name: String = self.chars[name_start..self.pos].iter().collect();
        if self.next() != Some('}') {
            return self.error_at(ParseErrorKind::InvalidUnicodePropertyEscape, start);
        }
        // Case-insensitive letter categories are widened to all cased letters.
        let property = if self.options.icase && matches!(name.as_str(), "Lu" | "Ll" | "Lt") {
            Property::Categories(CategorySet::of(&[Category::Lu, Category::Ll, Category::Lt]))
        } else {
            match categories::lookup_property(&name) {
                Some(property) => property,
                None => {
                    return self.error_at(ParseErrorKind::UnknownUnicodeProperty(name), start)
                }
            }
        };
        match property {
            Property::Categories(set) => cc.add_categories(set, negate),
            Property::Block(range) => {
                if negate {
                    let mut block = CharClass::new();
                    block.add_code_points(range.first, range.last);
                    cc.add_negated_class(&block);
                } else {
                    cc.add_code_points(range.first, range.last);
                }
            }
        }
        Ok(())
    }

    fn parse_class_node(&mut self) -> PResult<Node> {
        let mut cc = self.parse_class(0)?;
        if self.options.icase {
            cc.add_lowercase(self.flags.culture_invariant);
        }
        cc.canonicalize();
        Ok(Node::Class {
            class: cc.to_descriptor(),
            icase: self.options.icase,
        })
    }

    /// Parse a bracket expression. The opening bracket has been consumed.
    fn parse_class(&mut self, depth: usize) -> PResult<CharClass> {
        let open = self.pos - 1;
        if self.depth + depth >= MAX_PARSE_DEPTH {
            return self.error_at(ParseErrorKind::PatternTooDeep, open);
        }
        let ecma = self.options.ecmascript;
        let mut cc = CharClass::new();
        if self.try_consume('^') {
            cc.negate();
        }
        let mut first = true;
        let mut range_start: Option<char> = None;
        let mut closed = false;
        while let Some(next) = self.next() {
            let mut c = next;
            let is_first = std::mem::replace(&mut first, false);
            let mut translated = false;
            if c == ']' && !is_first {
                closed = true;
                break;
            }
            if c == '\\' && self.remaining() > 0 {
                let escaped = self.peek().unwrap_or('\\');
                match escaped {
                    'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                        if range_start.is_some() {
                            return self.error(ParseErrorKind::ShorthandClassInRange(escaped));
                        }
                        self.pos += 1;
                        let class = shorthand_class(escaped, ecma);
                        if escaped.is_ascii_uppercase() {
                            cc.add_negated_class(&class);
                        } else {
                            cc.add_class(&class);
                        }
                        continue;
                    }
                    'p' | 'P' => {
                        if range_start.is_some() {
                            return self.error(ParseErrorKind::ShorthandClassInRange(escaped));
                        }
                        self.pos += 1;
                        self.add_property(&mut cc, escaped == 'P')?;
                        continue;
                    }
                    _ => {
                        c = self.scan_char_escape()?;
                        translated = true;
                    }
                }
            }

            if let Some(prev) = range_start.take() {
                if c == '[' && !translated {
                    // [a-[b]]: the hyphen begins a subtraction.
                    cc.add_char(prev);
                    let sub = self.parse_class(depth + 1)?;
                    cc.subtract(sub);
                    self.check_subtraction_last()?;
                } else {
                    if prev > c {
                        return self.error(ParseErrorKind::ReversedCharacterRange);
                    }
                    cc.add_range(prev, c);
                }
            } else if self.remaining() >= 2
                && self.peek() == Some('-')
                && self.peek_at(1) != Some(']')
            {
                range_start = Some(c);
                self.pos += 1;
            } else if c == '-' && !translated && !is_first && self.peek() == Some('[') {
                self.pos += 1;
                let sub = self.parse_class(depth + 1)?;
                cc.subtract(sub);
                self.check_subtraction_last()?;
            } else {
                cc.add_char(c);
            }
        }
        if !closed {
            return self.error_at(ParseErrorKind::UnterminatedBracket, open);
        }
        Ok(cc)
    }

    fn check_subtraction_last(&self) -> PResult<()> {
        match self.peek() {
            Some(c) if c != ']' => self.error(ParseErrorKind::SubtractionMustBeLast),
            _ => Ok(()),
        }
    }
}

/// Try parsing a given pattern.
/// Return the resulting IR regex, or an error.
pub fn try_parse(pattern: &str, flags: Flags) -> Result<ir::Regex, ParseError> {
    let mut p = Parser::new(pattern, flags);
    p.try_parse()
}

/// Resolve every escape in `text` the way a pattern would inside a bracket.
pub fn unescape(text: &str) -> Result<String, ParseError> {
    let mut p = Parser::new(text, Flags::default());
    let mut result = String::with_capacity(text.len());
    while let Some(c) = p.next() {
        if c == '\\' {
            if p.remaining() == 0 {
                return p.error_at(ParseErrorKind::IllegalEndEscape, p.pos - 1);
            }
            result.push(p.scan_char_escape()?);
        } else {
            result.push(c);
        }
    }
    Ok(result)
}
