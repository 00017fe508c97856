use crate::classicalbacktrack::State;
use crate::emit;
use crate::error::Error;
use crate::exec;
use crate::insn::CompiledRegex;
use crate::optimizer;
use crate::parse;
use crate::pool::{Pool, StatePool, StatePoolFn};
use crate::replacer::ReplacementProgram;
use crate::types::Capture;
use core::{fmt, str::FromStr};
use log::debug;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use crate::exec::Matches;
pub use crate::types::Flags;

/// A portion of a string which was found to match a Regex.
///
/// A Match borrows the regex which produced it as `'r` and the searched
/// text as `'t`.
#[derive(Debug, Clone)]
pub struct Match<'r, 't> {
    regex: &'r Regex,
    text: &'t str,
    range: Range<usize>,

    // Capture history for every slot; slot 0 holds the match itself.
    groups: Vec<Vec<Capture>>,

    // Where a search for the following match begins, if anywhere.
    next_start: Option<usize>,
}

impl<'r, 't> Match<'r, 't> {
    pub(crate) fn new(regex: &'r Regex, text: &'t str, raw: exec::RawMatch) -> Self {
        let next_start = exec::next_start(text, &raw.range, regex.cr.flags.right_to_left);
        Match {
            regex,
            text,
            range: raw.range,
            groups: raw.groups,
            next_start,
        }
    }

    /// Returns the range over the starting and ending byte offsets of the
    /// match in the haystack.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Returns the starting byte offset of the match in the haystack.
    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Returns the ending byte offset of the match in the haystack.
    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// The matched text.
    #[inline]
    pub fn as_str(&self) -> &'t str {
        &self.text[self.range.clone()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The whole text that was searched.
    #[inline]
    pub fn text(&self) -> &'t str {
        self.text
    }

    /// The regex which produced this match.
    #[inline]
    pub fn regex(&self) -> &'r Regex {
        self.regex
    }

    pub(crate) fn next_start(&self) -> Option<usize> {
        self.next_start
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.groups.len()
    }

    /// The last capture of a slot, or the empty string.
    pub(crate) fn slot_str(&self, slot: usize) -> &'t str {
        match self.groups[slot].last() {
            Some(capture) => &self.text[capture.clone()],
            None => "",
        }
    }

    fn slot(&self, slot: usize) -> Option<Group<'_>> {
        let captures = self.groups.get(slot)?;
        if captures.is_empty() {
            return None;
        }
        let table = &self.regex.cr.groups;
        Some(Group {
            text: self.text,
            number: table.numbers[slot],
            name: table.names[slot].as_deref(),
            captures,
        })
    }

    /// Access a group by number. Group 0 is the whole match.
    /// Returns None if there is no such group or it did not participate in
    /// the match.
    #[inline]
    pub fn group(&self, number: usize) -> Option<Group<'_>> {
        self.slot(self.regex.cr.groups.slot_for_number(number)?)
    }

    /// Access a group by name.
    #[inline]
    pub fn name(&self, name: &str) -> Option<Group<'_>> {
        self.slot(self.regex.cr.groups.slot_for_name(name)?)
    }

    /// Return an iterator over every group, in ascending order of group
    /// number. The first value is the whole match.
    #[inline]
    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    /// Return an iterator over the named groups, in ascending order of group
    /// number.
    #[inline]
    pub fn named_groups(&self) -> NamedGroups<'_> {
        NamedGroups::new(self)
    }

    /// Search for the match following this one, starting where this match
    /// ends. After an empty match the search starts one char further on.
    pub fn next_match(&self) -> Result<Option<Match<'r, 't>>, Error> {
        match self.next_start {
            Some(start) => exec::search(self.regex, self.text, start),
            None => Ok(None),
        }
    }

    /// Expand a replacement template against this match.
    pub fn expand(&self, template: &str) -> String {
        let program = self.regex.replacement_program(template);
        let mut out = String::new();
        program.render_into(self, &mut out);
        out
    }
}

/// An iterator over the capture groups of a [`Match`]
///
/// This struct is created by the [`groups`] method on [`Match`].
///
/// [`Match`]: struct.Match.html
/// [`groups`]: struct.Match.html#method.groups
#[derive(Clone)]
pub struct Groups<'m> {
    mat: &'m Match<'m, 'm>,
    slot: usize,
}

impl<'m> Groups<'m> {
    #[inline]
    fn new(mat: &'m Match<'m, 'm>) -> Self {
        Self { mat, slot: 0 }
    }
}

impl<'m> Iterator for Groups<'m> {
    type Item = Option<Group<'m>>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slot;
        if slot < self.mat.slot_count() {
            self.slot += 1;
            Some(self.mat.slot(slot))
        } else {
            None
        }
    }
}

/// An iterator over the named capture groups of a [`Match`]
///
/// This struct is created by the [`named_groups`] method on [`Match`].
///
/// [`Match`]: struct.Match.html
/// [`named_groups`]: struct.Match.html#method.named_groups
#[derive(Clone)]
pub struct NamedGroups<'m> {
    mat: &'m Match<'m, 'm>,
    next_slot: usize,
}

impl<'m> NamedGroups<'m> {
    #[inline]
    fn new(mat: &'m Match<'m, 'm>) -> Self {
        Self { mat, next_slot: 0 }
    }
}

impl<'m> Iterator for NamedGroups<'m> {
    type Item = (&'m str, Option<Group<'m>>);

    fn next(&mut self) -> Option<Self::Item> {
        // Unnamed groups are skipped.
        let mat = self.mat;
        let names = &mat.regex.cr.groups.names;
        while self.next_slot < names.len() {
            let slot = self.next_slot;
            self.next_slot += 1;
            if let Some(name) = names[slot].as_deref() {
                return Some((name, mat.slot(slot)));
            }
        }
        None
    }
}

/// A capture group of a [`Match`] which participated in the match.
#[derive(Debug, Clone, Copy)]
pub struct Group<'m> {
    text: &'m str,
    number: usize,
    name: Option<&'m str>,

    // Never empty.
    captures: &'m [Capture],
}

impl<'m> Group<'m> {
    /// The group number.
    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }

    /// The group name, if it was named.
    #[inline]
    pub fn name(&self) -> Option<&'m str> {
        self.name
    }

    /// The range of the last capture of this group.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        match self.captures.last() {
            Some(capture) => capture.clone(),
            None => unreachable!("Group without captures"),
        }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.range().start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.range().end
    }

    /// The text of the last capture of this group.
    #[inline]
    pub fn as_str(&self) -> &'m str {
        &self.text[self.range()]
    }

    /// Every capture this group made, in the order they were made. A group
    /// inside a loop captures once per iteration.
    pub fn captures(&self) -> impl Iterator<Item = &'m str> + 'm {
        let text = self.text;
        let captures = self.captures;
        captures.iter().map(move |capture| &text[capture.clone()])
    }

    /// The ranges of every capture this group made.
    #[inline]
    pub fn capture_ranges(&self) -> &'m [Range<usize>] {
        self.captures
    }
}

/// A Regex is the compiled version of a pattern.
/// It may be shared freely between threads; each search checks out its own
/// scratch state.
pub struct Regex {
    pub(crate) cr: Arc<CompiledRegex>,
    pub(crate) pattern: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) pool: StatePool,

    // The most recently used replacement template.
    replacement: Mutex<Option<(String, Arc<ReplacementProgram>)>>,
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &self.pattern)
            .field("flags", &self.cr.flags)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        Regex::from_compiled(self.cr.clone(), self.pattern.clone(), self.timeout)
    }
}

impl Regex {
    fn from_compiled(cr: Arc<CompiledRegex>, pattern: String, timeout: Option<Duration>) -> Regex {
        let create: StatePoolFn = {
            let cr = cr.clone();
            Box::new(move || State::new(&cr))
        };
        Regex {
            cr,
            pattern,
            timeout,
            pool: Pool::new(create),
            replacement: Mutex::new(None),
        }
    }

    fn compile(pattern: &str, flags: Flags, timeout: Option<Duration>) -> Result<Regex, Error> {
        if !flags.is_valid() {
            return Err(Error::InvalidArgument(format!(
                "ECMAScript mode cannot be combined with flags '{}'",
                flags
            )));
        }
        if timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidArgument(
                "match timeout must be positive".to_string(),
            ));
        }
        let mut ire = parse::try_parse(pattern, flags)?;
        debug!(
            "Parsed /{}/{} into {} nodes",
            pattern,
            flags,
            ire.node_count()
        );
        if !flags.no_opt {
            optimizer::optimize(&mut ire);
            debug!("Optimized to {} nodes", ire.node_count());
        }
        let cr = emit::emit(&ire);
        debug!(
            "Emitted {} instructions, track depth {}, start predicate {}",
            cr.insns.len(),
            cr.track_count,
            cr.start_pred
        );
        Ok(Regex::from_compiled(Arc::new(cr), pattern.to_string(), timeout))
    }

    /// Construct a regex by parsing `pattern` using the default flags.
    /// An Error may be returned if the syntax is invalid.
    /// Note that this is rather expensive; prefer to cache a Regex which is
    /// intended to be used more than once.
    #[inline]
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        Self::with_flags(pattern, Flags::default())
    }

    /// Construct a regex by parsing `pattern` with `flags`.
    ///
    /// ```rust
    /// use retrace::Regex;
    /// let re = Regex::with_flags(r"^abc$", "m").unwrap();
    /// assert_eq!(re.find("x\nabc\ny").unwrap().unwrap().range(), 2..5);
    /// ```
    #[inline]
    pub fn with_flags<F>(pattern: &str, flags: F) -> Result<Regex, Error>
    where
        F: Into<Flags>,
    {
        Self::compile(pattern, flags.into(), None)
    }

    /// Construct a regex whose searches fail with [`Error::MatchTimeout`]
    /// once they run longer than `timeout`.
    #[inline]
    pub fn with_timeout<F>(pattern: &str, flags: F, timeout: Duration) -> Result<Regex, Error>
    where
        F: Into<Flags>,
    {
        Self::compile(pattern, flags.into(), Some(timeout))
    }

    /// The pattern this regex was compiled from.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.cr.flags
    }

    /// The match timeout, or None if searches never time out.
    #[inline]
    pub fn match_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether this regex scans from right to left.
    #[inline]
    pub fn right_to_left(&self) -> bool {
        self.cr.flags.right_to_left
    }

    /// Where a search of `text` begins by default: its start, or its end
    /// when scanning right to left.
    fn default_start(&self, text: &str) -> usize {
        if self.right_to_left() {
            text.len()
        } else {
            0
        }
    }

    fn check_start(text: &str, start: usize) -> Result<(), Error> {
        if start > text.len() || !text.is_char_boundary(start) {
            return Err(Error::InvalidArgument(format!(
                "start offset {} is not a char boundary of text with length {}",
                start,
                text.len()
            )));
        }
        Ok(())
    }

    /// Whether the regex matches anywhere in `text`.
    #[inline]
    pub fn is_match(&self, text: &str) -> Result<bool, Error> {
        self.is_match_at(text, self.default_start(text))
    }

    /// Whether the regex matches `text`, searching from byte offset `start`.
    pub fn is_match_at(&self, text: &str, start: usize) -> Result<bool, Error> {
        Ok(self.find_at(text, start)?.is_some())
    }

    /// Searches `text` to find the first match.
    #[inline]
    pub fn find<'r, 't>(&'r self, text: &'t str) -> Result<Option<Match<'r, 't>>, Error> {
        exec::search(self, text, self.default_start(text))
    }

    /// Searches `text` from byte offset `start`. Note this differs from
    /// searching a sliced `text`: lookarounds and anchors see the whole text.
    ///
    /// ```rust
    /// use retrace::Regex;
    /// let re = Regex::new(r"(?<=x)y").unwrap();
    /// let m = re.find_at("xyxy", 1).unwrap().unwrap();
    /// assert_eq!(m.range(), 1..2);
    /// ```
    pub fn find_at<'r, 't>(
        &'r self,
        text: &'t str,
        start: usize,
    ) -> Result<Option<Match<'r, 't>>, Error> {
        Self::check_start(text, start)?;
        exec::search(self, text, start)
    }

    /// Searches `text`, returning an iterator over non-overlapping matches.
    /// Note that the resulting Iterator borrows both the regex `'r` and the
    /// input string as `'t`.
    #[inline]
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches::new(self, text, self.default_start(text))
    }

    /// Returns an iterator for matches found in `text` starting at byte
    /// offset `start`.
    pub fn find_iter_at<'r, 't>(&'r self, text: &'t str, start: usize) -> Result<Matches<'r, 't>, Error> {
        Self::check_start(text, start)?;
        Ok(Matches::new(self, text, start))
    }

    /// The compiled form of a template, reusing the last one if it matches.
    pub(crate) fn replacement_program(&self, template: &str) -> Arc<ReplacementProgram> {
        let mut cached = self
            .replacement
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((key, program)) = cached.as_ref() {
            if key == template {
                return program.clone();
            }
        }
        let program = Arc::new(ReplacementProgram::compile(
            template,
            &self.cr.groups,
            self.cr.flags.ecmascript,
        ));
        *cached = Some((template.to_string(), program.clone()));
        program
    }

    /// Replace up to `count` matches (all if negative), searching from
    /// `start`. Text outside the replaced matches is copied unchanged.
    fn replace_impl<F>(&self, text: &str, count: isize, start: usize, mut render: F) -> Result<String, Error>
    where
        F: FnMut(&Match, &mut String),
    {
        let mut remaining = match usize::try_from(count) {
            Ok(0) => return Ok(text.to_string()),
            Ok(count) => count,
            Err(_) => usize::MAX,
        };
        let matches = self.find_iter_at(text, start)?;
        if !self.right_to_left() {
            let mut out = String::with_capacity(text.len());
            let mut last = 0;
            for m in matches {
                let m = m?;
                out.push_str(&text[last..m.start()]);
                render(&m, &mut out);
                last = m.end();
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
            out.push_str(&text[last..]);
            return Ok(out);
        }

        // Matches arrive from the right; assemble the pieces in text order.
        let mut pieces: Vec<String> = Vec::new();
        let mut last = text.len();
        for m in matches {
            let m = m?;
            pieces.push(text[m.end()..last].to_string());
            let mut piece = String::new();
            render(&m, &mut piece);
            pieces.push(piece);
            last = m.start();
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
        pieces.push(text[..last].to_string());
        pieces.reverse();
        Ok(pieces.concat())
    }

    /// Replace the first match in `text` with the expansion of `template`.
    /// `$n`, `${n}` and `${name}` expand to groups; `$$` to a dollar sign;
    /// `$&` to the match; `` $` `` and `$'` to the text before and after it;
    /// `$+` to the last group; `$_` to the whole text.
    ///
    /// ```rust
    /// use retrace::Regex;
    /// let re = Regex::new(r"(\w+)@(\w+)").unwrap();
    /// assert_eq!(re.replace("user@host", "$2@$1").unwrap(), "host@user");
    /// ```
    #[inline]
    pub fn replace(&self, text: &str, template: &str) -> Result<String, Error> {
        self.replacen(text, template, 1, self.default_start(text))
    }

    /// Replace every match in `text` with the expansion of `template`.
    #[inline]
    pub fn replace_all(&self, text: &str, template: &str) -> Result<String, Error> {
        self.replacen(text, template, -1, self.default_start(text))
    }

    /// Replace up to `count` matches (every match if `count` is negative),
    /// searching from byte offset `start`.
    pub fn replacen(&self, text: &str, template: &str, count: isize, start: usize) -> Result<String, Error> {
        let program = self.replacement_program(template);
        match program.as_literal() {
            Some(literal) => {
                self.replace_impl(text, count, start, |_, out| out.push_str(literal))
            }
            None => self.replace_impl(text, count, start, |m, out| program.render_into(m, out)),
        }
    }

    /// Replace the first match with the string returned by `f`.
    #[inline]
    pub fn replace_with<F>(&self, text: &str, f: F) -> Result<String, Error>
    where
        F: FnMut(&Match) -> String,
    {
        self.replacen_with(text, f, 1, self.default_start(text))
    }

    /// Replace every match with the string returned by `f`.
    #[inline]
    pub fn replace_all_with<F>(&self, text: &str, f: F) -> Result<String, Error>
    where
        F: FnMut(&Match) -> String,
    {
        self.replacen_with(text, f, -1, self.default_start(text))
    }

    /// Replace up to `count` matches (every match if `count` is negative)
    /// with the string returned by `f`, searching from byte offset `start`.
    pub fn replacen_with<F>(&self, text: &str, mut f: F, count: isize, start: usize) -> Result<String, Error>
    where
        F: FnMut(&Match) -> String,
    {
        self.replace_impl(text, count, start, |m, out| out.push_str(&f(m)))
    }

    /// Split `text` around every match.
    ///
    /// ```rust
    /// use retrace::Regex;
    /// let re = Regex::new(r",\s*").unwrap();
    /// assert_eq!(re.split("a, b,c").unwrap(), vec!["a", "b", "c"]);
    /// ```
    #[inline]
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>, Error> {
        self.splitn(text, 0, self.default_start(text))
    }

    /// Split `text` into at most `count` pieces (no limit if 0), searching
    /// from byte offset `start`. The groups captured by each separator are
    /// included after the piece that precedes it. Pieces are returned in
    /// text order, also when scanning right to left.
    pub fn splitn<'t>(&self, text: &'t str, count: usize, start: usize) -> Result<Vec<&'t str>, Error> {
        if count == 1 {
            Self::check_start(text, start)?;
            return Ok(vec![text]);
        }
        let mut remaining = count.wrapping_sub(1);
        let matches = self.find_iter_at(text, start)?;
        let mut pieces = Vec::new();
        let rtl = self.right_to_left();
        let mut last = if rtl { text.len() } else { 0 };
        for m in matches {
            let m = m?;
            let groups = m.groups().skip(1).flatten().map(|g| &text[g.range()]);
            if rtl {
                pieces.push(&text[m.end()..last]);
                // Reversed below, which restores group order.
                let groups: Vec<&'t str> = groups.collect();
                pieces.extend(groups.into_iter().rev());
                last = m.start();
            } else {
                pieces.push(&text[last..m.start()]);
                pieces.extend(groups);
                last = m.end();
            }
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
        if rtl {
            pieces.push(&text[..last]);
            pieces.reverse();
        } else {
            pieces.push(&text[last..]);
        }
        Ok(pieces)
    }

    /// The name of every group in ascending order of group number. Unnamed
    /// groups are named by their number.
    pub fn group_names(&self) -> Vec<String> {
        let table = &self.cr.groups;
        (0..table.len()).map(|slot| table.display_name(slot)).collect()
    }

    /// Every group number in ascending order, including 0 for the whole
    /// match.
    pub fn group_numbers(&self) -> Vec<usize> {
        self.cr.groups.numbers.to_vec()
    }

    /// The number of the group with the given name. A name made of digits
    /// refers to the group with that number.
    pub fn group_number_from_name(&self, name: &str) -> Option<usize> {
        let table = &self.cr.groups;
        if let Some(slot) = table.slot_for_name(name) {
            return Some(table.numbers[slot]);
        }
        let number: usize = name.parse().ok()?;
        table.slot_for_number(number).map(|_| number)
    }

    /// The name of the group with the given number.
    pub fn group_name_from_number(&self, number: usize) -> Option<String> {
        let table = &self.cr.groups;
        table.slot_for_number(number).map(|slot| table.display_name(slot))
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    #[inline]
    fn from_str(s: &str) -> Result<Self, Error> {
        Self::new(s)
    }
}

/// A builder for a [`Regex`] with options beyond its flags.
///
/// ```rust
/// use retrace::RegexBuilder;
/// use std::time::Duration;
/// let re = RegexBuilder::new("hello")
///     .case_insensitive(true)
///     .match_timeout(Duration::from_secs(1))
///     .build()
///     .unwrap();
/// assert!(re.is_match("HeLLo").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    flags: Flags,
    timeout: Option<Duration>,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.to_string(),
            flags: Flags::default(),
            timeout: None,
        }
    }

    /// Replace every flag at once.
    pub fn flags(&mut self, flags: Flags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.flags.icase = yes;
        self
    }

    pub fn multiline(&mut self, yes: bool) -> &mut Self {
        self.flags.multiline = yes;
        self
    }

    pub fn explicit_capture(&mut self, yes: bool) -> &mut Self {
        self.flags.explicit_capture = yes;
        self
    }

    pub fn singleline(&mut self, yes: bool) -> &mut Self {
        self.flags.singleline = yes;
        self
    }

    pub fn ignore_whitespace(&mut self, yes: bool) -> &mut Self {
        self.flags.ignore_whitespace = yes;
        self
    }

    pub fn right_to_left(&mut self, yes: bool) -> &mut Self {
        self.flags.right_to_left = yes;
        self
    }

    pub fn ecmascript(&mut self, yes: bool) -> &mut Self {
        self.flags.ecmascript = yes;
        self
    }

    pub fn culture_invariant(&mut self, yes: bool) -> &mut Self {
        self.flags.culture_invariant = yes;
        self
    }

    /// Whether to run the IR optimizer. On by default.
    pub fn optimize(&mut self, yes: bool) -> &mut Self {
        self.flags.no_opt = !yes;
        self
    }

    /// Fail searches which run longer than `timeout`.
    pub fn match_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<Regex, Error> {
        Regex::compile(&self.pattern, self.flags, self.timeout)
    }
}
