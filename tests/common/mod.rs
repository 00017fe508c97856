#![allow(clippy::uninlined_format_args)]

use std::ops::Range;
use std::time::Duration;

/// Test that \p pattern fails to parse with default flags.
pub fn test_parse_fails(pattern: &str) {
    let res = retrace::Regex::new(pattern);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

/// Test that \p pattern fails to parse with flags.
pub fn test_parse_fails_flags(pattern: &str, flags: &str) {
    let res = retrace::Regex::with_flags(pattern, flags);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

/// Format a Match by inserting commas between all capture groups.
/// Groups which did not participate are empty.
fn format_match(m: &retrace::Match) -> String {
    let mut result = m.as_str().to_string();
    for group in m.groups().skip(1) {
        result.push(',');
        if let Some(group) = group {
            result.push_str(group.as_str())
        }
    }
    result
}

pub trait StringTestHelpers {
    /// "Fluent" style helper for testing that a String is equal to a str.
    fn test_eq(&self, s: &str);
}

impl StringTestHelpers for String {
    #[track_caller]
    fn test_eq(&self, rhs: &str) {
        assert_eq!(self.as_str(), rhs)
    }
}

pub trait VecTestHelpers {
    /// "Fluent" style helper for testing that a Vec<&str> is equal to a
    /// Vec<&str>.
    fn test_eq(&self, rhs: Vec<&str>);
}

impl VecTestHelpers for Vec<&str> {
    #[track_caller]
    fn test_eq(&self, rhs: Vec<&str>) {
        assert_eq!(*self, rhs)
    }
}

/// A compiled regex which remembers a TestConfig.
#[derive(Debug, Clone)]
pub struct TestCompiledRegex {
    re: retrace::Regex,
    tc: TestConfig,
}

impl TestCompiledRegex {
    /// The underlying regex.
    pub fn re(&self) -> &retrace::Regex {
        &self.re
    }

    /// Search for self in \p input, returning a list of all matches.
    #[track_caller]
    pub fn matches<'b>(&self, input: &'b str, start: usize) -> Vec<retrace::Match<'_, 'b>> {
        self.re
            .find_iter_at(input, start)
            .and_then(|matches| matches.collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|err| panic!("Search failed with config {:?}: {}", self.tc, err))
    }

    /// Search for self in \p input, returning the first Match, or None if
    /// none.
    #[track_caller]
    pub fn find<'b>(&self, input: &'b str) -> Option<retrace::Match<'_, 'b>> {
        self.re
            .find(input)
            .unwrap_or_else(|err| panic!("Search failed with config {:?}: {}", self.tc, err))
    }

    /// Match against a string, returning the first formatted match.
    #[track_caller]
    pub fn match1f(&self, input: &str) -> String {
        match self.find(input) {
            Some(m) => format_match(&m),
            None => panic!("Failed to match {}", input),
        }
    }

    /// Match against a string, returning the string of the named capture group given.
    #[track_caller]
    pub fn match1_named_group(&self, input: &str, group: &str) -> String {
        match self.find(input) {
            Some(m) => match m.name(group) {
                Some(g) => g.as_str().to_string(),
                None => panic!("Named capture group did not match {}", group),
            },
            None => panic!("Failed to match {}", input),
        }
    }

    /// Match against a string, returning the match as a Vec containing None
    /// for unmatched groups, or the matched strings.
    #[track_caller]
    pub fn match1_vec<'b>(&self, input: &'b str) -> Vec<Option<&'b str>> {
        let m = self.find(input).expect("Failed to match");
        m.groups().map(|g| g.map(|g| &input[g.range()])).collect()
    }

    /// Test that matching against \p input fails.
    #[track_caller]
    pub fn test_fails(&self, input: &str) {
        assert!(
            self.find(input).is_none(),
            "Should not have matched {} with config {:?}",
            input,
            self.tc
        )
    }

    /// Test that matching against \p input succeeds.
    #[track_caller]
    pub fn test_succeeds(&self, input: &str) {
        assert!(
            self.find(input).is_some(),
            "Should have matched {} with config {:?}",
            input,
            self.tc
        )
    }

    /// Return a list of all non-overlapping total match ranges from a given
    /// start.
    #[track_caller]
    pub fn match_all_from(&self, input: &str, start: usize) -> Vec<Range<usize>> {
        self.matches(input, start)
            .into_iter()
            .map(|m| m.range())
            .collect()
    }

    /// Return a list of all non-overlapping matches.
    #[track_caller]
    pub fn match_all<'b>(&self, input: &'b str) -> Vec<&'b str> {
        self.re
            .find_iter(input)
            .map(|m| m.map(|m| m.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|err| panic!("Search failed with config {:?}: {}", self.tc, err))
    }

    /// Collect all matches into a String, separated by commas.
    #[track_caller]
    pub fn run_global_match(&self, input: &str) -> String {
        let start = if self.re.right_to_left() { input.len() } else { 0 };
        self.matches(input, start)
            .iter()
            .map(format_match)
            .collect::<Vec<String>>()
            .join(",")
    }

    /// Replace every match with a template.
    #[track_caller]
    pub fn replace_all(&self, input: &str, template: &str) -> String {
        self.re
            .replace_all(input, template)
            .unwrap_or_else(|err| panic!("Replace failed with config {:?}: {}", self.tc, err))
    }

    /// Split around every match.
    #[track_caller]
    pub fn split<'b>(&self, input: &'b str) -> Vec<&'b str> {
        self.re
            .split(input)
            .unwrap_or_else(|err| panic!("Split failed with config {:?}: {}", self.tc, err))
    }
}

/// Description of how to test a regex.
#[derive(Debug, Copy, Clone)]
pub struct TestConfig {
    // Whether to optimize.
    optimize: bool,

    // Whether to run with a (generous) match timeout, which exercises the
    // deadline checks without firing.
    timeout: bool,
}

impl TestConfig {
    /// Compile a pattern to a regex, with default flags.
    #[track_caller]
    pub fn compile(&self, pattern: &str) -> TestCompiledRegex {
        self.compilef(pattern, "")
    }

    /// Compile a pattern to a regex, with given flags.
    #[track_caller]
    pub fn compilef(&self, pattern: &str, flags_str: &str) -> TestCompiledRegex {
        let mut flags = retrace::Flags::from(flags_str);
        flags.no_opt = !self.optimize;

        let mut builder = retrace::RegexBuilder::new(pattern);
        builder.flags(flags);
        if self.timeout {
            builder.match_timeout(Duration::from_secs(60));
        }
        match builder.build() {
            Ok(re) => TestCompiledRegex { re, tc: *self },
            Err(err) => panic!(
                "Failed to parse! flags: {} pattern: {}, error: {}",
                flags_str, pattern, err
            ),
        }
    }

    /// Test that \p pattern and \p flags successfully parses, and matches
    /// \p input.
    #[track_caller]
    pub fn test_match_succeeds(&self, pattern: &str, flags_str: &str, input: &str) {
        let cr = self.compilef(pattern, flags_str);
        cr.test_succeeds(input)
    }

    /// Test that \p pattern and \p flags successfully parses, and does not
    /// match \p input.
    #[track_caller]
    pub fn test_match_fails(&self, pattern: &str, flags_str: &str, input: &str) {
        let cr = self.compilef(pattern, flags_str);
        cr.test_fails(input)
    }
}

/// Invoke \p F with each test config, in turn.
pub fn test_with_configs<F>(func: F)
where
    F: Fn(TestConfig),
{
    // Note we wish to be able to determine the TestConfig from the line number.
    func(TestConfig {
        optimize: false,
        timeout: false,
    });
    func(TestConfig {
        optimize: true,
        timeout: false,
    });
    func(TestConfig {
        optimize: false,
        timeout: true,
    });
    func(TestConfig {
        optimize: true,
        timeout: true,
    });
}
