//! Table-driven pattern corpus, run under every TestConfig.

// Work around dead code warnings: rust-lang issue #46379
pub mod common;

// Work around dead code warnings: rust-lang issue #46379
use common::*;

/// Pattern, flags, input, and the formatted first match (or None if the
/// pattern must not match).
type Case = (&'static str, &'static str, &'static str, Option<&'static str>);

#[track_caller]
fn run_cases(tc: TestConfig, cases: &[Case]) {
    for &(pattern, flags, input, expected) in cases {
        let re = tc.compilef(pattern, flags);
        match expected {
            Some(expected) => assert_eq!(
                re.match1f(input),
                expected,
                "pattern {:?} flags {:?} input {:?} config {:?}",
                pattern,
                flags,
                input,
                tc
            ),
            None => re.test_fails(input),
        }
    }
}

const EMPTY_BRANCHES: &[Case] = &[
    ("(a|)b", "", "ab", Some("ab,a")),
    ("(|a)b", "", "ab", Some("ab,a")),
    ("(a|)b", "", "xb", Some("b,")),
    ("(?:x|)b", "", "xb", Some("xb")),
    ("(?:|x)y", "", "xy", Some("xy")),
    ("(?:a|b|)c", "", "bc", Some("bc")),
    ("(?:a|b|)c", "", "xc", Some("c")),
    ("(?:a|b|)+c", "", "abc", Some("abc")),
    ("x(?:y|)z", "", "xz", Some("xz")),
    ("x(?:y|)z", "", "xyz", Some("xyz")),
    ("(?:ab|)ab", "", "ab", Some("ab")),
    ("(?:ab|)ab", "", "abab", Some("abab")),
    ("(?:ab|)ab", "", "xab", Some("ab")),
    ("(?:cat|dog|)s", "", "my dogs", Some("dogs")),
    ("(?:cat|dog|)s", "", "is", Some("s")),
];

const ZERO_WIDTH_BRANCHES: &[Case] = &[
    (r"(?:ab|(?=z))c", "", "abc", Some("abc")),
    (r"(?:ab|(?=z))c", "", "zc", None),
    (r"(?:ab|(?=c))c", "", "xc", Some("c")),
    (r"(?:a|(?<=x))b", "", "xb", Some("b")),
    (r"(?:a|(?<=x))b", "", "yb", None),
    (r"(?:a|(?!y))b", "", "yb", Some("b")),
    (r"(?:a|\b)x", "", "ax", Some("ax")),
    (r"(?:a|\b)x", "", "yx", None),
    (r"(?:^|,)(\w+)", "", "a,b", Some("a,a")),
    (r"(?:^|,)(\w+)", "", ",b", Some(",b,b")),
    (r"(?:\s|^)#(\w+)", "", "x #tag", Some(" #tag,tag")),
    (r"(?:$|x)", "", "abc", Some("")),
    (r"(?:\d|$)", "", "ab", Some("")),
    (r"(?:\d|\z)!", "", "a!", None),
    (r"(?:\d|\G)a", "", "ba", None),
];

const OPTIONAL_PREFIXES: &[Case] = &[
    ("(a)?b", "", "b", Some("b,")),
    ("(a)?b", "", "ab", Some("ab,a")),
    ("(a)?b", "", "xab", Some("ab,a")),
    ("(?:ab)?c", "", "abc", Some("abc")),
    ("(?:ab)?c", "", "bc", Some("c")),
    ("(?:ab)?c", "", "xc", Some("c")),
    ("a?b?c", "", "bc", Some("bc")),
    ("a*b", "", "b", Some("b")),
    ("(?:a{2})?b", "", "ab", Some("b")),
    ("(x)??y", "", "xy", Some("xy,x")),
    ("(?:foo)?bar", "", "foobar", Some("foobar")),
    ("(?:foo)?bar", "", "fobar", Some("bar")),
    ("(?:foo)*bar", "i", "FOOfooBAR", Some("FOOfooBAR")),
    ("[+-]?\\d+", "", "x-12", Some("-12")),
    ("(a)?(?(1)b|c)", "", "c", Some("c,")),
    ("(a)?(?(1)b|c)", "", "ab", Some("ab,a")),
    ("(a)?(?(1)b|c)", "", "ac", Some("c,")),
];

const RIGHT_TO_LEFT: &[Case] = &[
    ("b(a|)", "r", "ba", Some("ba,a")),
    ("b(a|)", "r", "bx", Some("b,")),
    ("b(?:x|)", "r", "bx", Some("bx")),
    ("c(?:ba|(?<=z))", "r", "cba", Some("cba")),
    ("c(?:ba|(?=z))", "r", "zcz", Some("c")),
    ("b(a)?", "r", "b", Some("b,")),
    ("b(a)?", "r", "xba", Some("ba,a")),
    ("(?:ab)?c", "r", "abc", Some("abc")),
    ("c(?:ab)?", "r", "cab", Some("cab")),
    ("a(?:b|$)", "r", "ab a", Some("a")),
    ("(?:^|x)a", "r", "xaa", Some("xa")),
    (r"\d+(?:px|)", "r", "10px 20", Some("20")),
    (r"\d+(?:px|)", "r", "10px", Some("10px")),
    (r"(\w+)(?:,|$)", "r", "a,bc", Some("bc,bc")),
];

const GENERAL: &[Case] = &[
    ("colou?r", "", "color", Some("color")),
    (r"(\w+)\s+\1", "", "hello hello world", Some("hello hello,hello")),
    ("straße", "i", "STRASSE", None),
    ("[^aeiou]+", "", "aaxyz", Some("xyz")),
    ("a.c", "s", "a\nc", Some("a\nc")),
    ("a.c", "", "a\nc", None),
    (r"\bcat\b", "", "concat cat", Some("cat")),
    (r#"(?<q>['"]).*?\k<q>"#, "", "say 'hi' now", Some("'hi','")),
    ("(?>a+)b", "", "aaab", Some("aaab")),
    ("(?>a+)a", "", "aaa", None),
    (r"(\d+)-(\d+)", "", "tel 12-345", Some("12-345,12,345")),
    ("x*", "", "", Some("")),
    ("[a-z-[aeiou]]+", "", "bcdae", Some("bcd")),
];

fn empty_branches_tc(tc: TestConfig) {
    run_cases(tc, EMPTY_BRANCHES)
}

#[test]
fn empty_branches() {
    test_with_configs(empty_branches_tc)
}

fn zero_width_branches_tc(tc: TestConfig) {
    run_cases(tc, ZERO_WIDTH_BRANCHES)
}

#[test]
fn zero_width_branches() {
    test_with_configs(zero_width_branches_tc)
}

fn optional_prefixes_tc(tc: TestConfig) {
    run_cases(tc, OPTIONAL_PREFIXES)
}

#[test]
fn optional_prefixes() {
    test_with_configs(optional_prefixes_tc)
}

fn right_to_left_tc(tc: TestConfig) {
    run_cases(tc, RIGHT_TO_LEFT)
}

#[test]
fn right_to_left() {
    test_with_configs(right_to_left_tc)
}

fn general_tc(tc: TestConfig) {
    run_cases(tc, GENERAL)
}

#[test]
fn general() {
    test_with_configs(general_tc)
}
