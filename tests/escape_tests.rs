#![allow(clippy::uninlined_format_args)]

use retrace::{escape, unescape, ParseErrorKind, Regex};

#[test]
fn test_escape_basic() {
    assert_eq!(escape("hello"), "hello");
    assert_eq!(escape(""), "");
    assert_eq!(escape("abc123"), "abc123");
    assert_eq!(escape("héllo wörld"), r"héllo\ wörld");
}

#[test]
fn test_escape_special_characters() {
    assert_eq!(escape("\\"), "\\\\");
    assert_eq!(escape("^"), "\\^");
    assert_eq!(escape("$"), "\\$");
    assert_eq!(escape("."), "\\.");
    assert_eq!(escape("|"), "\\|");
    assert_eq!(escape("?"), "\\?");
    assert_eq!(escape("*"), "\\*");
    assert_eq!(escape("+"), "\\+");
    assert_eq!(escape("("), "\\(");
    assert_eq!(escape(")"), "\\)");
    assert_eq!(escape("["), "\\[");
    assert_eq!(escape("{"), "\\{");
    assert_eq!(escape("#"), "\\#");
    // Closing brackets and braces are only special after an opener.
    assert_eq!(escape("]"), "]");
    assert_eq!(escape("}"), "}");
}

#[test]
fn test_escape_whitespace() {
    assert_eq!(escape(" "), "\\ ");
    assert_eq!(escape("\t"), "\\t");
    assert_eq!(escape("\n"), "\\n");
    assert_eq!(escape("\r"), "\\r");
    assert_eq!(escape("\x0C"), "\\f");
    // Other whitespace is left alone.
    assert_eq!(escape("\u{A0}"), "\u{A0}");
}

#[test]
fn test_escaped_text_matches_literally() {
    let texts = [
        "1+1=2",
        "(a|b)*",
        "[x]{2,3}",
        "$5.00 ^^",
        "# not a comment",
        "tab\tand\nnewline",
        "back\\slash",
    ];
    for text in texts {
        for flags in ["", "x", "i", "r"] {
            let re = Regex::with_flags(&escape(text), flags).unwrap();
            let haystack = format!("<{}>", text);
            let m = re
                .find(&haystack)
                .unwrap()
                .unwrap_or_else(|| panic!("{:?} did not match with flags {:?}", text, flags));
            assert_eq!(m.as_str(), text);
            assert_eq!(m.start(), 1);
        }
    }
}

#[test]
fn test_unescape() {
    assert_eq!(unescape("plain").unwrap(), "plain");
    assert_eq!(unescape(r"\(a\)\.\*").unwrap(), "(a).*");
    assert_eq!(unescape(r"\t\n\r\f\v\a\e").unwrap(), "\t\n\r\x0C\x0B\x07\x1B");
    assert_eq!(unescape(r"\x41é\101").unwrap(), "AéA");
    assert_eq!(unescape(r"\cJ").unwrap(), "\n");
    assert_eq!(unescape(r"\ ").unwrap(), " ");
}

#[test]
fn test_unescape_round_trip() {
    for text in ["a.b", "(x|y) {2}", "$^#", "\t\r\n", "é✓"] {
        assert_eq!(unescape(&escape(text)).unwrap(), text);
    }
}

#[test]
fn test_unescape_errors() {
    let err = unescape("abc\\").unwrap_err();
    assert_eq!(err.parse_kind(), Some(&ParseErrorKind::IllegalEndEscape));
    let err = unescape(r"\x4").unwrap_err();
    assert_eq!(err.parse_kind(), Some(&ParseErrorKind::InsufficientHexDigits));
    let err = unescape(r"\w").unwrap_err();
    assert_eq!(err.parse_kind(), Some(&ParseErrorKind::UnrecognizedEscape('w')));
}
