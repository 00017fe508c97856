//! Escaping text for use in patterns, and resolving escapes in text.

use crate::error::Error;
use crate::parse;

/// \return the escape for a char that is special in patterns, if any.
fn escape_for(c: char) -> Option<&'static str> {
    Some(match c {
        '\\' => r"\\",
        '*' => r"\*",
        '+' => r"\+",
        '?' => r"\?",
        '|' => r"\|",
        '{' => r"\{",
        '[' => r"\[",
        '(' => r"\(",
        ')' => r"\)",
        '^' => r"\^",
        '$' => r"\$",
        '.' => r"\.",
        '#' => r"\#",
        ' ' => r"\ ",
        '\t' => r"\t",
        '\n' => r"\n",
        '\u{c}' => r"\f",
        '\r' => r"\r",
        _ => return None,
    })
}

/// Escape the metacharacters and whitespace in `text`, so that a pattern
/// made from the result matches `text` literally, even in `x` mode.
///
/// ```rust
/// assert_eq!(retrace::escape("1+1=2?"), r"1\+1=2\?");
/// ```
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match escape_for(c) {
            Some(escaped) => result.push_str(escaped),
            None => result.push(c),
        }
    }
    result
}

/// Resolve every escape sequence in `text`, as it would be read inside a
/// character class.
///
/// ```rust
/// assert_eq!(retrace::unescape(r"\x41\t\(").unwrap(), "A\t(");
/// ```
pub fn unescape(text: &str) -> Result<String, Error> {
    if !text.contains('\\') {
        return Ok(text.to_string());
    }
    Ok(parse::unescape(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(escape(r"a.b*c"), r"a\.b\*c");
        assert_eq!(escape("(x|y) {2}"), r"\(x\|y\)\ \{2}");
        assert_eq!(escape("tab\there\n"), r"tab\there\n");
        assert_eq!(escape("# ]}"), r"\#\ ]}");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn unescape_round_trips() {
        for text in [r"\*+?|{[()^$.#", " \t\n\x0c\r", "mixed. text (1)"] {
            assert_eq!(unescape(&escape(text)).expect("should unescape"), text);
        }
    }

    #[test]
    fn unescape_forms() {
        assert_eq!(unescape(r"A\x42\103\cA").expect("should unescape"), "ABC\u{1}");
        assert_eq!(unescape(r"\a\e\v").expect("should unescape"), "\u{7}\u{1b}\u{b}");
        let err = unescape(r"abc\").expect_err("trailing backslash");
        assert_eq!(err.parse_kind(), Some(&ParseErrorKind::IllegalEndEscape));
    }
}
