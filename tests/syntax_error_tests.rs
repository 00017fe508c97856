#![allow(clippy::uninlined_format_args)]

use retrace::{Error, ParseErrorKind, Regex};

#[track_caller]
fn test_1_error(pattern: &str, expected: ParseErrorKind) {
    test_1_error_flags(pattern, "", expected)
}

#[track_caller]
fn test_1_error_flags(pattern: &str, flags: &str, expected: ParseErrorKind) {
    let res = Regex::with_flags(pattern, flags);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);

    let err = res.err().unwrap();
    assert_eq!(
        err.parse_kind(),
        Some(&expected),
        "Wrong error '{}' for pattern '{}'",
        err,
        pattern
    );
}

#[test]
fn test_excessive_capture_groups() {
    let mut captures = String::from("s");
    for _ in 0..70_000 {
        captures.push_str("(x)");
    }
    test_1_error(&captures, ParseErrorKind::CaptureGroupLimitExceeded);
}

#[test]
fn test_quantifier_errors() {
    test_1_error("*", ParseErrorKind::QuantifierAfterNothing('*'));
    test_1_error("?", ParseErrorKind::QuantifierAfterNothing('?'));
    test_1_error("a|*", ParseErrorKind::QuantifierAfterNothing('*'));
    test_1_error("(+)", ParseErrorKind::QuantifierAfterNothing('+'));
    test_1_error("x**", ParseErrorKind::NestedQuantifier('*'));
    test_1_error("x+?+", ParseErrorKind::NestedQuantifier('+'));
    test_1_error("x{2}{3}", ParseErrorKind::NestedQuantifier('{'));
    test_1_error("x{5,3}", ParseErrorKind::ReversedQuantifierRange);
    test_1_error("x{2147483648}", ParseErrorKind::QuantifierOverflow);
}

#[test]
fn test_grouping_errors() {
    test_1_error("(", ParseErrorKind::UnbalancedParenthesis);
    test_1_error("(?!", ParseErrorKind::UnbalancedParenthesis);
    test_1_error("(a(b)", ParseErrorKind::UnbalancedParenthesis);
    test_1_error("abc)", ParseErrorKind::TooManyParentheses);
    test_1_error("(?a)", ParseErrorKind::InvalidGroupModifier);
    test_1_error("(?<>a)", ParseErrorKind::InvalidGroupName);
    test_1_error("(?<0>a)", ParseErrorKind::CaptureGroupNumberZero);
    test_1_error(
        "(?<a-b>x)",
        ParseErrorKind::UndefinedGroupInBalancing("b".to_string()),
    );
    test_1_error("(?#abc", ParseErrorKind::UnterminatedComment);
}

#[test]
fn test_class_errors() {
    test_1_error("[abc", ParseErrorKind::UnterminatedBracket);
    test_1_error("[]", ParseErrorKind::UnterminatedBracket);
    test_1_error("[z-a]", ParseErrorKind::ReversedCharacterRange);
    test_1_error(r"[a-\s]", ParseErrorKind::ShorthandClassInRange('s'));
    test_1_error("[a-z-[b]c]", ParseErrorKind::SubtractionMustBeLast);
    test_1_error(r"\p{Foo}", ParseErrorKind::UnknownUnicodeProperty("Foo".to_string()));
    test_1_error(r"\p", ParseErrorKind::InvalidUnicodePropertyEscape);
}

#[test]
fn test_escape_errors() {
    test_1_error("\\", ParseErrorKind::IllegalEndEscape);
    test_1_error(r"\q", ParseErrorKind::UnrecognizedEscape('q'));
    test_1_error(r"\x4", ParseErrorKind::InsufficientHexDigits);
    test_1_error(r"\u12", ParseErrorKind::InsufficientHexDigits);
    test_1_error(r"\c", ParseErrorKind::MissingControlCharacter);
    test_1_error(r"\uD800", ParseErrorKind::UnrecognizedEscape('u'));
}

#[test]
fn test_reference_errors() {
    test_1_error(r"\2(a)", ParseErrorKind::UndefinedNumberedReference(2));
    test_1_error(r"\k<nope>", ParseErrorKind::UndefinedNamedReference("nope".to_string()));
    test_1_error(r"\k", ParseErrorKind::MalformedNamedReference);
    test_1_error(r"\k<3>(a)", ParseErrorKind::UndefinedNumberedReference(3));
}

#[test]
fn test_conditional_errors() {
    test_1_error("(a)(?(1)a|b|c)", ParseErrorKind::AlternationHasTooManyConditions);
    test_1_error("(?(?#x)a)", ParseErrorKind::AlternationHasComment);
    test_1_error("(?(?<n>a)b)", ParseErrorKind::AlternationHasNamedCapture);
    test_1_error("(?(2)a|b)", ParseErrorKind::AlternationHasUndefinedReference(2));
}

#[test]
fn test_ecmascript_errors() {
    test_1_error_flags("(?s:a)", "e", ParseErrorKind::InvalidOptionForEcmaScript);
    test_1_error_flags("(?x)a", "e", ParseErrorKind::InvalidOptionForEcmaScript);
    // \q is an identity escape in ECMAScript mode.
    assert!(Regex::with_flags(r"\q", "e").is_ok());
}

#[test]
fn test_error_offsets() {
    let err = Regex::new("ab(c").expect_err("should fail");
    match err {
        Error::Parse(pe) => {
            assert_eq!(pe.kind, ParseErrorKind::UnbalancedParenthesis);
            assert_eq!(pe.offset, 4);
        }
        other => panic!("unexpected error {}", other),
    }
    let err = Regex::new("[a").expect_err("should fail");
    assert!(err.to_string().contains("unterminated [] set"), "{}", err);
}

#[test]
fn test_bad_arguments() {
    assert!(matches!(
        Regex::with_flags("a", "es"),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        Regex::with_timeout("a", "", std::time::Duration::ZERO),
        Err(Error::InvalidArgument(_))
    ));
}
