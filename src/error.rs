use std::time::Duration;

/// The reason a pattern failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("not enough ')'s")]
    UnbalancedParenthesis,
    #[error("too many ')'s")]
    TooManyParentheses,
    #[error("unterminated [] set")]
    UnterminatedBracket,
    #[error("unterminated (?#...) comment")]
    UnterminatedComment,
    #[error("illegal {{x,y}} with x > y")]
    ReversedQuantifierRange,
    #[error("quantifier '{0}' following nothing")]
    QuantifierAfterNothing(char),
    #[error("nested quantifier '{0}'")]
    NestedQuantifier(char),
    #[error("invalid quantifier")]
    InvalidQuantifier,
    #[error("quantifier and capture group numbers must be less than or equal to {}", i32::MAX)]
    QuantifierOverflow,
    #[error("unrecognized escape sequence \\{0}")]
    UnrecognizedEscape(char),
    #[error("illegal \\ at end of pattern")]
    IllegalEndEscape,
    #[error("missing control character")]
    MissingControlCharacter,
    #[error("unrecognized control character")]
    UnrecognizedControlCharacter,
    #[error("insufficient hex digits")]
    InsufficientHexDigits,
    #[error("incomplete \\p{{X}} character escape")]
    InvalidUnicodePropertyEscape,
    #[error("unknown property '{0}'")]
    UnknownUnicodeProperty(String),
    #[error("malformed \\p{{X}} character escape")]
    MalformedUnicodePropertyEscape,
    #[error("[x-y] range in reverse order")]
    ReversedCharacterRange,
    #[error("cannot include class \\{0} in character range")]
    ShorthandClassInRange(char),
    #[error("a subtraction must be the last element in a character class")]
    SubtractionMustBeLast,
    #[error("reference to undefined group number {0}")]
    UndefinedNumberedReference(usize),
    #[error("reference to undefined group name '{0}'")]
    UndefinedNamedReference(String),
    #[error("malformed \\k<...> named back reference")]
    MalformedNamedReference,
    #[error("invalid group name: group names must begin with a word character")]
    InvalidGroupName,
    #[error("capture number cannot be zero")]
    CaptureGroupNumberZero,
    #[error("reference to undefined group '{0}' in balancing group")]
    UndefinedGroupInBalancing(String),
    #[error("unrecognized grouping construct")]
    InvalidGroupModifier,
    #[error("too many | in (?()|)")]
    AlternationHasTooManyConditions,
    #[error("illegal conditional (?(...)) expression")]
    AlternationHasMalformedCondition,
    #[error("conditional alternation refers to a malformed group reference")]
    AlternationHasMalformedReference,
    #[error("conditional alternation refers to an undefined group number {0}")]
    AlternationHasUndefinedReference(usize),
    #[error("alternation conditions do not capture and cannot be named")]
    AlternationHasNamedCapture,
    #[error("alternation conditions cannot be comments")]
    AlternationHasComment,
    #[error("option is not supported in ECMAScript mode")]
    InvalidOptionForEcmaScript,
    #[error("pattern nesting is too deep")]
    PatternTooDeep,
    #[error("capture group limit exceeded")]
    CaptureGroupLimitExceeded,
    #[error("loop limit exceeded")]
    LoopLimitExceeded,
}

/// A pattern syntax error, with the byte offset of the offending character.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

/// Errors produced while building or running a regex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The pattern (or an escaped string) could not be parsed.
    #[error("invalid pattern: {0}")]
    Parse(#[from] ParseError),

    /// A scan exceeded the configured match timeout.
    #[error("match of pattern '{pattern}' against input of {input_len} bytes timed out after {timeout:?}")]
    MatchTimeout {
        pattern: String,
        input_len: usize,
        timeout: Duration,
    },

    /// An argument was out of range or an option combination was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// \return the parse error kind, if this is a parse error.
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match self {
            Error::Parse(pe) => Some(&pe.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offset() {
        let err = ParseError {
            kind: ParseErrorKind::UnterminatedBracket,
            offset: 3,
        };
        assert_eq!(err.to_string(), "unterminated [] set at offset 3");
        let err: Error = err.into();
        assert_eq!(
            err.parse_kind(),
            Some(&ParseErrorKind::UnterminatedBracket)
        );
    }
}
