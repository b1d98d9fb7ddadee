//! Unicode classification helpers used by the lexer.
//!
//! Identifier start/continue tests follow the `ID_Start`/`ID_Continue`
//! properties referenced by the ECMAScript `IdentifierName` grammar, with the
//! usual `$` and `_` extensions.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Returns `true` if `c` may begin an `IdentifierName`.
pub fn is_id_start(c: char) -> bool {
    if c == '$' || c == '_' {
        return true;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::LetterNumber
    )
}

/// Returns `true` if `c` may continue an `IdentifierName` after its first
/// character.
pub fn is_id_continue(c: char) -> bool {
    if c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' {
        return true;
    }
    if is_id_start(c) {
        return true;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::DecimalNumber
            | GeneralCategory::ConnectorPunctuation
    )
}

/// Returns `true` if `c` is one of the characters the spec treats as
/// `WhiteSpace`.
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{FEFF}'
    ) || get_general_category(c) == GeneralCategory::SpaceSeparator
}

/// Returns `true` if `c` is one of the characters the spec treats as
/// `LineTerminator`.
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\u{000A}' | '\u{000D}' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_identifiers() {
        assert!(is_id_start('a'));
        assert!(is_id_start('_'));
        assert!(is_id_start('$'));
        assert!(!is_id_start('1'));
        assert!(is_id_continue('1'));
    }

    #[test]
    fn whitespace_and_terminators() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace('\u{00A0}'));
        assert!(is_line_terminator('\n'));
        assert!(!is_whitespace('\n'));
    }
}
