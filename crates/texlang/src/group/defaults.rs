//! Default values of the character-indexed categories.
//!
//! These are the values a character has when no group binds it.
//! They follow the initialization in TeX.2021.232, where "letter" means an ASCII letter.

use crate::types::{CatCode, DelCode, MathClass, MathCode};

pub fn cat_code(c: char) -> CatCode {
    match c {
        'a'..='z' | 'A'..='Z' => CatCode::Letter,
        ' ' => CatCode::Space,
        '\\' => CatCode::Escape,
        '\r' => CatCode::EndOfLine,
        '%' => CatCode::Comment,
        '\u{0}' => CatCode::Ignored,
        '\u{7F}' => CatCode::Invalid,
        _ => CatCode::Other,
    }
}

pub fn sf_code(c: char) -> u16 {
    if c.is_ascii_alphabetic() {
        999
    } else {
        1000
    }
}

/// For characters beyond 255 the position is truncated to 8 bits.
pub fn math_code(c: char) -> MathCode {
    let position = c as u32 as u8;
    match c {
        '0'..='9' => MathCode::new(MathClass::Variable, 0, position),
        'a'..='z' | 'A'..='Z' => MathCode::new(MathClass::Variable, 1, position),
        _ => MathCode::new(MathClass::Ordinary, 0, position),
    }
}

pub fn lc_code(c: char) -> Option<char> {
    if c.is_ascii_alphabetic() {
        Some(c.to_ascii_lowercase())
    } else {
        None
    }
}

pub fn uc_code(c: char) -> Option<char> {
    if c.is_ascii_alphabetic() {
        Some(c.to_ascii_uppercase())
    } else {
        None
    }
}

pub fn del_code(c: char) -> Option<DelCode> {
    match c {
        '.' => Some(DelCode::NULL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_codes() {
        assert_eq!(cat_code('q'), CatCode::Letter);
        assert_eq!(cat_code('Q'), CatCode::Letter);
        assert_eq!(cat_code(' '), CatCode::Space);
        assert_eq!(cat_code('\\'), CatCode::Escape);
        assert_eq!(cat_code('\r'), CatCode::EndOfLine);
        assert_eq!(cat_code('%'), CatCode::Comment);
        assert_eq!(cat_code('\u{0}'), CatCode::Ignored);
        assert_eq!(cat_code('\u{7F}'), CatCode::Invalid);
        assert_eq!(cat_code('{'), CatCode::Other);
        assert_eq!(cat_code('ä'), CatCode::Other);
    }

    #[test]
    fn math_codes() {
        assert_eq!(math_code('7'), MathCode(0x7037));
        assert_eq!(math_code('b'), MathCode(0x7162));
        assert_eq!(math_code('+'), MathCode(0x002B));
        assert_eq!(math_code('+').class(), MathClass::Ordinary);
    }

    #[test]
    fn case_codes() {
        assert_eq!(lc_code('A'), Some('a'));
        assert_eq!(lc_code('a'), Some('a'));
        assert_eq!(uc_code('a'), Some('A'));
        assert_eq!(uc_code('1'), None);
    }

    #[test]
    fn other_codes() {
        assert_eq!(sf_code('x'), 999);
        assert_eq!(sf_code('X'), 999);
        assert_eq!(sf_code('.'), 1000);
        assert_eq!(del_code('.'), Some(DelCode::NULL));
        assert_eq!(del_code('('), None);
    }
}
