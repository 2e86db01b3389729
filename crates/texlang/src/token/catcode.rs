use std::fmt;

/// A category code, as defined in chapter 7 of the TeXBook.
///
/// The category code of a character determines how the lexer treats it.
/// Codes 0, 5, 9, 14 and 15 are "raw": the lexer consumes them and
///     they never appear on a [Token](super::Token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CatCode {
    Escape = 0,
    BeginGroup = 1,
    EndGroup = 2,
    MathShift = 3,
    AlignmentTab = 4,
    EndOfLine = 5,
    Parameter = 6,
    Superscript = 7,
    Subscript = 8,
    Ignored = 9,
    Space = 10,
    Letter = 11,
    #[default]
    Other = 12,
    Active = 13,
    Comment = 14,
    Invalid = 15,
}

impl CatCode {
    /// All category codes in numerical order.
    pub const ALL: [CatCode; 16] = [
        CatCode::Escape,
        CatCode::BeginGroup,
        CatCode::EndGroup,
        CatCode::MathShift,
        CatCode::AlignmentTab,
        CatCode::EndOfLine,
        CatCode::Parameter,
        CatCode::Superscript,
        CatCode::Subscript,
        CatCode::Ignored,
        CatCode::Space,
        CatCode::Letter,
        CatCode::Other,
        CatCode::Active,
        CatCode::Comment,
        CatCode::Invalid,
    ];

    /// The special characters plain TeX assigns category codes to, beyond the INITEX defaults.
    ///
    /// The group chain defaults follow INITEX, so `{` is an other character until
    ///     these codes are installed.
    pub const PLAIN_TEX_SPECIALS: [(char, CatCode); 8] = [
        ('{', CatCode::BeginGroup),
        ('}', CatCode::EndGroup),
        ('$', CatCode::MathShift),
        ('&', CatCode::AlignmentTab),
        ('#', CatCode::Parameter),
        ('^', CatCode::Superscript),
        ('_', CatCode::Subscript),
        ('~', CatCode::Active),
    ];

    /// Whether tokens with this code are consumed by the lexer.
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            CatCode::Escape
                | CatCode::EndOfLine
                | CatCode::Ignored
                | CatCode::Comment
                | CatCode::Invalid
        )
    }
}

impl TryFrom<u8> for CatCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CatCode::ALL.get(value as usize).copied().ok_or(())
    }
}

impl fmt::Display for CatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            CatCode::Escape => "escape",
            CatCode::BeginGroup => "begin group",
            CatCode::EndGroup => "end group",
            CatCode::MathShift => "math shift",
            CatCode::AlignmentTab => "alignment tab",
            CatCode::EndOfLine => "end of line",
            CatCode::Parameter => "parameter",
            CatCode::Superscript => "superscript",
            CatCode::Subscript => "subscript",
            CatCode::Ignored => "ignored",
            CatCode::Space => "space",
            CatCode::Letter => "letter",
            CatCode::Other => "other",
            CatCode::Active => "active",
            CatCode::Comment => "comment",
            CatCode::Invalid => "invalid",
        };
        write!(f, "{} ({})", *self as u8, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_from_u8() {
        for (i, code) in CatCode::ALL.iter().enumerate() {
            assert_eq!(CatCode::try_from(i as u8), Ok(*code));
        }
        assert_eq!(CatCode::try_from(16), Err(()));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", CatCode::Letter), "11 (letter)");
    }
}
