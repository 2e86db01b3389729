/// The class of a math character, the highest 3 bits of a [MathCode].
///
/// See chapter 17 of the TeXBook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MathClass {
    Ordinary = 0,
    LargeOperator = 1,
    BinaryOperation = 2,
    Relation = 3,
    Opening = 4,
    Closing = 5,
    Punctuation = 6,
    Variable = 7,
}

impl MathClass {
    fn from_bits(bits: u16) -> MathClass {
        use MathClass::*;
        match bits & 0b111 {
            0 => Ordinary,
            1 => LargeOperator,
            2 => BinaryOperation,
            3 => Relation,
            4 => Opening,
            5 => Closing,
            6 => Punctuation,
            _ => Variable,
        }
    }
}

/// A math code.
///
/// The inner value is in the range [0, 32768].
/// It packs a [MathClass] (3 bits), a family (4 bits) and a character position (8 bits).
/// The special value 32768 (`"8000`) makes the character behave like an active character in math mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MathCode(pub u16);

impl MathCode {
    /// The maximum value of the inner value.
    pub const MAX: u16 = 0x8000;

    pub fn new(class: MathClass, family: u8, position: u8) -> MathCode {
        MathCode(((class as u16) << 12) | (((family & 0xF) as u16) << 8) | (position as u16))
    }

    pub fn class(&self) -> MathClass {
        MathClass::from_bits(self.0 >> 12)
    }

    pub fn family(&self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    pub fn position(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

/// A delimiter code.
///
/// The inner value is a 24-bit number describing a small and a large variant of the delimiter.
/// Characters without a delimiter code have no [DelCode]; `\the\delcode` reports -1 for them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelCode(pub u32);

impl DelCode {
    /// The null delimiter, which is the delimiter code of the period character.
    pub const NULL: DelCode = DelCode(0);

    /// The maximum value of the inner value.
    pub const MAX: u32 = 0xFF_FFFF;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn math_code_fields() {
        let code = MathCode::new(MathClass::Variable, 1, b'a');
        assert_eq!(code.0, 0x7161);
        assert_eq!(code.class(), MathClass::Variable);
        assert_eq!(code.family(), 1);
        assert_eq!(code.position(), b'a');
    }
}
