/// The mode the typesetting engine is in.
///
/// See chapter 13 of the TeXBook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    #[default]
    Vertical,
    InternalVertical,
    Horizontal,
    RestrictedHorizontal,
    Math,
    DisplayMath,
}

impl Mode {
    pub fn is_vertical(&self) -> bool {
        matches!(self, Mode::Vertical | Mode::InternalVertical)
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Mode::Horizontal | Mode::RestrictedHorizontal)
    }

    pub fn is_math(&self) -> bool {
        matches!(self, Mode::Math | Mode::DisplayMath)
    }

    /// Whether this is one of the inner modes, as tested by `\ifinner`.
    pub fn is_inner(&self) -> bool {
        matches!(
            self,
            Mode::InternalVertical | Mode::RestrictedHorizontal | Mode::Math
        )
    }
}
