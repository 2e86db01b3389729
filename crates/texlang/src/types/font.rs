/// Identifier of a font.
///
/// Texlang treats fonts as opaque: the identifier is assigned by whatever loads the font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Font(pub u16);

impl Font {
    /// The null font, which is the current font before any font is selected.
    pub const NULL_FONT: Font = Font(0);
}
