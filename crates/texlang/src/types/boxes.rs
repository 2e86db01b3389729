use crate::types::Scaled;

/// Whether a box stacks its contents horizontally or vertically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A box stored in a box register.
///
/// Box contents are produced by a typesetting engine outside Texlang.
/// Texlang only needs the orientation (for `\ifhbox` and `\ifvbox`) and the dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TexBox {
    pub orientation: Orientation,
    pub width: Scaled,
    pub height: Scaled,
    pub depth: Scaled,
}

impl TexBox {
    pub fn new(orientation: Orientation) -> TexBox {
        TexBox {
            orientation,
            width: Scaled::ZERO,
            height: Scaled::ZERO,
            depth: Scaled::ZERO,
        }
    }
}
