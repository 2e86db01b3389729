//! TeX types supported by Texlang

mod boxes;
mod codes;
mod font;
mod glue;
mod mode;
mod scaled;

pub use crate::token::CatCode;
pub use boxes::{Orientation, TexBox};
pub use codes::{DelCode, MathClass, MathCode};
pub use font::Font;
pub use glue::{Glue, GlueOrder};
pub use mode::Mode;
pub use scaled::{OverflowError, Scaled, ScaledUnit};
