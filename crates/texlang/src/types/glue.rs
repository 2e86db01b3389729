use crate::types::Scaled;
use std::fmt;

/// Glue.
///
/// TeX.2021.150.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glue {
    pub width: Scaled,
    pub stretch: Scaled,
    pub stretch_order: GlueOrder,
    pub shrink: Scaled,
    pub shrink_order: GlueOrder,
}

/// Order of infinity of a glue stretch or shrink.
///
/// If a list contains glue of some order (e.g. [GlueOrder::Fil]),
/// then glue of a lower order (e.g. [GlueOrder::Normal]) is not stretched or shrunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlueOrder {
    #[default]
    Normal,
    Fil,
    Fill,
    Filll,
}

impl GlueOrder {
    /// Parses an infinite glue order from a keyword.
    pub fn parse(s: &str) -> Option<Self> {
        use GlueOrder::*;
        Some(match s {
            "fil" => Fil,
            "fill" => Fill,
            "filll" => Filll,
            _ => return None,
        })
    }

    fn suffix(&self) -> &'static str {
        match self {
            GlueOrder::Normal => "pt",
            GlueOrder::Fil => "fil",
            GlueOrder::Fill => "fill",
            GlueOrder::Filll => "filll",
        }
    }
}

impl Glue {
    /// Writes the glue in the format `\the` uses, with a custom unit for finite components.
    ///
    /// Math glue is printed with the `mu` unit.
    pub fn write_with_unit(&self, f: &mut impl fmt::Write, unit: &str) -> fmt::Result {
        self.width.write_number(f)?;
        f.write_str(unit)?;
        for (keyword, value, order) in [
            (" plus ", self.stretch, self.stretch_order),
            (" minus ", self.shrink, self.shrink_order),
        ] {
            if value == Scaled::ZERO {
                continue;
            }
            f.write_str(keyword)?;
            value.write_number(f)?;
            match order {
                GlueOrder::Normal => f.write_str(unit)?,
                _ => f.write_str(order.suffix())?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Glue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_with_unit(f, "pt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let glue = Glue {
            width: Scaled::ONE,
            stretch: Scaled::TWO,
            stretch_order: GlueOrder::Fil,
            shrink: Scaled(1 << 15),
            shrink_order: GlueOrder::Normal,
        };
        assert_eq!(format!("{glue}"), "1.0pt plus 2.0fil minus 0.5pt");
        assert_eq!(format!("{}", Glue::default()), "0.0pt");
    }

    #[test]
    fn type_size() {
        assert_eq!(16, std::mem::size_of::<Glue>());
    }
}
