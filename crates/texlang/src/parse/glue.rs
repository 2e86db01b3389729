//! Glue parsing.

use super::dimen::{finish_dimen, scan_dimen, Units};
use super::keyword::parse_keyword;
use super::number::{self, InternalNumber};
use crate::error;
use crate::prelude as txl;
use crate::token::Value;
use crate::traits::*;
use crate::types::{Glue, Scaled};
use crate::vm;

impl<S: TexlangState> Parsable<S> for Glue {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        scan_glue(input, Units::Physical)
    }
}

/// Glue specified in math units, the value of a `\muskip` register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MuGlue(pub Glue);

impl<S: TexlangState> Parsable<S> for MuGlue {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        Ok(MuGlue(scan_glue(input, Units::Math)?))
    }
}

// TeX.2021.461
fn scan_glue<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
    units: Units,
) -> txl::Result<Glue> {
    let negative = number::parse_optional_signs(input)?.is_some();
    let first_token = input.next_or_err(GlueEndOfInputError {})?;
    let width = match first_token.value() {
        Value::CommandRef(command_ref) => {
            match number::parse_internal_number(input, first_token, command_ref)? {
                InternalNumber::Glue(g) => {
                    return Ok(if negative { negate(g) } else { g });
                }
                InternalNumber::Dimen(d) => d,
                // The integer is the start of a dimension, like `\count1 pt`.
                InternalNumber::Integer(i) => {
                    finish_dimen(input, first_token, units, None, false, i, Scaled::ZERO)?
                }
            }
        }
        _ => {
            input.back(first_token);
            scan_dimen(input, units, None)?
        }
    };
    let mut g = Glue {
        width: if negative { -width } else { width },
        ..Default::default()
    };
    if parse_keyword(input, "plus")? {
        g.stretch = scan_dimen(input, units, Some(&mut g.stretch_order))?;
    }
    if parse_keyword(input, "minus")? {
        g.shrink = scan_dimen(input, units, Some(&mut g.shrink_order))?;
    }
    Ok(g)
}

fn negate(g: Glue) -> Glue {
    Glue {
        width: -g.width,
        stretch: -g.stretch,
        shrink: -g.shrink,
        ..g
    }
}

#[derive(Debug)]
struct GlueEndOfInputError;

impl error::EndOfInputError for GlueEndOfInputError {
    fn doing(&self) -> String {
        "parsing a glue".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;
    use crate::types::GlueOrder;

    parse_success_tests![
        (width_1, "0pt", Glue::default()),
        (
            width_2,
            "1pt",
            Glue {
                width: Scaled::ONE,
                ..Default::default()
            }
        ),
        (
            width_3,
            "-1pt",
            Glue {
                width: -Scaled::ONE,
                ..Default::default()
            }
        ),
        (
            stretch_1,
            "1pt plus 1pt",
            Glue {
                width: Scaled::ONE,
                stretch: Scaled::ONE,
                ..Default::default()
            }
        ),
        (
            stretch_and_shrink,
            "1pt plus 2pt minus 3pt",
            Glue {
                width: Scaled::ONE,
                stretch: Scaled::TWO,
                shrink: Scaled::ONE * 3,
                ..Default::default()
            }
        ),
        (
            stretch_fil,
            "1pt plus 1fil",
            Glue {
                width: Scaled::ONE,
                stretch: Scaled::ONE,
                stretch_order: GlueOrder::Fil,
                ..Default::default()
            }
        ),
        (
            stretch_fill,
            "1pt plus 1fill",
            Glue {
                width: Scaled::ONE,
                stretch: Scaled::ONE,
                stretch_order: GlueOrder::Fill,
                ..Default::default()
            }
        ),
        (
            shrink_filll,
            "1pt minus 1filll",
            Glue {
                width: Scaled::ONE,
                shrink: Scaled::ONE,
                shrink_order: GlueOrder::Filll,
                ..Default::default()
            }
        ),
        (
            mu_glue,
            "1mu plus 2mu",
            MuGlue(Glue {
                width: Scaled::ONE,
                stretch: Scaled::TWO,
                ..Default::default()
            })
        ),
    ];

    parse_failure_tests!(
        Glue,
        (),
        (stretch_overflow, "1pt plus 30000000fil"),
        (stretch_fillll, "1pt plus 2fillll"),
        (mu_unit_in_glue, "1mu"),
    );

    parse_failure_tests!(MuGlue, (), (physical_unit_in_mu_glue, "1pt"));
}
