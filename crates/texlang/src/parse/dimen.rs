//! Dimension parsing.
//!
//! TeX.2021.448 and onwards.
//! Magnification is not implemented, so the `true` keyword is accepted and ignored.

use super::keyword::parse_keyword;
use super::number::{self, InternalNumber};
use crate::error;
use crate::parse;
use crate::prelude as txl;
use crate::token;
use crate::token::Value;
use crate::traits::*;
use crate::types::{GlueOrder, Scaled, ScaledUnit};
use crate::vm;

impl<S: TexlangState> Parsable<S> for Scaled {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        scan_dimen(input, Units::Physical, None)
    }
}

/// The units a dimension may be specified in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Units {
    /// Points, inches and so on.
    Physical,
    /// Math units, used in muglue.
    Math,
}

/// Parses a dimension.
///
/// If `fil_order` is provided, infinite units like `fil` are accepted and the order is
///     written to the reference.
pub(crate) fn scan_dimen<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
    units: Units,
    fil_order: Option<&mut GlueOrder>,
) -> txl::Result<Scaled> {
    let negative = number::parse_optional_signs(input)?.is_some();
    let first_token = input.next_or_err(DimenEndOfInputError {})?;
    let (integer_part, fractional_part) = match first_token.value() {
        Value::CommandRef(command_ref) => {
            // TeX.2021.449
            match number::parse_internal_number(input, first_token, command_ref)? {
                InternalNumber::Integer(i) => (i, Scaled::ZERO),
                InternalNumber::Dimen(d) => return Ok(if negative { -d } else { d }),
                InternalNumber::Glue(g) => {
                    return Ok(if negative { -g.width } else { g.width })
                }
            }
        }
        Value::Other(',' | '.') => (0, scan_decimal_fraction(input)?),
        _ => {
            input.back(first_token);
            let (_, i, radix) = number::parse_integer_without_trailing_space(input)?;
            // A fractional part is only scanned after a decimal constant.
            let fractional_part = match (radix, input.next()?) {
                (_, None) => Scaled::ZERO,
                (Some(10), Some(next)) if matches!(next.value(), Value::Other(',' | '.')) => {
                    scan_decimal_fraction(input)?
                }
                (_, Some(next)) => {
                    if !matches!(next.value(), Value::Space(_)) || radix.is_none() {
                        input.back(next);
                    }
                    Scaled::ZERO
                }
            };
            (i, fractional_part)
        }
    };
    finish_dimen(
        input,
        first_token,
        units,
        fil_order,
        negative,
        integer_part,
        fractional_part,
    )
}

/// Reads the units of a dimension whose numeric part has been parsed.
pub(crate) fn finish_dimen<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
    first_token: token::Token,
    units: Units,
    fil_order: Option<&mut GlueOrder>,
    negative: bool,
    integer_part: i32,
    fractional_part: Scaled,
) -> txl::Result<Scaled> {
    // This can only happen if the integer was read from an internal integer,
    //  in which case the fractional part is zero.
    let (negative, integer_part) = if integer_part < 0 {
        (!negative, integer_part.wrapping_neg())
    } else {
        (negative, integer_part)
    };
    let s = match scan_and_apply_units(
        input,
        first_token,
        units,
        fil_order,
        integer_part,
        fractional_part,
    )? {
        Some(s) => s,
        None => {
            return Err(parse::Error::new(
                "a dimension in the range (-2^14pt,2^14pt)",
                Some(first_token),
                "",
            )
            .with_got_override("a dimension that's too large")
            .into())
        }
    };
    Ok(if negative { -s } else { s })
}

/// TeX.2021.453
///
/// Returns `Ok(None)` if overflow occurs.
fn scan_and_apply_units<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
    first_token: token::Token,
    units: Units,
    fil_order: Option<&mut GlueOrder>,
    integer_part: i32,
    fractional_part: Scaled,
) -> txl::Result<Option<Scaled>> {
    // Infinite units
    // TeX.2021.454
    if let Some(fil_order) = fil_order {
        if parse_keyword(input, "fil")? {
            let mut order = GlueOrder::Fil;
            while parse_keyword(input, "l")? {
                order = match order {
                    GlueOrder::Fil => GlueOrder::Fill,
                    GlueOrder::Fill => GlueOrder::Filll,
                    GlueOrder::Normal | GlueOrder::Filll => {
                        return Err(parse::Error::new(
                            "a unit of measure",
                            Some(first_token),
                            "the largest infinite unit is filll",
                        )
                        .with_got_override("found the unit fillll")
                        .into());
                    }
                };
            }
            *fil_order = order;
            parse::OptionalSpace::parse(input)?;
            return Ok(Scaled::from_integer(integer_part)
                .ok()
                .map(|s| s + fractional_part));
        }
    }

    // Internal quantities as units, like `2\dimen0`.
    // TeX.2021.455
    if let Some(next) = input.peek()?.copied() {
        if let Value::CommandRef(command_ref) = next.value() {
            input.consume()?;
            let v = match number::parse_internal_number(input, next, command_ref)? {
                // TeX silently interprets an integer as sp in this position.
                InternalNumber::Integer(i) => Scaled(i),
                InternalNumber::Dimen(d) => d,
                InternalNumber::Glue(g) => g.width,
            };
            let Ok((adjusted_fractional_part, _)) = v.xn_over_d(fractional_part.0, 1 << 16) else {
                return Ok(None);
            };
            return Ok(v.nx_plus_y(integer_part, adjusted_fractional_part).ok());
        }
    }

    if units == Units::Math {
        if !parse_keyword(input, "mu")? {
            let got = input.peek()?.copied();
            return Err(parse::Error::new(
                "a math unit",
                got,
                "the only unit of measure allowed in math glue is mu",
            )
            .into());
        }
        parse::OptionalSpace::parse(input)?;
        let Ok(i) = Scaled::from_integer(integer_part) else {
            return Ok(None);
        };
        return Ok(Some(i + fractional_part));
    }

    // TeX.2021.457
    parse_keyword(input, "true")?;

    // TeX.2021.458
    let scaled_unit = ScaledUnit::parse_impl(input)?;
    parse::OptionalSpace::parse(input)?;
    let (integer_part, fractional_part) = match scaled_unit {
        // For sp units, the fractional part is silently dropped.
        ScaledUnit::ScaledPoint => {
            let s = Scaled(integer_part);
            return Ok(if s > Scaled::MAX_DIMEN { None } else { Some(s) });
        }
        ScaledUnit::Point => (integer_part, fractional_part.0),
        _ => {
            let (n, d) = scaled_unit.conversion_fraction();
            let Ok((i, remainder)) = Scaled(integer_part).xn_over_d(n, d) else {
                return Ok(None);
            };
            let f = ((n as i64) * (fractional_part.0 as i64)
                + (1_i64 << 16) * (remainder.0 as i64))
                / (d as i64);
            let i = i.0 as i64 + f / (1 << 16);
            let Ok(i) = i32::try_from(i) else {
                return Ok(None);
            };
            (i, (f % (1 << 16)) as i32)
        }
    };
    let Ok(integer_part) = Scaled::from_integer(integer_part) else {
        return Ok(None);
    };
    Ok(Some(integer_part + Scaled(fractional_part)))
}

impl<S: TexlangState> Parsable<S> for ScaledUnit {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        for unit in ScaledUnit::ALL {
            if parse_keyword(input, unit.abbreviation())? {
                return Ok(unit);
            }
        }
        let got = input.peek()?.copied();
        Err(parse::Error::new(
            "a unit of measure",
            got,
            "the units of measure are pt, pc, in, bp, cm, mm, dd, cc and sp",
        )
        .into())
    }
}

/// TeX.2021.452
fn scan_decimal_fraction<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
) -> txl::Result<Scaled> {
    // We only keep up to 17 digits, because further digits won't affect the result given
    // that the smallest scaled number is 2^(-16).
    let mut digits = [0_u8; 17];
    let mut i = 0_usize;
    while let Some(token) = input.next()? {
        let d = match token.value() {
            Value::Other(c @ '0'..='9') => (c as u32 - '0' as u32) as u8,
            Value::Space(_) => {
                break;
            }
            _ => {
                input.back(token);
                break;
            }
        };
        if let Some(digit) = digits.get_mut(i) {
            *digit = d;
            i += 1;
        }
    }
    Ok(Scaled::from_decimal_fraction(&digits[0..i]))
}

#[derive(Debug)]
struct DimenEndOfInputError;

impl error::EndOfInputError for DimenEndOfInputError {
    fn doing(&self) -> String {
        "parsing a dimension".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (zero_pt, "0pt", Scaled::ZERO),
        (one_pt, "1pt", Scaled::ONE),
        (one_pt_negative, "-1pt", -Scaled::ONE),
        (two_pt, "2pt", Scaled::TWO),
        (empty_point, ".pt", Scaled::ZERO),
        (fraction_1, "0.5pt", Scaled::from_decimal_fraction(&[5])),
        (fraction_2, "-0.5pt", -Scaled::from_decimal_fraction(&[5])),
        (fraction_comma, "0,5pt", Scaled::from_decimal_fraction(&[5])),
        (
            fraction_3,
            "1.5pt",
            Scaled::ONE + Scaled::from_decimal_fraction(&[5])
        ),
        (units_in_1, "1in", (Scaled::ONE * 7227) / 100),
        (units_in_2, "1 in", (Scaled::ONE * 7227) / 100),
        (units_true_in, "1 true in", (Scaled::ONE * 7227) / 100),
        (units_pc, "1pc", Scaled::ONE * 12),
        (units_cm, "1cm", (Scaled::ONE * 7227) / 254),
        (units_mm, "1mm", (Scaled::ONE * 7227) / 2540),
        (units_bp, "1bp", (Scaled::ONE * 7227) / 7200),
        (units_dd, "1dd", (Scaled::ONE * 1238) / 1157),
        (units_cc, "1cc", (Scaled::ONE * 14856) / 1157),
        (units_upper_case, "1PT", Scaled::ONE),
        (units_sp_1, "1sp", Scaled(1)),
        (units_sp_2, "1.999999sp", Scaled(1)),
        (nearly_overflow_pt, "16383.99998pt", Scaled::MAX_DIMEN),
        (nearly_overflow_sp_1, "1073741823sp", Scaled::MAX_DIMEN),
    ];

    parse_failure_tests!(
        Scaled,
        (),
        (invalid_unit, "1xy"),
        (missing_unit, "1"),
        (overflow_pt, "16384pt"),
        (overflow_pt_neg, "-16384pt"),
        (overflow_in_1, "300in"),
        (overflow_in_2, "300000000in"),
        (overflow_sp, "1073741824sp"),
    );
}
