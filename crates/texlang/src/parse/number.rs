//! Number parsing.
//!
//! The number may be octal, decimal, hexadecimal, cast from a character token, or read
//! from an internal variable. The full definition of a number in the TeX grammar
//! is given in chapter 24 of the TeXBook.

use crate::command;
use crate::error;
use crate::parse;
use crate::prelude as txl;
use crate::token;
use crate::token::Value;
use crate::traits::*;
use crate::types;
use crate::variable;
use crate::vm;

impl<S: TexlangState> Parsable<S> for i32 {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (_, i) = parse_integer_with_token(input)?;
        Ok(i)
    }
}

/// Parses an integer and also returns the first token of the integer.
///
/// The token is useful for pointing at the integer in error messages.
pub fn parse_integer_with_token<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
) -> txl::Result<(token::Token, i32)> {
    let (token, i, _) = parse_integer(input)?;
    Ok((token, i))
}

/// An unsigned integer in the range `[0, N)`.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Uint<const N: usize>(pub usize);

impl Uint<0> {
    pub const MAX: usize = i32::MAX as usize;
}

impl<S: TexlangState, const N: usize> Parsable<S> for Uint<N> {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (first_token, i) = parse_integer_with_token(input)?;
        if i < 0 || i as usize >= N {
            Err(OutOfBoundsError {
                first_token,
                got: i as i64,
                max: N as i64 - 1,
            }
            .into())
        } else {
            Ok(Uint(i as usize))
        }
    }
}

/// Error returned when an integer is outside of the range permitted by its context.
#[derive(Debug)]
pub struct OutOfBoundsError {
    pub first_token: token::Token,
    pub got: i64,
    /// The largest permitted value. The smallest is always 0.
    pub max: i64,
}

impl error::TexError for OutOfBoundsError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.first_token)
    }

    fn title(&self) -> String {
        format!(
            "expected an integer in the range [0, {}], got {}",
            self.max, self.got
        )
    }

    fn source_annotation(&self) -> String {
        "this is where the number started".into()
    }
}

impl<S: TexlangState> Parsable<S> for char {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (first_token, i) = parse_integer_with_token(input)?;
        match u32::try_from(i).ok().and_then(char::from_u32) {
            Some(c) => Ok(c),
            None => Err(parse::Error::new(
                "a character code",
                Some(first_token),
                "a character code is the number of a Unicode scalar value",
            )
            .with_got_override(format!["got the integer {i}"])
            .with_annotation_override("this is where the number started")
            .into()),
        }
    }
}

impl<S: TexlangState> Parsable<S> for types::CatCode {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (token, i) = parse_integer_with_token(input)?;
        if let Ok(val_u8) = u8::try_from(i) {
            if let Ok(cat_code) = types::CatCode::try_from(val_u8) {
                return Ok(cat_code);
            }
        }
        Err(parse::Error::new(
            "a category code number (an integer in the range [0, 15])",
            Some(token),
            "",
        )
        .with_got_override(format!["got the integer {i}"])
        .with_annotation_override("this is where the number started")
        .into())
    }
}

const GUIDANCE_BEGINNING: &str =
    "a number begins with zero or more minus signs followed by one of the following:
- A decimal digit (0-9), which begins a decimal number.
- The character ', which indicates the beginning of an octal number
- The character \", which indicates the beginning of a hexadecimal number
- The character `, followed by a character token. The character is converted into its UTF-8 number.
- A command that references a variable, like \\count 1.
";

/// Parses an integer, returning the first token and the radix if it was a constant.
pub(crate) fn parse_integer<S: TexlangState>(
    stream: &mut vm::ExpandedStream<S>,
) -> txl::Result<(token::Token, i32, Option<i32>)> {
    let (token, i, radix) = parse_integer_without_trailing_space(stream)?;
    if radix.is_some() {
        get_optional_element![stream, Value::Space(_) => (),];
    }
    Ok((token, i, radix))
}

/// Same as [parse_integer], except the optional space after a constant is not consumed.
///
/// Dimension parsing needs this to decide whether a decimal fraction follows.
pub(crate) fn parse_integer_without_trailing_space<S: TexlangState>(
    stream: &mut vm::ExpandedStream<S>,
) -> txl::Result<(token::Token, i32, Option<i32>)> {
    let sign = parse_optional_signs(stream)?;
    let first_token = stream.next_or_err(NumberEndOfInputError {})?;
    let (result, radix) = match first_token.value() {
        Value::Other(c @ '0'..='9') => {
            let d = (c as u32 - '0' as u32) as i32;
            (parse_constant::<S, 10>(stream, d)?, Some(10))
        }
        Value::Other('\'') => (parse_constant::<S, 8>(stream, 0)?, Some(8)),
        Value::Other('"') => (parse_constant::<S, 16>(stream, 0)?, Some(16)),
        Value::Other('`') => (parse_character(stream)?, None),
        Value::CommandRef(command_ref) => {
            let i = match parse_internal_number(stream, first_token, command_ref)? {
                InternalNumber::Integer(i) => i,
                // TeX.2021.413: dimensions and glue are coerced to integers in scaled points.
                InternalNumber::Dimen(d) => d.0,
                InternalNumber::Glue(g) => g.width.0,
            };
            (i, None)
        }
        _ => {
            stream.back(first_token);
            return Err(parse::Error::new(
                "the beginning of a number",
                Some(first_token),
                GUIDANCE_BEGINNING,
            )
            .into());
        }
    };
    let result = match sign {
        None => result,
        // The only i32 that is not safe to multiply by -1 is i32::MIN.
        // Experimentally we observe in this case that TeX wraps and the result
        // is i32::MIN again.
        Some(_) => result.wrapping_mul(-1),
    };
    Ok((first_token, result, radix))
}

/// A number read from an internal variable.
pub(crate) enum InternalNumber {
    Integer(i32),
    Dimen(types::Scaled),
    Glue(types::Glue),
}

/// Reads the value of the variable referenced by the command.
///
/// Returns an error if the command is not a variable command or references a token list.
pub(crate) fn parse_internal_number<S: TexlangState>(
    stream: &mut vm::ExpandedStream<S>,
    first_token: token::Token,
    command_ref: token::CommandRef,
) -> txl::Result<InternalNumber> {
    let cmd = match stream.vm().groups.command(&command_ref) {
        Some(command::Command::Variable(cmd)) => cmd.clone(),
        cmd => {
            let annotation = match cmd {
                None => "undefined control sequence".to_string(),
                Some(cmd) => format!["control sequence referencing {cmd}"],
            };
            return Err(parse::Error::new(
                "the beginning of a number",
                Some(first_token),
                GUIDANCE_BEGINNING,
            )
            .with_annotation_override(annotation)
            .into());
        }
    };
    Ok(match cmd.value(first_token, stream)? {
        variable::Value::Int(i) => InternalNumber::Integer(i),
        variable::Value::Dimen(d) => InternalNumber::Dimen(d),
        variable::Value::Glue(g) | variable::Value::MuGlue(g) => InternalNumber::Glue(g),
        variable::Value::TokenList(_) => {
            return Err(parse::Error::new(
                "the beginning of a number",
                Some(first_token),
                GUIDANCE_BEGINNING,
            )
            .with_annotation_override("token list variable")
            .into());
        }
    })
}

#[derive(Debug)]
struct NumberEndOfInputError;

impl error::EndOfInputError for NumberEndOfInputError {
    fn doing(&self) -> String {
        "parsing a number".into()
    }
    fn notes(&self) -> Vec<error::Note> {
        vec![GUIDANCE_BEGINNING.into()]
    }
}

/// Parses optional signs and spaces.
///
/// If the combination of the signs is positive, [None] is returned.
/// Otherwise, the Token corresponding to the last negative sign is returned.
pub(crate) fn parse_optional_signs<S: TexlangState>(
    stream: &mut vm::ExpandedStream<S>,
) -> txl::Result<Option<token::Token>> {
    let mut result = None;
    while let Some((sign, token)) = get_optional_element_with_token![
        stream,
        Value::Other('+') => true,
        Value::Other('-') => false,
        Value::Space(_) => true,
    ] {
        result = match (result, sign) {
            (None, false) => Some(token),
            (Some(_), false) => None,
            (result, true) => result,
        };
    }
    Ok(result)
}

const CHARACTER_GUIDANCE: &str =
    r"a character is a character token or single-character control sequence like \a";

// TeX.2021.442
fn parse_character<S: TexlangState>(input: &mut vm::ExpandedStream<S>) -> txl::Result<i32> {
    let token = input.unexpanded().next_or_err(CharacterError {})?;
    let c = match token.value() {
        Value::CommandRef(token::CommandRef::ControlSequence(cs_name)) => {
            let name = input.vm().cs_name_interner().resolve(cs_name).unwrap_or("");
            let mut iter = name.chars();
            match (iter.next(), iter.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(parse::Error::new(
                        "a character",
                        Some(token),
                        CHARACTER_GUIDANCE,
                    )
                    .into())
                }
            }
        }
        value => match value.char() {
            Some(c) => c,
            None => {
                return Err(
                    parse::Error::new("a character", Some(token), CHARACTER_GUIDANCE).into(),
                )
            }
        },
    };
    get_optional_element![input, Value::Space(_) => (),];
    Ok(c as i32)
}

#[derive(Debug)]
struct CharacterError;

impl error::EndOfInputError for CharacterError {
    fn doing(&self) -> String {
        "parsing a character".into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![CHARACTER_GUIDANCE.into()]
    }
}

fn parse_constant<S: TexlangState, const RADIX: i32>(
    stream: &mut vm::ExpandedStream<S>,
    mut result: i32,
) -> txl::Result<i32> {
    let mut started = RADIX == 10;
    loop {
        let next = match stream.next()? {
            None => break,
            Some(next) => next,
        };
        let lsd_or = match next.value() {
            Value::Other(c) => {
                let d = (c as u32).wrapping_sub('0' as u32);
                if d < 10 && d < (RADIX as u32) {
                    Some(d as i32)
                } else if RADIX == 16 {
                    let d = (c as u32).wrapping_sub('A' as u32);
                    if d < 6 {
                        Some(d as i32 + 10)
                    } else {
                        None
                    }
                } else {
                    None
                }
            }
            Value::Letter(c) => {
                let d = (c as u32).wrapping_sub('A' as u32);
                if RADIX == 16 && d < 6 {
                    Some(d as i32 + 10)
                } else {
                    None
                }
            }
            _ => None,
        };
        let lsd = match lsd_or {
            None => {
                stream.back(next);
                break;
            }
            Some(lsd) => lsd,
        };
        started = true;
        result = match add_lsd::<RADIX>(result, lsd) {
            Some(n) => n,
            None => return Err(add_lsd_error::<RADIX>(next, result, lsd).into()),
        }
    }
    if !started {
        let (expected, guidance) = match RADIX {
            8 => {
                ("an octal digit",
                "an octal digit is a token with value 0-7 and category other")
            },
            _ => {
                ("a hexadecimal digit",
                "a hexadecimal digit is either:\n- A character token with value 0-9 and category other, or\n- A character token with value A-F and category letter or other")
            }
        };
        let got = stream.peek()?.copied();
        return Err(parse::Error::new(expected, got, guidance).into());
    }
    Ok(result)
}

fn add_lsd<const RADIX: i32>(n: i32, lsd: i32) -> Option<i32> {
    match n.checked_mul(RADIX) {
        None => None,
        Some(n) => n.checked_add(lsd),
    }
}

fn add_lsd_error<const RADIX: i32>(token: token::Token, n: i32, lsd: i32) -> parse::Error {
    let (got, range) = match RADIX {
        8 => (
            format!["got '{n:o}{lsd:o}"],
            format!["'{:o}, '{:o}", i32::MIN, i32::MAX],
        ),
        16 => (
            format!["got 0x{n:X}{lsd:X}"],
            format!["0x{:X}, 0x{:X}", i32::MIN, i32::MAX],
        ),
        _ => (
            format!["got {n}{lsd}"],
            format!["{}, {}", i32::MIN, i32::MAX],
        ),
    };
    parse::Error::new(format!["a number in the range [{range}]"], Some(token), "")
        .with_got_override(got)
        .with_annotation_override("this digit makes the number too big")
}
