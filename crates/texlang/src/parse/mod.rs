//! Logic for parsing elements of the TeX grammar from token streams.
//!
//! This parsing module is based around the [Parsable] trait, which is the most important type in the module.
//! This trait is implemented by Rust types that correspond to elements of the TeX grammar.
//! The trait implementation provides a way to parse grammar elements out of the input stream.
//!
//! The module contains implementations of [Parsable] for tuples where each element is parsable.
//! This allows expressions like `<integer><optional equals><integer>` to be parsed by one invocation
//!     of [Parsable::parse], in this case on the type `(i32, OptionalEquals, i32)`.
//!
//! The second most important thing is the collection of custom Rust types like [OptionalBy] and
//!     [OptionalEquals] which correspond to TeX grammar elements.
//!
//! Finally this module contains some functions for special situation like parsing lists of tokens.

#[macro_use]
mod helpers;

mod dimen;
mod glue;
mod keyword;
mod number;
#[cfg(test)]
mod testing;

pub use glue::MuGlue;
pub use keyword::parse_keyword;
pub use keyword::OptionalBy;
pub use keyword::To;
pub use number::parse_integer_with_token;
pub use number::OutOfBoundsError;
pub use number::Uint;

use crate::error;
use crate::prelude as txl;
use crate::token;
use crate::traits::*;
use crate::vm;

/// Implementations of this trait are elements of the TeX grammar than can be parsed from a stream of tokens.
pub trait Parsable<S: TexlangState>: Sized {
    /// Parses a value from an input stream.
    ///
    /// This method just delegates to [Parsable::parse_impl].
    #[inline]
    fn parse<I>(input: &mut I) -> txl::Result<Self>
    where
        I: AsMut<vm::ExpandedStream<S>>,
    {
        Parsable::parse_impl(input.as_mut())
    }

    /// Parses a value from the [vm::ExpandedStream].
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self>;
}

/// Error returned when the input does not contain the expected grammar element.
#[derive(Debug)]
pub struct Error {
    pub expected: String,
    /// The token found instead, or [None] if the input ended.
    pub got: Option<token::Token>,
    pub got_override: String,
    pub annotation_override: String,
    pub guidance: String,
}

impl error::TexError for Error {
    fn kind(&self) -> error::Kind {
        match self.got {
            None => error::Kind::EndOfInput,
            Some(token) => error::Kind::Token(token),
        }
    }

    fn title(&self) -> String {
        let got = if self.got_override.is_empty() {
            match self.got {
                None => "the input ended".to_string(),
                Some(token) => match token.value() {
                    token::Value::Letter(c) => format!["found the letter {c}"],
                    token::Value::Other(c) => format!["found a non-letter character {c}"],
                    token::Value::CommandRef(token::CommandRef::ControlSequence(_)) => {
                        "found a control sequence".to_string()
                    }
                    _ => match (token.char(), token.cat_code()) {
                        (Some(c), Some(code)) => {
                            format!["found a token with value {c} and category code {code}"]
                        }
                        _ => "found a token".to_string(),
                    },
                },
            }
        } else {
            self.got_override.clone()
        };
        format!["expected {}, instead {}", self.expected, got]
    }

    fn notes(&self) -> Vec<error::Note> {
        if self.guidance.is_empty() {
            return vec![];
        }
        vec![self.guidance.clone().into()]
    }

    fn source_annotation(&self) -> String {
        if !self.annotation_override.is_empty() {
            return self.annotation_override.clone();
        }
        error::TexError::default_source_annotation(self)
    }
}

impl Error {
    pub fn new<T: Into<String>, R: Into<String>>(
        expected: T,
        got: Option<token::Token>,
        guidance: R,
    ) -> Self {
        Error {
            expected: expected.into(),
            got,
            got_override: "".into(),
            annotation_override: "".into(),
            guidance: guidance.into(),
        }
    }

    pub fn with_got_override<T: Into<String>>(mut self, got_override: T) -> Self {
        self.got_override = got_override.into();
        self
    }

    pub fn with_annotation_override<T: Into<String>>(mut self, annotation_override: T) -> Self {
        self.annotation_override = annotation_override.into();
        self
    }
}

/// Error returned when the input ends inside a braced group.
#[derive(Debug)]
pub struct UnbalancedTokensError {
    /// The begin group token that opened the group.
    pub opening: token::Token,
}

impl error::TexError for UnbalancedTokensError {
    fn kind(&self) -> error::Kind {
        error::Kind::EndOfInput
    }

    fn title(&self) -> String {
        "unexpected end of input while reading a balanced list of tokens".into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![error::Note::SourceCodeTrace(
            "the list of tokens began here:".into(),
            self.opening,
        )]
    }
}

macro_rules! generate_tuple_impls {
    ( $first: ident ) => {};
    ( $first: ident, $( $name: ident ),+ ) => {
        generate_tuple_impls![ $( $name ),+];

        impl<S: TexlangState, $first : Parsable<S>, $( $name : Parsable<S> ),+> Parsable<S> for ($first, $( $name ),+) {
            fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
                Ok(($first::parse(input)?, $( $name::parse(input)? ),+))
            }
        }
    };
}

generate_tuple_impls![T1, T2, T3, T4, T5];

impl<S: TexlangState> Parsable<S> for token::CommandRef {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        while get_optional_element![
            input.unexpanded(),
            token::Value::Space(_) => (),
        ]
        .is_some()
        {}
        get_required_element![
            input.unexpanded(),
            "a control sequence or active character",
            "a command must be a control sequence or an active character",
            token::Value::CommandRef(command_ref) => command_ref,
        ]
    }
}

/// When parsed, this type consumes an optional equals from the token stream.
///
/// Spaces before the equals are skipped, as is one space after it.
#[derive(Debug, PartialEq, Eq)]
pub struct OptionalEquals;

impl<S: TexlangState> Parsable<S> for OptionalEquals {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        parse_optional_equals(input)?;
        Ok(OptionalEquals {})
    }
}

/// Same as [OptionalEquals], but no expansion is performed.
///
/// This is used by `\let`, where the token after the equals must not be expanded.
pub struct OptionalEqualsUnexpanded;

impl<S: TexlangState> Parsable<S> for OptionalEqualsUnexpanded {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        parse_optional_equals(input.unexpanded())?;
        Ok(OptionalEqualsUnexpanded {})
    }
}

fn parse_optional_equals<T: TokenStream>(stream: &mut T) -> txl::Result<()> {
    while let Some(found_equals) = get_optional_element![
        stream,
        token::Value::Other('=') => true,
        token::Value::Space(_) => false,
    ] {
        if found_equals {
            get_optional_element![
                stream,
                token::Value::Space(_) => (),
            ];
            break;
        }
    }
    Ok(())
}

/// When parsed, this type consumes an optional space from the token stream.
pub struct OptionalSpace;

impl<S: TexlangState> Parsable<S> for OptionalSpace {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        get_optional_element![
            input,
            token::Value::Space(_) => (),
        ];
        Ok(OptionalSpace {})
    }
}

/// When parsed, this type consumes zero or more spaces from the token stream.
#[derive(Debug, PartialEq, Eq)]
pub struct Spaces;

impl<S: TexlangState> Parsable<S> for Spaces {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        while get_optional_element![
            input,
            token::Value::Space(_) => (),
        ]
        .is_some()
        {}
        Ok(Spaces {})
    }
}

/// Parses balanced tokens from the stream.
///
/// This function assumes the opening begin group token has already been consumed.
/// The closing end group token is consumed but not added to the result.
///
/// Returns false if the input ended before balanced tokens completed.
pub fn parse_balanced_tokens<T: TokenStream>(
    stream: &mut T,
    result: &mut Vec<token::Token>,
) -> txl::Result<bool> {
    let mut scope_depth = 0_usize;
    while let Some(token) = stream.next()? {
        match token.value() {
            token::Value::BeginGroup(_) => {
                scope_depth += 1;
            }
            token::Value::EndGroup(_) => {
                if scope_depth == 0 {
                    return Ok(true);
                }
                scope_depth -= 1;
            }
            _ => (),
        }
        result.push(token);
    }
    Ok(false)
}
