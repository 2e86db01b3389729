//! Texlang variables API
//!
//! A variable is a piece of state that TeX code can read with `\the` and assign to with `=`.
//! Examples are count registers (`\count 5`), parameters (`\tracingifs`) and
//!     entries in the character code tables (`\catcode 65`).
//!
//! Every variable lives in the [group chain](crate::group),
//!     so assignments obey TeX's grouping semantics automatically.
//! A variable [Command] records which category of the chain it addresses
//!     and how the key within that category is determined.
//! Resolving the command, which may read an index from the input, gives a [Variable].

use crate::error;
use crate::group::{GroupChain, RegisterKey};
use crate::parse::{self, OptionalEquals, Uint};
use crate::prelude as txl;
use crate::token;
use crate::traits::*;
use crate::types::{CatCode, DelCode, Glue, MathCode, Scaled};
use crate::vm;
use std::rc::Rc;

/// The type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Int,
    Dimen,
    Glue,
    MuGlue,
    TokenList,
    CatCode,
    MathCode,
    DelCode,
    SfCode,
    LcCode,
    UcCode,
}

impl Kind {
    /// Whether variables of this kind are entries in a character code table.
    pub fn is_code(&self) -> bool {
        matches!(
            self,
            Kind::CatCode
                | Kind::MathCode
                | Kind::DelCode
                | Kind::SfCode
                | Kind::LcCode
                | Kind::UcCode
        )
    }
}

/// Function that determines the index of a variable by reading the input.
///
/// For example, in `\count 4` the index of `4` is determined by parsing a number.
pub type IndexFn<S> = fn(token::Token, &mut vm::ExpandedStream<S>) -> txl::Result<usize>;

/// Specification for how the key of a variable is determined.
pub enum IndexResolver<S> {
    /// A named parameter, like `\tracingifs`.
    Named(&'static str),
    /// A fixed numbered register.
    Static(usize),
    /// An index read from the input.
    Dynamic(IndexFn<S>),
}

impl<S> Clone for IndexResolver<S> {
    fn clone(&self) -> Self {
        match self {
            IndexResolver::Named(name) => IndexResolver::Named(name),
            IndexResolver::Static(i) => IndexResolver::Static(*i),
            IndexResolver::Dynamic(f) => IndexResolver::Dynamic(*f),
        }
    }
}

/// A TeX variable command.
pub struct Command<S> {
    kind: Kind,
    index_resolver: IndexResolver<S>,
}

/// Key that uniquely identifies a variable command, used for `\ifx` equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Key(Kind, KeyIndex);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyIndex {
    Named(&'static str),
    Static(usize),
    Dynamic(usize),
}

impl<S> Command<S> {
    /// Creates a command for a named parameter, like `\tracingifs`.
    pub fn new_singleton(kind: Kind, name: &'static str) -> Command<S> {
        Command {
            kind,
            index_resolver: IndexResolver::Named(name),
        }
    }

    /// Creates a command whose index is determined by the resolver, like `\count`.
    pub fn new_array(kind: Kind, index_resolver: IndexResolver<S>) -> Command<S> {
        Command {
            kind,
            index_resolver,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub(crate) fn key(&self) -> Key {
        let index = match &self.index_resolver {
            IndexResolver::Named(name) => KeyIndex::Named(name),
            IndexResolver::Static(i) => KeyIndex::Static(*i),
            IndexResolver::Dynamic(f) => KeyIndex::Dynamic(*f as usize),
        };
        Key(self.kind, index)
    }
}

impl<S: TexlangState> Command<S> {
    /// Resolve the command to obtain a [Variable].
    pub fn resolve(
        &self,
        token: token::Token,
        input: &mut vm::ExpandedStream<S>,
    ) -> txl::Result<Variable> {
        let index = match &self.index_resolver {
            IndexResolver::Named(name) => {
                return Variable::new_register(self.kind, RegisterKey::Named(name))
                    .ok_or_else(|| NamedCodeVariableError { token }.into());
            }
            IndexResolver::Static(i) => *i,
            IndexResolver::Dynamic(f) => match f(token, input) {
                Ok(i) => i,
                Err(err) => {
                    return Err(error::Error::new_propagated(
                        input.vm(),
                        error::OperationKind::VariableIndex,
                        token,
                        err,
                    ))
                }
            },
        };
        if self.kind.is_code() {
            let c = u32::try_from(index).ok().and_then(char::from_u32);
            return match c {
                None => Err(parse::OutOfBoundsError {
                    first_token: token,
                    got: index as i64,
                    max: char::MAX as i64,
                }
                .into()),
                Some(c) => Ok(Variable::new_code(self.kind, c)),
            };
        }
        Variable::new_register(self.kind, RegisterKey::Numbered(index))
            .ok_or_else(|| NamedCodeVariableError { token }.into())
    }

    /// Resolve the command to a variable and return the value of the variable.
    pub fn value(&self, token: token::Token, input: &mut vm::ExpandedStream<S>) -> txl::Result<Value> {
        let variable = self.resolve(token, input)?;
        Ok(variable.value(&input.vm().groups))
    }

    /// Resolve the command to a variable and set the value of the variable using the following tokens in the input stream.
    ///
    /// This function is used in TeX code like `\variable = 3`.
    pub(crate) fn set_value_using_input(
        &self,
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
        global: bool,
    ) -> txl::Result<()> {
        let variable = self.resolve(token, input.as_mut())?;
        match variable.set_value_using_input(input, global) {
            Ok(()) => Ok(()),
            Err(err) => Err(error::Error::new_propagated(
                input.vm(),
                error::OperationKind::VariableAssignment,
                token,
                err,
            )),
        }
    }
}

#[derive(Debug)]
struct NamedCodeVariableError {
    token: token::Token,
}

impl error::TexError for NamedCodeVariableError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "character code variables must be indexed by a character".into()
    }
}

/// A resolved TeX variable: a category of the group chain plus a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Int(RegisterKey),
    Dimen(RegisterKey),
    Glue(RegisterKey),
    MuGlue(RegisterKey),
    TokenList(RegisterKey),
    CatCode(char),
    MathCode(char),
    DelCode(char),
    SfCode(char),
    LcCode(char),
    UcCode(char),
}

/// The value of a variable.
///
/// Character code variables have integer values, in the form `\the` prints them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Dimen(Scaled),
    Glue(Glue),
    MuGlue(Glue),
    TokenList(Rc<Vec<token::Token>>),
}

impl Variable {
    fn new_register(kind: Kind, key: RegisterKey) -> Option<Variable> {
        Some(match kind {
            Kind::Int => Variable::Int(key),
            Kind::Dimen => Variable::Dimen(key),
            Kind::Glue => Variable::Glue(key),
            Kind::MuGlue => Variable::MuGlue(key),
            Kind::TokenList => Variable::TokenList(key),
            _ => return None,
        })
    }

    fn new_code(kind: Kind, c: char) -> Variable {
        match kind {
            Kind::CatCode => Variable::CatCode(c),
            Kind::MathCode => Variable::MathCode(c),
            Kind::DelCode => Variable::DelCode(c),
            Kind::SfCode => Variable::SfCode(c),
            Kind::LcCode => Variable::LcCode(c),
            Kind::UcCode => Variable::UcCode(c),
            // Register kinds are handled by the caller.
            _ => Variable::CatCode(c),
        }
    }

    /// Returns the value of the variable.
    pub fn value<S>(&self, groups: &GroupChain<S>) -> Value {
        match *self {
            Variable::Int(key) => Value::Int(groups.int(key)),
            Variable::Dimen(key) => Value::Dimen(groups.dimen(key)),
            Variable::Glue(key) => Value::Glue(groups.glue(key)),
            Variable::MuGlue(key) => Value::MuGlue(groups.mu_glue(key)),
            Variable::TokenList(key) => Value::TokenList(groups.token_list(key)),
            Variable::CatCode(c) => Value::Int(groups.cat_code(c) as i32),
            Variable::MathCode(c) => Value::Int(groups.math_code(c).0 as i32),
            Variable::DelCode(c) => Value::Int(match groups.del_code(c) {
                None => -1,
                Some(del_code) => del_code.0 as i32,
            }),
            Variable::SfCode(c) => Value::Int(groups.sf_code(c) as i32),
            Variable::LcCode(c) => Value::Int(groups.lc_code(c).map(|c| c as i32).unwrap_or(0)),
            Variable::UcCode(c) => Value::Int(groups.uc_code(c).map(|c| c as i32).unwrap_or(0)),
        }
    }

    /// Set the value of a variable using the following tokens in the input stream.
    fn set_value_using_input<S: TexlangState>(
        &self,
        input: &mut vm::ExecutionInput<S>,
        global: bool,
    ) -> txl::Result<()> {
        OptionalEquals::parse(input)?;
        match *self {
            Variable::Int(key) => {
                let value = i32::parse(input)?;
                input.groups_mut().set_int(key, value, global);
            }
            Variable::Dimen(key) => {
                let value = Scaled::parse(input)?;
                input.groups_mut().set_dimen(key, value, global);
            }
            Variable::Glue(key) => {
                let value = Glue::parse(input)?;
                input.groups_mut().set_glue(key, value, global);
            }
            Variable::MuGlue(key) => {
                let parse::MuGlue(value) = parse::MuGlue::parse(input)?;
                input.groups_mut().set_mu_glue(key, value, global);
            }
            Variable::TokenList(key) => {
                let value = parse_token_list(input)?;
                input.groups_mut().set_token_list(key, Rc::new(value), global);
            }
            Variable::CatCode(c) => {
                let value = CatCode::parse(input)?;
                input.groups_mut().set_cat_code(c, value, global);
            }
            Variable::MathCode(c) => {
                let Uint(value) = Uint::<{ MathCode::MAX as usize + 1 }>::parse(input)?;
                input
                    .groups_mut()
                    .set_math_code(c, MathCode(value as u16), global);
            }
            Variable::DelCode(c) => {
                let (token, value) = parse::parse_integer_with_token(input.as_mut())?;
                let value = if value < 0 {
                    None
                } else if value as u32 > DelCode::MAX {
                    return Err(parse::OutOfBoundsError {
                        first_token: token,
                        got: value as i64,
                        max: DelCode::MAX as i64,
                    }
                    .into());
                } else {
                    Some(DelCode(value as u32))
                };
                input.groups_mut().set_del_code(c, value, global);
            }
            Variable::SfCode(c) => {
                let Uint(value) = Uint::<0x8000>::parse(input)?;
                input.groups_mut().set_sf_code(c, value as u16, global);
            }
            Variable::LcCode(c) => {
                let value = parse_case_code(input)?;
                input.groups_mut().set_lc_code(c, value, global);
            }
            Variable::UcCode(c) => {
                let value = parse_case_code(input)?;
                input.groups_mut().set_uc_code(c, value, global);
            }
        };
        Ok(())
    }
}

// Zero means the character has no case mapping.
fn parse_case_code<S: TexlangState>(
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<Option<char>> {
    let c = char::parse(input)?;
    Ok(if c == '\0' { None } else { Some(c) })
}

fn parse_token_list<S: TexlangState>(
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<Vec<token::Token>> {
    let opening = loop {
        let token = input.next_or_err(TokenListEndOfInputError {})?;
        match token.value() {
            token::Value::Space(_) => continue,
            token::Value::BeginGroup(_) => break token,
            _ => {
                return Err(parse::Error::new(
                    "the beginning of a token list",
                    Some(token),
                    "a token list is a balanced list of tokens surrounded by braces",
                )
                .into())
            }
        }
    };
    let mut result = vec![];
    if !parse::parse_balanced_tokens(input.unexpanded(), &mut result)? {
        return Err(parse::UnbalancedTokensError { opening }.into());
    }
    Ok(result)
}

#[derive(Debug)]
struct TokenListEndOfInputError;

impl error::EndOfInputError for TokenListEndOfInputError {
    fn doing(&self) -> String {
        "parsing a token list".into()
    }
}
