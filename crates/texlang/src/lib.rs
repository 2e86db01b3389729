//! # Texlang: a TeX language interpreter.
//!
//! This crate implements the core of a TeX language interpreter.
//! The two central pieces are the [group chain](group), which stores every
//!     scoped binding (registers, category codes, command definitions, ...),
//!     and the [VM](vm), which reads tokens, expands them and runs commands.
//! TeX primitives themselves live in the `texlang-stdlib` crate.

extern crate texcraft_stdext;

pub mod command;
pub mod error;
pub mod group;
pub mod parse;
pub mod prelude;
pub mod texmacro;
pub mod token;
pub mod types;
pub mod variable;
pub mod vm;

/// Module that re-exports all of the crate's traits.
///
/// This is useful for getting all of the traits in scope in a Rust module:
/// ```
/// use texlang::traits::*;
/// ```
pub mod traits {
    pub use super::parse::Parsable;
    pub use super::vm::HasComponent;
    pub use super::vm::TexlangState;
    pub use super::vm::TokenStream;
}
