//! Texlang prelude.
//!
//! Primitive implementations usually import this module under the name `txl`:
//! ```
//! use texlang::prelude as txl;
//! fn noop() -> txl::Result<()> { Ok(()) }
//! ```

/// Result type in Texlang.
pub type Result<T> = std::result::Result<T, Box<crate::error::Error>>;
