//! Data structures and algorithms used by the Texlang crates.
//!
//! Nothing here is TeX specific.

pub mod algorithms;
pub mod collections;
pub mod color;
