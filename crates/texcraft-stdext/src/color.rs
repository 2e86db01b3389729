//! Terminal coloring
//!
//! Error messages are colored using the
//! [Colored crate](https://docs.rs/colored/latest/colored/).
//! The dependency is optional and sits behind the `color` Cargo feature.
//!
//! The module exposes a single trait [`Colorize`].
//! With the feature enabled every method forwards to Colored.
//! With the feature disabled every method returns the input unchanged.
//! Downstream code calls the trait methods in both cases:
//!
//! ```
//! use texcraft_stdext::color::Colorize;
//! println!["{}", "Hello, World".bold().bright_red()];
//! ```

#[cfg(feature = "color")]
pub type ColoredString = colored::ColoredString;

#[cfg(not(feature = "color"))]
pub type ColoredString = String;

macro_rules! colorize_impl {
    ( $( $method_name: ident, )+ ) => {
        /// Trait that provides coloring methods on strings.
        ///
        /// See the module documentation for information.
        pub trait Colorize {
            $(
                fn $method_name(self) -> ColoredString;
            )+
        }
        #[cfg(feature="color")]
        impl Colorize for ColoredString {
            $(
                fn $method_name(self) -> ColoredString {
                    colored::Colorize::$method_name(self)
                }
            )+
        }
        #[cfg(feature="color")]
        impl Colorize for &str {
            $(
                fn $method_name(self) -> ColoredString {
                    colored::Colorize::$method_name(self)
                }
            )+
        }
        #[cfg(not(feature="color"))]
        impl Colorize for String {
            $(
                fn $method_name(self) -> ColoredString {
                    self
                }
            )+
        }
        #[cfg(not(feature="color"))]
        impl Colorize for &str {
            $(
                fn $method_name(self) -> ColoredString {
                    self.to_string()
                }
            )+
        }
    };
}

colorize_impl!(
    bold,
    bright_cyan,
    bright_blue,
    bright_red,
    bright_yellow,
    yellow,
    italic,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chaining_preserves_text() {
        let s = "hello".bold().bright_red();
        assert!(format!("{}", s).contains("hello"));
    }
}
