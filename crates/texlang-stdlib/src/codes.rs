//! Primitives for setting codes (`\catcode`, `\mathcode`, etc.)
//!
//! Each command is a variable indexed by a character.
//! The values live in the group chain, which also synthesizes the defaults.

use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

pub const CATCODE_DOC: &str = "Get or set a cat code register";
pub const MATHCODE_DOC: &str = "Get or set a math code register";
pub const DELCODE_DOC: &str = "Get or set a delimiter code register";
pub const SFCODE_DOC: &str = "Get or set a space factor code register";
pub const LCCODE_DOC: &str = "Get or set a lower case code register";
pub const UCCODE_DOC: &str = "Get or set an upper case code register";

/// Get the `\catcode` command.
pub fn get_catcode<S: TexlangState>() -> command::BuiltIn<S> {
    get_command(variable::Kind::CatCode, CATCODE_DOC)
}

/// Get the `\mathcode` command.
pub fn get_mathcode<S: TexlangState>() -> command::BuiltIn<S> {
    get_command(variable::Kind::MathCode, MATHCODE_DOC)
}

/// Get the `\delcode` command.
pub fn get_delcode<S: TexlangState>() -> command::BuiltIn<S> {
    get_command(variable::Kind::DelCode, DELCODE_DOC)
}

/// Get the `\sfcode` command.
pub fn get_sfcode<S: TexlangState>() -> command::BuiltIn<S> {
    get_command(variable::Kind::SfCode, SFCODE_DOC)
}

/// Get the `\lccode` command.
pub fn get_lccode<S: TexlangState>() -> command::BuiltIn<S> {
    get_command(variable::Kind::LcCode, LCCODE_DOC)
}

/// Get the `\uccode` command.
pub fn get_uccode<S: TexlangState>() -> command::BuiltIn<S> {
    get_command(variable::Kind::UcCode, UCCODE_DOC)
}

fn get_command<S: TexlangState>(kind: variable::Kind, doc: &'static str) -> command::BuiltIn<S> {
    let cmd: command::BuiltIn<S> =
        variable::Command::new_array(kind, variable::IndexResolver::Dynamic(char_index_fn)).into();
    cmd.with_doc(doc)
}

fn char_index_fn<S: TexlangState>(
    _: token::Token,
    input: &mut vm::ExpandedStream<S>,
) -> txl::Result<usize> {
    let c = char::parse(input)?;
    Ok(c as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion;
    use crate::the;
    use std::collections::HashMap;
    use texlang_testing::*;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("the", the::get_the()),
            ("relax", expansion::get_relax()),
            ("catcode", get_catcode()),
            ("delcode", get_delcode()),
            ("lccode", get_lccode()),
            ("mathcode", get_mathcode()),
            ("sfcode", get_sfcode()),
            ("uccode", get_uccode()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (catcode_base_case, r"\catcode 48 11 \the\catcode 48", r"11"),
            (
                catcode_grouping,
                r"{\catcode 48 11 \the\catcode 48}-\the\catcode 48",
                r"11-12"
            ),
            (catcode_default, r"\the\catcode 48", r"12"),
            (catcode_default_letter, r"\the\catcode `\a", r"11"),
            (catcode_default_escape, r"\the\catcode `\\", r"0"),
            (catcode_high_character, r"\catcode 480 11 \the\catcode 480", r"11"),
            (
                catcode_change_applies_to_next_character,
                r"\catcode `\A=10 xAy",
                r"x y"
            ),
            (
                catcode_reverts_at_group_end,
                r"{\catcode `\A=10 }xAy",
                r"xAy"
            ),
            (
                mathcode_base_case,
                r"\mathcode 48 11 \the\mathcode 48",
                r"11"
            ),
            (
                mathcode_grouping,
                r"{\mathcode 48 11 \the\mathcode 48}-\the\mathcode 48",
                r"11-28720"
            ),
            (mathcode_default_other, r"\the\mathcode `\+", r"43"),
            (delcode_default, r"\the\delcode `\(", r"-1"),
            (delcode_default_period, r"\the\delcode `\.", r"0"),
            (delcode_base_case, r"\delcode `\( 5 \the\delcode `\(", r"5"),
            (delcode_set_undefined, r"\delcode `\. -1 \the\delcode `\.", r"-1"),
            (sfcode_default_letter, r"\the\sfcode `\a", r"999"),
            (sfcode_default_other, r"\the\sfcode `\.", r"1000"),
            (sfcode_base_case, r"\sfcode `\. 3000 \the\sfcode `\.", r"3000"),
            (lccode_default, r"\the\lccode `\A", r"97"),
            (lccode_default_none, r"\the\lccode `\1", r"0"),
            (uccode_default, r"\the\uccode `\a", r"65"),
            (
                uccode_grouping,
                r"{\uccode `\a=`\b\relax\the\uccode `\a}-\the\uccode `\a",
                r"98-65"
            ),
        ),
        error_kind_tests(
            (catcode_value_too_large, r"\catcode 48 16 ", parse::Error),
            (catcode_value_is_negative, r"\catcode 48 -1 ", parse::Error),
            (mathcode_value_too_large, r"\mathcode 48 32769 ", parse::OutOfBoundsError),
            (mathcode_value_is_negative, r"\mathcode 48 -1 ", parse::OutOfBoundsError),
            (delcode_value_too_large, r"\delcode 48 16777216 ", parse::OutOfBoundsError),
            (sfcode_value_too_large, r"\sfcode 48 32768 ", parse::OutOfBoundsError),
            (catcode_index_not_a_character, r"\catcode -1 = 11 ", parse::Error),
        ),
    ];
}
