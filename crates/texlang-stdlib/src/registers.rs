//! Register variables (`\count`, `\dimen`, `\skip`, `\muskip`, `\toks`)
//!
//! Registers are stored in the group chain, so every assignment obeys TeX's grouping rules.
//! Each command reads the register number from the input when it is resolved.

use texlang::parse::Uint;
use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

/// Number of registers of each type.
pub const NUM_REGISTERS: usize = 32768;

pub const COUNT_DOC: &str = "Get or set an integer register";
pub const DIMEN_DOC: &str = "Get or set a dimension register";
pub const SKIP_DOC: &str = "Get or set a glue register";
pub const MUSKIP_DOC: &str = "Get or set a math glue register";
pub const TOKS_DOC: &str = "Get or set a token list register";

/// Get the `\count` command.
pub fn get_count<S: TexlangState>() -> command::BuiltIn<S> {
    new_registers_command(variable::Kind::Int).with_doc(COUNT_DOC)
}

/// Get the `\dimen` command.
pub fn get_dimen<S: TexlangState>() -> command::BuiltIn<S> {
    new_registers_command(variable::Kind::Dimen).with_doc(DIMEN_DOC)
}

/// Get the `\skip` command.
pub fn get_skip<S: TexlangState>() -> command::BuiltIn<S> {
    new_registers_command(variable::Kind::Glue).with_doc(SKIP_DOC)
}

/// Get the `\muskip` command.
pub fn get_muskip<S: TexlangState>() -> command::BuiltIn<S> {
    new_registers_command(variable::Kind::MuGlue).with_doc(MUSKIP_DOC)
}

/// Get the `\toks` command.
pub fn get_toks<S: TexlangState>() -> command::BuiltIn<S> {
    new_registers_command(variable::Kind::TokenList).with_doc(TOKS_DOC)
}

fn new_registers_command<S: TexlangState>(kind: variable::Kind) -> command::BuiltIn<S> {
    variable::Command::new_array(kind, variable::IndexResolver::Dynamic(register_index_fn)).into()
}

fn register_index_fn<S: TexlangState>(
    _: token::Token,
    input: &mut vm::ExpandedStream<S>,
) -> txl::Result<usize> {
    let Uint(index) = Uint::<NUM_REGISTERS>::parse(input)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{prefix, the};
    use texlang_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexlangState for State {
        fn variable_assignment_scope_hook(state: &mut Self) -> bool {
            prefix::variable_assignment_scope_hook(state)
        }
    }

    vm::implement_has_component![
        State,
        (prefix::Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("the", the::get_the()),
            ("count", get_count()),
            ("dimen", get_dimen()),
            ("global", prefix::get_global()),
            ("skip", get_skip()),
            ("toks", get_toks()),
        ])
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (write_and_read_register, r"\count 23 4 \the\count 23", r"4"),
            (
                write_and_read_register_eq,
                r"\count 23 = 4 \the\count 23",
                r"4"
            ),
            (
                negative_negative,
                r"\count 1=5000 \count 0=-1 \the \count -\count 0",
                r"5000"
            ),
            (last_register, r"\count 32767=9 \the\count 32767", r"9"),
            (registers_are_independent, r"\count 1=1 \count 2=2 \the\count 1", r"1"),
            (count_local, r"\count 1=1 {\count 1=2 }\the\count 1", r"1"),
            (count_local_visible_in_group, r"{\count 1=2 \the\count 1}", r"2"),
            (count_global, r"\count 1=1 {\global\count 1=2 }\the\count 1", r"2"),
            (
                toks_basic,
                r"\toks 1 = {Hola, Mundo}\the \toks 1",
                r"Hola, Mundo"
            ),
            (toks_local, r"\toks 1={a}{\toks 1={b}}\the\toks 1", r"a"),
            (toks_nested_braces, r"\toks 1={a{b}c}\the\toks 1", r"a{b}c"),
            (
                dimen_to_int_1,
                r"\dimen 1 = 40sp \count 1 = \dimen 1 \the \count 1",
                r"40",
            ),
            (
                dimen_to_int_2,
                r"\dimen 1 = 40in \count 1 = \dimen 1 \the \count 1",
                r"189451468",
            ),
            (
                skip_to_int,
                r"\skip 1 = 3sp plus 1fil \count 1 = \skip 1 \the \count 1",
                r"3",
            ),
        ),
        error_kind_tests(
            (register_too_large, r"\count 32768 = 1", parse::OutOfBoundsError),
            (register_negative, r"\count -1 = 1", parse::OutOfBoundsError),
            (toks_without_braces, r"\toks 1 = a", parse::Error),
            (toks_unterminated, r"\toks 1 = {a", parse::UnbalancedTokensError),
            (count_end_of_input, r"\count 1 =", error::EofError),
        ),
    ];
}
