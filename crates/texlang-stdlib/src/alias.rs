//! `\let` aliasing command

use crate::prefix;
use texlang::parse::OptionalEqualsUnexpanded;
use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

pub const LET_DOC: &str = "Assign a command or character to a control sequence";

/// Get the `\let` command.
pub fn get_let<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(let_primitive_fn)
        .with_tag(let_tag())
        .with_doc(LET_DOC)
}

static LET_TAG: command::StaticTag = command::StaticTag::new();

pub fn let_tag() -> command::Tag {
    LET_TAG.get()
}

fn let_primitive_fn<S: HasComponent<prefix::Component>>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let global = input.state_mut().component_mut().take_global();
    let (alias, _) = <(token::CommandRef, OptionalEqualsUnexpanded)>::parse(input)?;
    let token = input.unexpanded().next_or_err(LetEndOfInputError {})?;
    let command = match token.value() {
        token::Value::CommandRef(command_ref) => input.groups().command(&command_ref).cloned(),
        value => Some(command::Command::CharacterTokenAlias(value)),
    };
    log::trace!(
        "aliasing {} to {}, global={global}",
        alias.to_string(input.vm().cs_name_interner()),
        token.value().describe(input.vm().cs_name_interner()),
    );
    input.groups_mut().set_command(alias, command, global);
    Ok(())
}

#[derive(Debug)]
struct LetEndOfInputError;

impl error::EndOfInputError for LetEndOfInputError {
    fn doing(&self) -> String {
        r"reading the right hand side of a \let assignment".into()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::def;
    use texlang_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexlangState for State {}

    vm::implement_has_component![
        State,
        (prefix::Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("global", prefix::get_global()),
            ("let", get_let()),
        ])
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (let_for_macro, r"\def\A{abc}\let\B\A\B", "abc"),
            (local, r"\def\A{a}\def\B{b}\let\C=\A{\let\C=\B \C}\C", "ba"),
            (
                global,
                r"\def\A{a}\def\B{b}\let\C=\A{\global\let\C=\B \C}\C",
                "bb"
            ),
            (let_for_macro_equals, r"\def\A{abc}\let\B=\A\B", "abc"),
            (let_equals_one_space, r"\def\A{abc}\let\B= \A\B", "abc"),
            (let_snapshot_not_updated, r"\def\A{a}\let\B\A\def\A{b}\B\A", "ab"),
            (let_character, r"\let\A=x\A", "x"),
            (let_begin_group_character, r"\let\A={\def\B{b}\A\B}", "b"),
            (
                let_undefined_restored,
                r"\def\A{a}{\let\A=\undefined}\A",
                "a"
            ),
        ),
        failure_tests(
            (let_unknown_cs_name, r"\let \B=\A \B"),
            (let_undefines, r"\def\A{a}\let\A=\undefined \A"),
        ),
        error_kind_tests(
            (let_end_of_input, r"\let\A=", error::EofError),
            (let_target_is_character, r"\let a=b", parse::Error),
        ),
    ];
}
