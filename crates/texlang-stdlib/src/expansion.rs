//! Primitives that alter the expansion process (`\relax`, `\expandafter`, `\noexpand`)

use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

pub const RELAX_DOC: &str = "Do nothing";
pub const EXPANDAFTER_DOC: &str = "Expand the token after the next one, then continue with the next one";
pub const NOEXPAND_DOC: &str = "Prevent the next token from being expanded";

/// Get the `\relax` command.
pub fn get_relax<S>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(|_, _| Ok(())).with_doc(RELAX_DOC)
}

/// Get the `\noexpand` command.
///
/// The command only works if the state forwards
///     [TexlangState::expansion_override_hook] to [noexpand_hook].
pub fn get_noexpand<S>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(noexpand_fn)
        .with_tag(NO_EXPAND_TAG.get())
        .with_doc(NOEXPAND_DOC)
}

static NO_EXPAND_TAG: command::StaticTag = command::StaticTag::new();

fn noexpand_fn<S>(token: token::Token, _: &mut vm::ExpansionInput<S>) -> txl::Result<()> {
    Err(error::SimpleTokenError::new(
        token,
        r"\noexpand was expanded directly, but it only works through the expansion override hook",
    )
    .into())
}

/// Expansion override hook that implements `\noexpand`.
#[inline]
pub fn noexpand_hook<S: TexlangState>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
    tag: Option<command::Tag>,
) -> txl::Result<Option<token::Token>> {
    // Fast path: this is not the \noexpand command.
    if tag != Some(NO_EXPAND_TAG.get()) {
        return Ok(None);
    }
    noexpand_hook_finish(token, input)
}

fn noexpand_hook_finish<S: TexlangState>(
    _: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<Option<token::Token>> {
    let token = input.unexpanded().next_or_err(NoexpandEndOfInputError {})?;
    Ok(Some(token))
}

#[derive(Debug)]
struct NoexpandEndOfInputError;

impl error::EndOfInputError for NoexpandEndOfInputError {
    fn doing(&self) -> String {
        r"expanding a \noexpand command".into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![r"\noexpand must be followed by 1 token".into()]
    }
}

/// Get the `\expandafter` command.
pub fn get_expandafter<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(expandafter_fn).with_doc(EXPANDAFTER_DOC)
}

fn expandafter_fn<S: TexlangState>(
    _: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let next = input.unexpanded().next_or_err(ExpandafterEndOfInputError {
        which: "first",
    })?;
    if input.unexpanded().peek()?.is_none() {
        return Err(error::EofError::new(ExpandafterEndOfInputError { which: "second" }).into());
    }
    input.expanded().expand_once()?;
    input.expansions_mut().push(next);
    Ok(())
}

#[derive(Debug)]
struct ExpandafterEndOfInputError {
    which: &'static str,
}

impl error::EndOfInputError for ExpandafterEndOfInputError {
    fn doing(&self) -> String {
        format![r"reading the {} token after an \expandafter command", self.which]
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![r"\expandafter must be followed by 2 tokens".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use std::collections::HashMap;
    use texlang_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexlangState for State {
        fn expansion_override_hook(
            token: token::Token,
            input: &mut vm::ExpansionInput<Self>,
            tag: Option<command::Tag>,
        ) -> txl::Result<Option<token::Token>> {
            noexpand_hook(token, input, tag)
        }
    }

    vm::implement_has_component![
        State,
        (prefix::Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("expandafter", get_expandafter()),
            ("noexpand", get_noexpand()),
            ("relax", get_relax()),
        ])
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (relax, r"a\relax b", "ab"),
            (expandafter_only_tokens, r"\expandafter1 2", "1 2"),
            (
                expandafter_last_is_macro,
                r"\def\A{a}\def\B{b}\expandafter\A\B",
                "ab"
            ),
            (
                expandafter_order,
                r"\def\mk#1{\def\C{#1}}\def\A{x}\expandafter\mk\expandafter{\A}\def\A{y}\C",
                "x"
            ),
            (
                expandafter_no_expansion,
                r"\def\mk#1{\def\C{#1}}\def\A{x}\mk{\A}\def\A{y}\C",
                "y"
            ),
            (
                noexpand_in_def_body_argument,
                r"\def\A{a}\def\B{b}\expandafter\def\expandafter\C\expandafter{\noexpand\A\B}\def\A{z}\C",
                "zb"
            ),
        ),
        error_kind_tests(
            (expandafter_end_of_input_first, r"\expandafter", error::EofError),
            (expandafter_end_of_input_second, r"\def\A{}\expandafter\A", error::EofError),
            (noexpand_end_of_input, r"\noexpand", error::EofError),
        ),
    ];

    fn built_in_commands_without_hook() -> HashMap<&'static str, command::BuiltIn<texlang_testing::State>> {
        HashMap::from([("noexpand", get_noexpand())])
    }

    #[test]
    fn noexpand_without_hook_fails() {
        run_error_kind_test::<texlang_testing::State, error::SimpleTokenError>(
            r"\noexpand a",
            &[TestOption::BuiltInCommands(built_in_commands_without_hook)],
        );
    }
}
