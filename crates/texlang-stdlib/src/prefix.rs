//! The `\global` prefix command
//!
//! `\global` changes the behavior, at run time, of the command that follows it.
//! The approach here has two parts.
//!
//! For variable assignments the VM asks the state whether the assignment is global
//!     through [TexlangState::variable_assignment_scope_hook].
//! States using this module should forward that hook to [variable_assignment_scope_hook].
//!
//! For commands, this module maintains a [Component] with a `global` flag that
//!     is set by `\global`.
//! Commands that can be prefixed read the flag using [Component::take_global],
//!     which returns the flag and resets it to false.
//! It is essential that *all* code paths within such a command call
//!     [take_global](Component::take_global), even if they don't use the result.
//! For example `\gdef` always defines its macro globally, but it still needs to
//!     call [take_global](Component::take_global);
//!     otherwise the flag would leak into the next assignment.
//!
//! The commands that can be prefixed are variables and the commands with one
//!     of the tags in [is_prefixable].

use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

use crate::alias;
use crate::def;
use crate::namespace;

pub const GLOBAL_DOC: &str = "Make the next assignment global";

/// Component for the `\global` prefix.
#[derive(Default)]
pub struct Component {
    global: bool,
}

impl Component {
    /// Get the value of the global flag and reset the flag to false.
    ///
    /// See the module documentation for correct usage of this method.
    #[inline]
    pub fn take_global(&mut self) -> bool {
        std::mem::take(&mut self.global)
    }
}

/// Variable assignment scope hook for states that support `\global`.
#[inline]
pub fn variable_assignment_scope_hook<S: HasComponent<Component>>(state: &mut S) -> bool {
    state.component_mut().take_global()
}

static GLOBAL_TAG: command::StaticTag = command::StaticTag::new();

/// Get the `\global` command.
pub fn get_global<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(global_primitive_fn)
        .with_tag(GLOBAL_TAG.get())
        .with_doc(GLOBAL_DOC)
}

/// Whether a command with this tag can follow `\global`.
pub fn is_prefixable(tag: command::Tag) -> bool {
    tag == GLOBAL_TAG.get()
        || tag == def::def_tag()
        || tag == alias::let_tag()
        || tag == namespace::namespace_tag()
}

fn global_primitive_fn<S: HasComponent<Component>>(
    global_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let token = match input.peek()? {
        None => return Err(EndOfInputAfterGlobal { global_token }.into()),
        Some(&token) => token,
    };
    let prefixable = match token.value() {
        token::Value::CommandRef(command_ref) => match input.groups().command(&command_ref) {
            Some(command::Command::Variable(_)) => true,
            Some(cmd) => cmd.tag().map(is_prefixable).unwrap_or(false),
            None => false,
        },
        _ => false,
    };
    if !prefixable {
        let description = token.value().describe(input.vm().cs_name_interner());
        return Err(CannotBePrefixedError {
            token,
            global_token,
            description,
        }
        .into());
    }
    input.state_mut().component_mut().global = true;
    Ok(())
}

/// Error returned when the input ends just after `\global`.
#[derive(Debug)]
pub struct EndOfInputAfterGlobal {
    pub global_token: token::Token,
}

impl error::TexError for EndOfInputAfterGlobal {
    fn kind(&self) -> error::Kind {
        error::Kind::EndOfInput
    }

    fn title(&self) -> String {
        r"unexpected end of input after \global".into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![
            error::Note::SourceCodeTrace("the prefix is here:".into(), self.global_token),
            r"\global must be followed by an assignment like \def or \count 1 = 2".into(),
        ]
    }
}

/// Error returned when `\global` is followed by something that is not an assignment.
#[derive(Debug)]
pub struct CannotBePrefixedError {
    pub token: token::Token,
    pub global_token: token::Token,
    /// Description of the token, like "the control sequence \relax".
    pub description: String,
}

impl error::TexError for CannotBePrefixedError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!(r"{} cannot be prefixed with \global", self.description)
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![
            error::Note::SourceCodeTrace("the prefix is here:".into(), self.global_token),
            r"\global can only be applied to variable assignments, \def, \gdef, \let and \namespace".into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion;
    use crate::registers;
    use crate::the;
    use std::collections::HashMap;
    use texlang_testing::*;

    #[derive(Default)]
    struct State {
        prefix: Component,
        testing: TestingComponent,
    }

    impl TexlangState for State {
        fn variable_assignment_scope_hook(state: &mut Self) -> bool {
            variable_assignment_scope_hook(state)
        }
    }

    vm::implement_has_component![
        State,
        (Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("assertglobalisfalse", get_assert_global_is_false()),
            ("count", registers::get_count()),
            ("def", def::get_def()),
            ("gdef", def::get_gdef()),
            ("global", get_global()),
            ("let", alias::get_let()),
            ("namespace", namespace::get_namespace()),
            ("relax", expansion::get_relax()),
            ("the", the::get_the()),
            ("i", TestingComponent::get_integer()),
        ])
    }

    fn get_assert_global_is_false() -> command::BuiltIn<State> {
        command::BuiltIn::new_execution(|token, input| {
            if input.state_mut().prefix.take_global() {
                Err(error::SimpleTokenError::new(token, "the global flag is set").into())
            } else {
                Ok(())
            }
        })
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (local_variable, r"\i=1{\i=2}\the\i", "1"),
            (global_variable, r"\i=1{\global\i=2}\the\i", "2"),
            (global_register, r"{\global\count 3=5}\the\count3", "5"),
            (global_survives_nested_groups, r"{{{\global\i=7}}}\the\i", "7"),
            (global_visible_before_close, r"{{\global\i=7}\the\i}", "7"),
            (global_flag_reset_by_variable, r"{\global\i=7\i=8}\the\i", "7"),
            (global_def, r"{\global\def\A{a}}\A", "a"),
            (global_global_def, r"{\global\global\def\A{a}}\A", "a"),
            (global_let, r"\def\A{a}{\global\let\B=\A}\B", "a"),
            (global_flag_reset_by_def, r"\global\def\A{a}\assertglobalisfalse", ""),
            (global_flag_reset_by_gdef, r"\global\gdef\A{a}\assertglobalisfalse", ""),
            (global_flag_reset_by_let, r"\global\let\A=\B\assertglobalisfalse", ""),
            (global_flag_reset_by_namespace, r"\global\namespace{tex}\assertglobalisfalse", ""),
            (def_without_global_is_local, r"\def\A{a}{\def\A{b}}\A", "a"),
        ),
        error_kind_tests(
            (global_end_of_input, r"\global", EndOfInputAfterGlobal),
            (global_character, r"\global a", CannotBePrefixedError),
            (global_relax, r"\global\relax", CannotBePrefixedError),
            (global_undefined, r"\global\undefined", CannotBePrefixedError),
        ),
    ];
}
