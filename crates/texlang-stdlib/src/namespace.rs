//! The `\namespace` primitive
//!
//! Command bindings are keyed by namespace.
//! Lookups in a namespace other than the root namespace [group::ROOT_NAMESPACE]
//!     fall back to the root namespace, unless the host disables resolution with
//!     [group::GroupChain::set_namespace_resolution].

use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

use crate::prefix;

pub const NAMESPACE_DOC: &str = "Set the current namespace";

static NAMESPACE_TAG: command::StaticTag = command::StaticTag::new();

/// Tag of the `\namespace` command.
pub fn namespace_tag() -> command::Tag {
    NAMESPACE_TAG.get()
}

/// Get the `\namespace` command.
pub fn get_namespace<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(namespace_primitive_fn)
        .with_tag(NAMESPACE_TAG.get())
        .with_doc(NAMESPACE_DOC)
}

fn namespace_primitive_fn<S: HasComponent<prefix::Component>>(
    namespace_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let global = input.state_mut().component_mut().take_global();
    let name = parse_name(namespace_token, input.unexpanded())?;
    log::trace!("setting namespace to {name} (global={global})");
    input.groups_mut().set_namespace(&name, global);
    Ok(())
}

fn parse_name<S: TexlangState>(
    namespace_token: token::Token,
    input: &mut vm::UnexpandedStream<S>,
) -> txl::Result<String> {
    let opening = loop {
        let token = input.next_or_err(NamespaceEndOfInputError {})?;
        match token.value() {
            token::Value::Space(_) => continue,
            token::Value::BeginGroup(_) => break token,
            _ => {
                return Err(parse::Error::new(
                    "an opening brace",
                    Some(token),
                    r"the namespace name must be enclosed in braces, like \namespace{foo}",
                )
                .into())
            }
        }
    };
    let mut name = String::new();
    loop {
        let token = match input.next()? {
            None => return Err(parse::UnbalancedTokensError { opening }.into()),
            Some(token) => token,
        };
        match token.value() {
            token::Value::EndGroup(_) => break,
            token::Value::Letter(c) | token::Value::Other(c) => name.push(c),
            _ => {
                return Err(NamespaceNameError {
                    token,
                    namespace_token,
                    description: token.value().describe(input.vm().cs_name_interner()),
                }
                .into())
            }
        }
    }
    if name.is_empty() {
        return Err(NamespaceNameError {
            token: opening,
            namespace_token,
            description: "an empty name".into(),
        }
        .into());
    }
    Ok(name)
}

#[derive(Debug)]
struct NamespaceEndOfInputError;

impl error::EndOfInputError for NamespaceEndOfInputError {
    fn doing(&self) -> String {
        r"reading the name after \namespace".into()
    }
}

/// Error returned when a namespace name contains something other than letters or other characters.
#[derive(Debug)]
pub struct NamespaceNameError {
    pub token: token::Token,
    pub namespace_token: token::Token,
    pub description: String,
}

impl error::TexError for NamespaceNameError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!["{} is not allowed in a namespace name", self.description]
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![
            error::Note::SourceCodeTrace("the namespace is being set here:".into(), self.namespace_token),
            "namespace names are non-empty sequences of letters and other characters".into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{def, the};
    use std::collections::HashMap;
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
            ("def", def::get_def()),
            ("global", prefix::get_global()),
            ("namespace", get_namespace()),
            ("the", the::get_the()),
            ("i", TestingComponent::get_integer()),
        ])
    }

    fn disable_resolution(vm: &mut vm::VM<State>) {
        vm.groups.set_namespace_resolution(false);
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (root_macro_visible_in_namespace, r"\def\A{root}\namespace{foo}\A", "root"),
            (
                namespace_macro_shadows_root,
                r"\def\A{root}\namespace{foo}\def\A{foo}\A-\namespace{tex}\A",
                "foo-root"
            ),
            (
                namespaces_are_independent,
                r"\namespace{foo}\def\A{foo}\namespace{bar}\def\A{bar}\A\namespace{foo}\A",
                "barfoo"
            ),
            (
                namespace_reverts_at_group_end,
                r"\def\A{root}{\namespace{foo}\def\A{foo}}\A",
                "root"
            ),
            (
                global_namespace_survives_group,
                r"\def\A{root}\namespace{foo}\def\A{foo}\namespace{tex}{\global\namespace{foo}}\A",
                "foo"
            ),
            (space_before_name, r"\namespace {foo}\def\A{a}\A", "a"),
            (
                variables_are_not_namespaced,
                r"\i=3 \namespace{foo}\the\i",
                "3"
            ),
        ),
        error_kind_tests(
            (
                namespace_macro_not_visible_in_root,
                r"\namespace{foo}\def\B{b}\namespace{tex}\B",
                error::UndefinedCommandError
            ),
            (
                namespace_macro_not_visible_after_group,
                r"{\namespace{foo}\def\B{b}}\B",
                error::UndefinedCommandError
            ),
            (name_without_braces, r"\namespace foo", parse::Error),
            (name_with_control_sequence, r"\namespace{\A}", NamespaceNameError),
            (empty_name, r"\namespace{}", NamespaceNameError),
            (name_ended_by_line_end_space, r"\namespace{foo", NamespaceNameError),
            (end_of_input, r"\namespace", error::EofError),
        ),
    ];

    #[test]
    fn root_macro_hidden_without_resolution() {
        run_error_kind_test::<State, error::UndefinedCommandError>(
            r"\def\A{root}\namespace{foo}\A",
            &[
                TestOption::BuiltInCommands(built_in_commands),
                TestOption::CustomVMInitialization(disable_resolution),
            ],
        );
    }
}
