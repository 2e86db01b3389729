//! Tracing parameters (`\tracingifs`, `\tracinggroups`)
//!
//! When one of these integer parameters is positive, the corresponding
//!     machinery writes a line to the terminal each time something happens.
//! The format of the lines follows e-TeX.

use texlang::group::RegisterKey;
use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

pub const TRACINGIFS_DOC: &str = "When positive, conditionals are logged as they are entered and left";
pub const TRACINGGROUPS_DOC: &str = "When positive, groups are logged as they are entered and left";

const TRACINGIFS: RegisterKey = RegisterKey::Named("tracingifs");
const TRACINGGROUPS: RegisterKey = RegisterKey::Named("tracinggroups");

/// Get the `\tracingifs` integer parameter.
pub fn get_tracingifs<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_singleton(
        variable::Kind::Int,
        "tracingifs",
    ))
    .with_doc(TRACINGIFS_DOC)
}

/// Get the `\tracinggroups` integer parameter.
pub fn get_tracinggroups<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_singleton(
        variable::Kind::Int,
        "tracinggroups",
    ))
    .with_doc(TRACINGGROUPS_DOC)
}

/// Whether conditionals are currently being traced.
#[inline]
pub fn tracing_ifs<S>(vm: &vm::VM<S>) -> bool {
    vm.groups.int(TRACINGIFS) > 0
}

/// Whether groups are currently being traced.
#[inline]
pub fn tracing_groups<S>(vm: &vm::VM<S>) -> bool {
    vm.groups.int(TRACINGGROUPS) > 0
}

/// Writes a tracing line to the terminal.
///
/// The token is used in the error if the terminal cannot be written to.
pub fn write_line<S>(vm: &vm::VM<S>, token: token::Token, line: &str) -> txl::Result<()> {
    let mut terminal_out = vm.terminal_out.borrow_mut();
    if let Err(err) = writeln!(terminal_out, "{line}") {
        return Err(error::SimpleTokenError::new(
            token,
            format!("failed to write a tracing line to the terminal: {err}"),
        )
        .into());
    }
    Ok(())
}

/// Group change hook that implements `\tracinggroups`.
///
/// States that support `\tracinggroups` should call this from
///     [TexlangState::group_change_hook].
pub fn group_change_hook<S: TexlangState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
    change: vm::GroupChange,
) -> txl::Result<()> {
    if !tracing_groups(input.vm()) {
        return Ok(());
    }
    let level = input.groups().level();
    let line = match change {
        vm::GroupChange::Began(group_type) => {
            let line_number = input.trace(token).line_number;
            format!("{{entering {group_type} (level {level}) at line {line_number}}}")
        }
        vm::GroupChange::Ending(group_type) => {
            let entered_at = match input.groups().locator() {
                None => String::new(),
                Some(locator) => format!(" entered at line {}", input.trace(locator).line_number),
            };
            format!("{{leaving {group_type} (level {level}){entered_at}}}")
        }
    };
    write_line(input.vm(), token, &line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group;
    use crate::the;
    use std::collections::HashMap;
    use texlang_testing::*;

    #[derive(Default)]
    struct State {
        testing: TestingComponent,
    }

    impl TexlangState for State {
        fn group_change_hook(
            token: token::Token,
            input: &mut vm::ExecutionInput<Self>,
            change: vm::GroupChange,
        ) -> txl::Result<()> {
            group_change_hook(token, input, change)
        }
    }

    vm::implement_has_component![State, TestingComponent, testing];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("tracinggroups", get_tracinggroups()),
            ("tracingifs", get_tracingifs()),
            ("begingroup", group::get_begingroup()),
            ("endgroup", group::get_endgroup()),
            ("the", the::get_the()),
        ])
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (tracing_parameter_is_scoped, r"{\tracingifs=1 }\the\tracingifs", r"0"),
        ),
        terminal_output_tests(
            (no_tracing_by_default, r"{}\begingroup\endgroup", ""),
            (
                simple_group,
                "\\tracinggroups=1\n{\n}",
                "{entering simple group (level 1) at line 2}\n{leaving simple group (level 1) entered at line 2}\n"
            ),
            (
                nested_groups,
                r"\tracinggroups=1{\begingroup\endgroup}",
                concat!(
                    "{entering simple group (level 1) at line 1}\n",
                    "{entering semi simple group (level 2) at line 1}\n",
                    "{leaving semi simple group (level 2) entered at line 1}\n",
                    "{leaving simple group (level 1) entered at line 1}\n",
                )
            ),
            (
                tracing_turned_off_inside_group,
                r"\tracinggroups=1{\tracinggroups=0 }",
                "{entering simple group (level 1) at line 1}\n"
            ),
        ),
    ];
}
