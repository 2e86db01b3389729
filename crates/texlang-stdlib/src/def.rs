//! Primitives for creating user-defined macros (`\def` and `\gdef`)

use std::rc::Rc;
use texlang::prelude as txl;
use texlang::texmacro::{Macro, Parameter, Replacement};
use texlang::token::Value;
use texlang::traits::*;
use texlang::*;

use crate::prefix;

pub const DEF_DOC: &str = "Define a custom macro";
pub const GDEF_DOC: &str = "Define a custom macro globally";

static DEF_TAG: command::StaticTag = command::StaticTag::new();

/// The tag shared by `\def` and `\gdef`.
pub fn def_tag() -> command::Tag {
    DEF_TAG.get()
}

/// Get the `\def` command.
pub fn get_def<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(def_primitive_fn)
        .with_tag(def_tag())
        .with_doc(DEF_DOC)
}

/// Get the `\gdef` command.
pub fn get_gdef<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(gdef_primitive_fn)
        .with_tag(def_tag())
        .with_doc(GDEF_DOC)
}

fn def_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    parse_and_set_macro(def_token, input, false)
}

fn gdef_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    parse_and_set_macro(def_token, input, true)
}

fn parse_and_set_macro<S: HasComponent<prefix::Component>>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
    set_globally_override: bool,
) -> txl::Result<()> {
    let mut global = input.state_mut().component_mut().take_global();
    if set_globally_override {
        global = true;
    }
    let name = token::CommandRef::parse(input)?;
    let (prefix, parameters, replacement_end_token) =
        parse_prefix_and_parameters(input.unexpanded())?;
    let replacements =
        parse_replacement_text(input.unexpanded(), replacement_end_token, parameters.len())?;
    let user_defined_macro = Macro::new(prefix, parameters, replacements);
    log::trace!(
        "defining {} with {} parameter(s), global={global}",
        name.to_string(input.vm().cs_name_interner()),
        user_defined_macro.parameters().len(),
    );
    input.groups_mut().set_command(
        name,
        Some(command::Command::Macro(Rc::new(user_defined_macro))),
        global,
    );
    Ok(())
}

enum RawParameter {
    Undelimited,
    Delimited(Vec<Value>),
}

impl RawParameter {
    fn push(&mut self, value: Value) {
        match self {
            RawParameter::Undelimited => {
                *self = RawParameter::Delimited(vec![value]);
            }
            RawParameter::Delimited(vec) => {
                vec.push(value);
            }
        }
    }
}

fn char_to_parameter_index(c: char) -> Option<usize> {
    match c {
        '1'..='9' => Some(c as usize - '1' as usize),
        _ => None,
    }
}

const PARAMETER_GUIDANCE: &str =
    "a parameter token must be followed by a single digit number, another parameter token, or a begin group token {";

fn parse_prefix_and_parameters<S: TexlangState>(
    input: &mut vm::UnexpandedStream<S>,
) -> txl::Result<(Vec<token::Token>, Vec<Parameter>, Option<token::Token>)> {
    let mut prefix = Vec::new();
    let mut parameters: Vec<RawParameter> = Vec::new();
    let mut replacement_end_token = None;

    loop {
        let token = input.next_or_err(DefEndOfInputError {
            doing: "reading the parameter text of a macro",
            note: "the parameter text of a macro must end with a begin group token {",
        })?;
        match token.value() {
            Value::BeginGroup(_) => {
                break;
            }
            Value::EndGroup(_) => {
                return Err(DefError {
                    token,
                    title: "unexpected end group token while reading the parameter text of a macro",
                    note: "the parameter text of a macro must end with a begin group token {".into(),
                }
                .into());
            }
            Value::Parameter(_) => {
                let parameter_token = input.next_or_err(DefEndOfInputError {
                    doing: "reading the token after a parameter token",
                    note: PARAMETER_GUIDANCE,
                })?;
                match parameter_token.value() {
                    Value::BeginGroup(_) => {
                        // The #{ rule: the brace delimits the last parameter and is also
                        // placed at the end of the replacement text.
                        replacement_end_token = Some(parameter_token);
                        match parameters.last_mut() {
                            None => {
                                prefix.push(parameter_token);
                            }
                            Some(spec) => {
                                spec.push(parameter_token.value());
                            }
                        }
                        break;
                    }
                    value => {
                        let parameter_index = match value.char().and_then(char_to_parameter_index) {
                            None => {
                                return Err(DefError {
                                    token: parameter_token,
                                    title: "unexpected token after a parameter token",
                                    note: PARAMETER_GUIDANCE.into(),
                                }
                                .into());
                            }
                            Some(n) => n,
                        };
                        if parameter_index != parameters.len() {
                            return Err(DefError {
                                token: parameter_token,
                                title: "unexpected parameter number",
                                note: format![
                                    "this macro has {} parameter(s) so far, so parameter number #{} was expected",
                                    parameters.len(),
                                    parameters.len() + 1
                                ],
                            }
                            .into());
                        }
                        parameters.push(RawParameter::Undelimited);
                    }
                }
            }
            value => match parameters.last_mut() {
                None => {
                    prefix.push(token);
                }
                Some(parameter) => {
                    parameter.push(value);
                }
            },
        }
    }
    let parameters = parameters
        .into_iter()
        .map(|raw| match raw {
            RawParameter::Undelimited => Parameter::Undelimited,
            RawParameter::Delimited(values) => Parameter::Delimited(values),
        })
        .collect();
    Ok((prefix, parameters, replacement_end_token))
}

fn parse_replacement_text<S: TexlangState>(
    input: &mut vm::UnexpandedStream<S>,
    opt_final_token: Option<token::Token>,
    num_parameters: usize,
) -> txl::Result<Vec<Replacement>> {
    let mut result = vec![];
    let mut scope_depth = 0_usize;
    let push = |result: &mut Vec<Replacement>, token| match result.last_mut() {
        Some(Replacement::Tokens(tokens)) => {
            tokens.push(token);
        }
        _ => {
            result.push(Replacement::Tokens(vec![token]));
        }
    };

    loop {
        let token = input.next_or_err(DefEndOfInputError {
            doing: "reading the replacement text of a macro",
            note: "the replacement text of a macro must end with an end group token }",
        })?;
        match token.value() {
            Value::BeginGroup(_) => {
                scope_depth += 1;
            }
            Value::EndGroup(_) => {
                if scope_depth == 0 {
                    if let Some(final_token) = opt_final_token {
                        push(&mut result, final_token);
                    }
                    return Ok(result);
                }
                scope_depth -= 1;
            }
            Value::Parameter(_) => {
                let parameter_token = input.next_or_err(DefEndOfInputError {
                    doing: "reading a parameter number in the replacement text of a macro",
                    note: "expected a number between 1 and 9 inclusive, or another parameter token",
                })?;
                if let Value::Parameter(_) = parameter_token.value() {
                    push(&mut result, parameter_token);
                    continue;
                }
                let parameter_index = parameter_token
                    .char()
                    .and_then(char_to_parameter_index)
                    .filter(|i| *i < num_parameters);
                match parameter_index {
                    None => {
                        return Err(DefError {
                            token: parameter_token,
                            title: "unexpected token while reading a parameter number",
                            note: match num_parameters {
                                0 => "this macro has no parameters, so parameter tokens must be doubled".into(),
                                1 => "this macro has only 1 parameter, so the number must be 1".into(),
                                n => format!["expected a number between 1 and {n} inclusive because this macro has {n} parameters"],
                            },
                        }
                        .into())
                    }
                    Some(i) => {
                        result.push(Replacement::Parameter(i));
                        continue;
                    }
                }
            }
            _ => {}
        }
        push(&mut result, token);
    }
}

#[derive(Debug)]
struct DefEndOfInputError {
    doing: &'static str,
    note: &'static str,
}

impl error::EndOfInputError for DefEndOfInputError {
    fn doing(&self) -> String {
        self.doing.into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![self.note.into()]
    }
}

/// Error returned when the parameter or replacement text of a macro definition is malformed.
#[derive(Debug)]
pub struct DefError {
    pub token: token::Token,
    pub title: &'static str,
    pub note: String,
}

impl error::TexError for DefError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        self.title.into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![self.note.clone().into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
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
            ("def", get_def()),
            ("gdef", get_gdef()),
            ("global", prefix::get_global()),
        ])
    }

    test_suite![
        state(State),
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (def_parsed_successfully, r"\def\A{abc}", ""),
            (output_is_correct, r"\def\A{abc}\A", "abc"),
            (output_twice, r"\def\A{abc}\A\A", "abcabc"),
            (parse_one_parameter, r"\def\A#1{a-#1-b}", ""),
            (one_undelimited_parameter, r"\def\A#1{a-#1-b}\A1", "a-1-b"),
            (one_undelimited_parameter_multiple_times, r"\def\A#1{#1 #1 #1}\A1", "1 1 1"),
            (one_undelimited_parameter_multiple_tokens, r"\def\A#1{a-#1-b}\A{123}", "a-123-b"),
            (two_undelimited_parameters, r"\def\A#1#2{#2-#1}\A56", "6-5"),
            (two_undelimited_parameters_multiple_token_inputs, r"\def\A#1#2{#2-#1}\A{abc}{xyz}", "xyz-abc"),
            (consume_prefix_correctly, r"\def\A fgh{567}\A fghi", "567i"),
            (one_undelimited_parameter_with_prefix, r"\def\A abc#1{y#1z}\A abcdefg", "ydzefg"),
            (one_delimited_parameter, r"\def\A #1xxx{y#1z}\A abcxxx", "yabcz"),
            (one_delimited_parameter_empty, r"\def\A #1xxx{y#1z}\A xxx", "yz"),
            (one_delimited_parameter_with_scope, r"\def\A #1xxx{#1}\A abc{123xxx}xxx", "abc{123xxx}"),
            (one_delimited_parameter_with_prefix, r"\def\A a#1c{x#1y}\A abcdef", "xbydef"),
            (two_delimited_parameters_with_prefix, r"\def\A a#1c#2e{x#2y#1z}\A abcdef", "xdybzf"),
            (one_delimited_parameter_grouped_value, r"\def\A #1c{x#1y}\A {Hello}c", "xHelloy"),
            (parameter_brace_special_case, r"\def\A #{Mint}\A{&}", "Mint{&}"),
            (parameter_brace_special_case_with_parameter, r"\def\A #1#{x#1y}\A a{b}", "xay{b}"),
            (grouping, r"\def\A{Hello}{\def\A{World}\A} \A", "World Hello"),
            (gdef_is_global, r"{\gdef\A{World}}\A", "World"),
            (global_def_is_global, r"{\global\def\A{World}}\A", "World"),
            (texbook_exercise_20_1, r"\def\mustnt{I must not talk in class.}\def\five{\mustnt\mustnt\mustnt\mustnt\mustnt}\def\twenty{\five\five\five\five}\def\punishment{\twenty\twenty\twenty\twenty\twenty}\punishment", "I must not talk in class.".repeat(100)),
            (texbook_exercise_20_2, r"\def\a#1{\def\b##1{##1#1}}\a!\b{Hello}", "Hello!"),
            (doubled_parameter_token, r"\def\A{##}\def\B#1{#1}\B{x}", "x"),
            (redefinition_in_terms_of_parameters, r"\def\A#1#2{\def\B{#2#1}}\A xy\B", "yx"),
        ),
        error_kind_tests(
            (end_of_input_scanning_target, r"\def", parse::Error),
            (end_of_input_scanning_argument_text, r"\def\A", error::EofError),
            (end_of_input_scanning_replacement, r"\def\A{", error::EofError),
            (end_of_input_scanning_nested_replacement, r"\def\A{{}", error::EofError),
            (end_group_in_parameter_text, r"\def\A}", DefError),
            (unexpected_parameter_number_in_parameter_text, r"\def\A#2{}", DefError),
            (unexpected_parameter_token_in_parameter_text, r"\def\A#a{}", DefError),
            (unexpected_parameter_number_in_replacement, r"\def\A{#2}", DefError),
            (unexpected_parameter_number_in_replacement_2, r"\def\A#1{#2}", DefError),
            (unexpected_parameter_token_in_replacement, r"\def\A#1{#a}", DefError),
            (target_is_a_character, r"\def a{}", parse::Error),
        ),
    ];
}
