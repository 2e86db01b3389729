//! The `\the` expansion primitive

use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

pub const THE_DOC: &str = "Output text describing some inputted tokens";

/// Get the `\the` expansion primitive.
pub fn get_the<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(the_primitive_fn).with_doc(THE_DOC)
}

fn the_primitive_fn<S: TexlangState>(
    the_token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let token = input.next_or_err(TheEndOfInputError {})?;
    let cmd = match token.value() {
        token::Value::CommandRef(command_ref) => match input.vm().groups.command(&command_ref) {
            Some(command::Command::Variable(cmd)) => Some(cmd.clone()),
            _ => None,
        },
        _ => None,
    };
    let cmd = match cmd {
        None => {
            return Err(TheError {
                token,
                description: token.value().describe(input.vm().cs_name_interner()),
            }
            .into())
        }
        Some(cmd) => cmd,
    };
    match cmd.value(token, input.expanded())? {
        variable::Value::Int(i) => {
            input.push_string_tokens(the_token, &i.to_string());
        }
        variable::Value::Dimen(scaled) => {
            input.push_string_tokens(the_token, &scaled.to_string());
        }
        variable::Value::Glue(glue) => {
            input.push_string_tokens(the_token, &glue.to_string());
        }
        variable::Value::MuGlue(glue) => {
            let mut s = String::new();
            if glue.write_with_unit(&mut s, "mu").is_err() {
                return Err(error::SimpleTokenError::new(the_token, "failed to format a muglue value").into());
            }
            input.push_string_tokens(the_token, &s);
        }
        variable::Value::TokenList(token_list) => {
            input.expansions_mut().extend(token_list.iter().rev());
        }
    }
    Ok(())
}

#[derive(Debug)]
struct TheEndOfInputError;

impl error::EndOfInputError for TheEndOfInputError {
    fn doing(&self) -> String {
        r"reading the argument of \the".into()
    }
}

/// Error returned when `\the` is applied to something other than a variable.
#[derive(Debug)]
pub struct TheError {
    pub token: token::Token,
    pub description: String,
}

impl error::TexError for TheError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format![r"\the cannot be applied to {}", self.description]
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![r"\the can only be applied to variables like \count 1 or \tracingifs".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;
    use crate::expansion;
    use crate::registers;
    use std::collections::HashMap;
    use texlang_testing::*;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("catcode", codes::get_catcode()),
            ("count", registers::get_count()),
            ("dimen", registers::get_dimen()),
            ("muskip", registers::get_muskip()),
            ("relax", expansion::get_relax()),
            ("skip", registers::get_skip()),
            ("the", get_the()),
            ("toks", registers::get_toks()),
            ("i", TestingComponent::get_integer()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (the_integer, r"\i=-17 \the\i", "-17"),
            (the_zero, r"\the\i", "0"),
            (the_register, r"\count 5=13 \the\count 5", "13"),
            (the_toks, r"\toks 0={ab}\the\toks 0", "ab"),
            (the_catcode, r"\the\catcode`\{", "1"),
            (the_catcode_default_letter, r"\the\catcode`\a", "11"),
        ),
        error_kind_tests(
            (the_character, r"\the a", TheError),
            (the_undefined, r"\the\undefined", TheError),
            (the_end_of_input, r"\the", error::EofError),
        ),
    ];

    // \the produces other tokens, so letters in the expected output are recategorized first.
    // The t goes last because \catcode is spelled with it.
    fn run_with_letters_as_other(lhs: &str, rhs: &str) {
        let mut expected = String::new();
        for c in "plusminft".chars() {
            expected.push_str(&format!["\\catcode`\\{c}=12 "]);
        }
        expected.push_str(rhs);
        run_expansion_equality_test::<State>(
            lhs,
            &expected,
            &[TestOption::BuiltInCommands(built_in_commands)],
        );
    }

    #[test]
    fn the_dimen() {
        run_with_letters_as_other(r"\dimen 1=2pt \the\dimen 1", "2.0pt");
    }

    #[test]
    fn the_negative_dimen() {
        run_with_letters_as_other(r"\dimen 1=-1.5pt \the\dimen 1", "-1.5pt");
    }

    #[test]
    fn the_skip() {
        run_with_letters_as_other(
            r"\skip 1=1pt plus 2fil minus 3pt\relax\the\skip 1",
            "1.0pt plus 2.0fil minus 3.0pt",
        );
    }

    #[test]
    fn the_muskip() {
        run_with_letters_as_other(
            r"\muskip 1=4mu plus 1fill\relax\the\muskip 1",
            "4.0mu plus 1.0fill",
        );
    }
}
