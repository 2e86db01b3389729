//! Implementation of TeX user defined macros.

use crate::error;
use crate::prelude as txl;
use crate::token::Token;
use crate::token::Value;
use crate::traits::*;
use crate::vm;

/// A TeX Macro.
///
/// Two macros are equal if they have the same prefix, parameters and replacement text.
/// This is the equality `\ifx` uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    prefix: Vec<Token>,
    parameters: Vec<Parameter>,
    replacements: Vec<Replacement>,
}

/// A token list or parameter in a replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// A list of tokens, in order.
    Tokens(Vec<Token>),

    /// A parameter.
    ///
    /// In order to be valid, the parameters index must be less than the number
    /// of parameters in the macro.
    Parameter(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    Undelimited,
    /// A parameter whose argument ends with the provided (non-empty) list of token values.
    Delimited(Vec<Value>),
}

impl Macro {
    /// Create a new macro.
    pub fn new(
        prefix: Vec<Token>,
        parameters: Vec<Parameter>,
        replacements: Vec<Replacement>,
    ) -> Macro {
        Macro {
            prefix,
            parameters,
            replacements,
        }
    }

    pub fn prefix(&self) -> &[Token] {
        &self.prefix
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Expands the macro, reading its arguments from the input.
    pub fn call<S: TexlangState>(
        &self,
        token: Token,
        input: &mut vm::ExpansionInput<S>,
    ) -> txl::Result<()> {
        remove_tokens_from_stream(token, &self.prefix, input.unexpanded())?;
        let mut argument_indices: Vec<(usize, usize)> = Vec::with_capacity(self.parameters.len());
        let mut argument_tokens = input.checkout_token_buffer();
        for (i, parameter) in self.parameters.iter().enumerate() {
            let start = argument_tokens.len();
            let trim_outer_braces =
                parameter.parse_argument(input.unexpanded(), i + 1, &mut argument_tokens)?;
            argument_indices.push(match trim_outer_braces {
                true => (start + 1, argument_tokens.len() - 1),
                false => (start, argument_tokens.len()),
            });
        }
        let arguments: Vec<&[Token]> = argument_indices
            .iter()
            .map(|(i, j)| &argument_tokens[*i..*j])
            .collect();
        Macro::perform_replacement(&self.replacements, &arguments, input.expansions_mut());
        input.return_token_buffer(argument_tokens);
        Ok(())
    }

    // The result is a stack, so the replacement is pushed in reverse order.
    fn perform_replacement(
        replacements: &[Replacement],
        arguments: &[&[Token]],
        result: &mut Vec<Token>,
    ) {
        for replacement in replacements.iter().rev() {
            match replacement {
                Replacement::Tokens(tokens) => {
                    result.extend(tokens.iter().rev());
                }
                Replacement::Parameter(i) => {
                    if let Some(argument) = arguments.get(*i) {
                        result.extend(argument.iter().rev());
                    }
                }
            }
        }
    }
}

impl Parameter {
    /// Parses the argument for this parameter and appends it to the result.
    ///
    /// Returns whether the argument is surrounded by a pair of braces that should be trimmed.
    fn parse_argument<S: TexlangState>(
        &self,
        stream: &mut vm::UnexpandedStream<S>,
        param_num: usize,
        result: &mut Vec<Token>,
    ) -> txl::Result<bool> {
        match self {
            Parameter::Undelimited => {
                Parameter::parse_undelimited_argument(stream, param_num, result)?;
                Ok(false)
            }
            Parameter::Delimited(delimiter) => {
                Parameter::parse_delimited_argument(stream, delimiter, param_num, result)
            }
        }
    }

    fn parse_delimited_argument<S: TexlangState>(
        stream: &mut vm::UnexpandedStream<S>,
        delimiter: &[Value],
        param_num: usize,
        result: &mut Vec<Token>,
    ) -> txl::Result<bool> {
        let mut scope_depth: usize = 0;
        // A parameter delimited by #{ ends at an unbalanced begin group token.
        let closing_scope_depth = match delimiter.last() {
            Some(Value::BeginGroup(_)) => 1,
            _ => 0,
        };
        let start = result.len();
        loop {
            let token = stream.next_or_err(DelimitedArgumentEndOfInputError { param_num })?;
            match token.value() {
                Value::BeginGroup(_) => {
                    scope_depth += 1;
                }
                Value::EndGroup(_) => {
                    scope_depth = scope_depth.saturating_sub(1);
                }
                _ => (),
            };
            result.push(token);
            if scope_depth == closing_scope_depth
                && result.len() - start >= delimiter.len()
                && result[result.len() - delimiter.len()..]
                    .iter()
                    .map(Token::value)
                    .eq(delimiter.iter().copied())
            {
                result.truncate(result.len() - delimiter.len());
                return Ok(is_single_braced_group(&result[start..]));
            }
        }
    }

    fn parse_undelimited_argument<S: TexlangState>(
        stream: &mut vm::UnexpandedStream<S>,
        param_num: usize,
        result: &mut Vec<Token>,
    ) -> txl::Result<()> {
        let token = loop {
            let token = stream.next_or_err(UndelimitedArgumentEndOfInputError { param_num })?;
            if !matches!(token.value(), Value::Space(_)) {
                break token;
            }
        };
        match token.value() {
            Value::BeginGroup(_) => {
                if !crate::parse::parse_balanced_tokens(stream, result)? {
                    return Err(error::EofError::new(UndelimitedArgumentEndOfInputError {
                        param_num,
                    })
                    .into());
                }
            }
            _ => result.push(token),
        }
        Ok(())
    }
}

// Returns whether the list is {...} where the outer braces match each other.
fn is_single_braced_group(list: &[Token]) -> bool {
    if list.len() < 2 {
        return false;
    }
    let mut depth: usize = 0;
    for (i, token) in list.iter().enumerate() {
        match token.value() {
            Value::BeginGroup(_) => depth += 1,
            Value::EndGroup(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1 == list.len();
                }
            }
            _ => {
                if depth == 0 {
                    return false;
                }
            }
        }
    }
    false
}

#[derive(Debug)]
struct DelimitedArgumentEndOfInputError {
    param_num: usize,
}

impl error::EndOfInputError for DelimitedArgumentEndOfInputError {
    fn doing(&self) -> String {
        "parsing a delimited argument for a macro".into()
    }
    fn notes(&self) -> Vec<error::Note> {
        vec![format!("this is argument number {} for this macro", self.param_num).into()]
    }
}

#[derive(Debug)]
struct UndelimitedArgumentEndOfInputError {
    param_num: usize,
}

impl error::EndOfInputError for UndelimitedArgumentEndOfInputError {
    fn doing(&self) -> String {
        "parsing an undelimited argument for a macro".into()
    }
    fn notes(&self) -> Vec<error::Note> {
        vec![format!("this is argument number {} for this macro", self.param_num).into()]
    }
}

/// Removes the provided vector of tokens from the front of the stream.
///
/// Returns an error if the stream does not start with the tokens.
fn remove_tokens_from_stream<S: TexlangState>(
    macro_token: Token,
    tokens: &[Token],
    stream: &mut vm::UnexpandedStream<S>,
) -> txl::Result<()> {
    for prefix_token in tokens.iter() {
        let stream_token = stream.next_or_err(PrefixEndOfInputError {})?;
        if stream_token.value() != prefix_token.value() {
            return Err(PrefixMismatchError {
                token: stream_token,
                macro_token,
            }
            .into());
        }
    }
    Ok(())
}

#[derive(Debug)]
struct PrefixEndOfInputError;

impl error::EndOfInputError for PrefixEndOfInputError {
    fn doing(&self) -> String {
        "matching the prefix of a user-defined macro".into()
    }
}

#[derive(Debug)]
struct PrefixMismatchError {
    token: Token,
    macro_token: Token,
}

impl error::TexError for PrefixMismatchError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "use of a macro doesn't match its definition".into()
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![error::Note::SourceCodeTrace(
            "the macro was invoked here:".into(),
            self.macro_token,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::trace;

    fn letters(s: &str) -> Vec<Token> {
        s.chars()
            .map(|c| match c {
                '{' => Token::new_begin_group(c, trace::Key::dummy()),
                '}' => Token::new_end_group(c, trace::Key::dummy()),
                _ => Token::new_letter(c, trace::Key::dummy()),
            })
            .collect()
    }

    #[test]
    fn single_braced_group() {
        assert!(is_single_braced_group(&letters("{ab}")));
        assert!(is_single_braced_group(&letters("{a{b}}")));
        assert!(!is_single_braced_group(&letters("{a}{b}")));
        assert!(!is_single_braced_group(&letters("a{b}")));
        assert!(!is_single_braced_group(&letters("{}a")));
        assert!(!is_single_braced_group(&letters("{")));
    }

    #[test]
    fn replacement_order() {
        let replacements = vec![
            Replacement::Tokens(letters("ab")),
            Replacement::Parameter(0),
            Replacement::Tokens(letters("c")),
        ];
        let argument = letters("xy");
        let mut result = vec![];
        Macro::perform_replacement(&replacements, &[&argument], &mut result);
        result.reverse();
        assert_eq!(result, letters("abxyc"));
    }
}
