use crate::prelude as txl;
use crate::token;
use crate::traits::*;
use crate::vm;

/// When parsed, this type consumes an optional `by` keyword from the input stream.
#[derive(Debug, PartialEq, Eq)]
pub struct OptionalBy;

impl<S: TexlangState> Parsable<S> for OptionalBy {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        parse_keyword(input, "by")?;
        Ok(OptionalBy {})
    }
}

/// When parsed, this type consumes a required `to` keyword from the input stream.
#[derive(Debug, PartialEq, Eq)]
pub struct To;

impl<S: TexlangState> Parsable<S> for To {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        if parse_keyword(input, "to")? {
            return Ok(To {});
        }
        let got = input.peek()?.copied();
        Err(crate::parse::Error::new(
            "the `to` keyword",
            got,
            "the `to` keyword consists of a t or T character token, then a o or O character token",
        )
        .into())
    }
}

/// Parses a keyword like `pt` or `plus`, returning whether it was found.
///
/// Leading spaces are skipped.
/// Characters match case insensitively and the category code is ignored.
/// If the keyword is not found every consumed token other than the leading spaces is put back.
///
/// TeX.2021.407
pub fn parse_keyword<S: TexlangState>(
    input: &mut vm::ExpandedStream<S>,
    keyword: &str,
) -> txl::Result<bool> {
    while get_optional_element![
        input,
        token::Value::Space(_) => (),
    ]
    .is_some()
    {}
    let mut consumed: Vec<token::Token> = vec![];
    for expected in keyword.chars() {
        let token = match input.next()? {
            None => break,
            Some(token) => token,
        };
        let matches = match token.value() {
            token::Value::CommandRef(_) => false,
            value => value
                .char()
                .map(|c| c.to_ascii_lowercase() == expected)
                .unwrap_or(false),
        };
        consumed.push(token);
        if !matches {
            break;
        }
        if consumed.len() == keyword.chars().count() {
            return Ok(true);
        }
    }
    for token in consumed.into_iter().rev() {
        input.back(token);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (by_lower, "by", OptionalBy),
        (by_upper, "BY", OptionalBy),
        (by_mixed, " bY", OptionalBy),
        (by_absent, "", OptionalBy),
        (to_lower, "to", To),
        (to_upper, "  TO", To),
    ];

    parse_failure_tests![To, (), (to_missing, "ta"), (to_empty, "")];

    #[test]
    fn keyword_backs_up() {
        let mut vm = vm::VM::<()>::new(Default::default());
        vm.push_source("input.tex", "plum").unwrap();
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(!parse_keyword(input.as_mut(), "plus").unwrap());
        assert!(parse_keyword(input.as_mut(), "plum").unwrap());
    }
}
