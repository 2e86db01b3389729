//! Primitives for creating groups (`\begingroup`, `\endgroup`) and `\aftergroup`

use texlang::group::GroupType;
use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

pub const BEGINGROUP_DOC: &str = "Begin a new semi-simple group";
pub const ENDGROUP_DOC: &str = "End a semi-simple group";
pub const AFTERGROUP_DOC: &str = "Insert a token just after the current group ends";

/// Get the `\begingroup` command.
pub fn get_begingroup<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(begingroup_primitive_fn).with_doc(BEGINGROUP_DOC)
}

fn begingroup_primitive_fn<S: TexlangState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    input.begin_group(GroupType::SemiSimple, token)
}

/// Get the `\endgroup` command.
pub fn get_endgroup<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(endgroup_primitive_fn).with_doc(ENDGROUP_DOC)
}

fn endgroup_primitive_fn<S: TexlangState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    input.end_group(token, GroupType::SemiSimple)
}

/// Get the `\aftergroup` command.
pub fn get_aftergroup<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(aftergroup_primitive_fn).with_doc(AFTERGROUP_DOC)
}

fn aftergroup_primitive_fn<S: TexlangState>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let token = input.unexpanded().next_or_err(AftergroupEndOfInputError {})?;
    input.groups_mut().after_group_token(token);
    Ok(())
}

#[derive(Debug)]
struct AftergroupEndOfInputError;

impl error::EndOfInputError for AftergroupEndOfInputError {
    fn doing(&self) -> String {
        r"reading the token after \aftergroup".into()
    }
}
