//! Primitives for reading files (`\input`, `\openin`, `\closein`, `\ifeof`)
//!
//! Input streams opened with `\openin` live in the group chain.
//! All opens and closes are global, as in TeX.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use texlang::group::InputFile;
use texlang::parse::{OptionalEquals, Uint};
use texlang::prelude as txl;
use texlang::traits::*;
use texlang::*;

use crate::conditional;

/// Number of input streams.
pub const NUM_INPUT_STREAMS: usize = 16;

pub const INPUT_DOC: &str = "Insert the contents of a file into the input";
pub const OPENIN_DOC: &str = "Open a file for reading";
pub const CLOSEIN_DOC: &str = "Close an input stream";
pub const IFEOF_DOC: &str = "Test if an input stream is closed or fully read";

/// Get the `\input` expansion primitive.
pub fn get_input<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(input_fn).with_doc(INPUT_DOC)
}

fn input_fn<S: TexlangState>(
    input_token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let file_name = parse_file_name(input_token, input.expanded())?;
    let path = resolve_path(input.vm(), &file_name);
    let source_code = match input.vm().file_system.read_to_string(&path) {
        Ok(source_code) => source_code,
        Err(err) => {
            return Err(FileError {
                token: input_token,
                path,
                message: err.to_string(),
            }
            .into())
        }
    };
    log::debug!("inputting {}", path.display());
    input.push_source(input_token, path, source_code)
}

/// Get the `\openin` execution primitive.
pub fn get_openin<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(openin_fn).with_doc(OPENIN_DOC)
}

fn openin_fn<S: TexlangState>(
    openin_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let (Uint(n), _) = <(Uint<NUM_INPUT_STREAMS>, OptionalEquals)>::parse(input)?;
    let file_name = parse_file_name(openin_token, input.as_mut())?;
    let path = resolve_path(input.vm(), &file_name);
    // If the file fails to open TeX does not error out.
    // Instead, TeX users are expected to test the result with \ifeof.
    let file = match input.vm().file_system.read_to_string(&path) {
        Err(err) => {
            log::debug!("failed to open {} for reading: {err}", path.display());
            None
        }
        Ok(content) => Some(Rc::new(RefCell::new(InputFile::new(path, &content)))),
    };
    input.groups_mut().set_input_file(n, file, true);
    Ok(())
}

/// Get the `\closein` execution primitive.
pub fn get_closein<S: TexlangState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(closein_fn).with_doc(CLOSEIN_DOC)
}

fn closein_fn<S: TexlangState>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let Uint(n) = Uint::<NUM_INPUT_STREAMS>::parse(input)?;
    input.groups_mut().set_input_file(n, None, true);
    Ok(())
}

/// Get the `\ifeof` conditional.
pub fn get_ifeof<S: HasComponent<conditional::Component>>() -> command::BuiltIn<S> {
    <IfEof as conditional::Condition<S>>::build_if_command().with_doc(IFEOF_DOC)
}

struct IfEof;

impl<S: HasComponent<conditional::Component>> conditional::Condition<S> for IfEof {
    fn evaluate(_: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<bool> {
        let Uint(n) = Uint::<NUM_INPUT_STREAMS>::parse(input)?;
        Ok(match input.vm().groups.input_file(n) {
            None => true,
            Some(file) => file.borrow().is_eof(),
        })
    }
}

// A file name is a sequence of character tokens ending with a space or a non-character token.
// The terminating space is consumed.
fn parse_file_name<S: TexlangState>(
    command_token: token::Token,
    input: &mut vm::ExpandedStream<S>,
) -> txl::Result<String> {
    let mut name = String::new();
    while let Some(next) = input.next()? {
        match next.value() {
            token::Value::Space(_) if name.is_empty() => {}
            token::Value::Space(_) => break,
            token::Value::Letter(c) | token::Value::Other(c) => name.push(c),
            _ => {
                input.back(next);
                break;
            }
        }
    }
    if name.is_empty() {
        let annotation = format![
            "file name required by {}",
            command_token.value().describe(input.vm().cs_name_interner())
        ];
        return Err(parse::Error::new(
            "a file name",
            input.peek()?.copied(),
            "a file name is a non-empty sequence of character tokens ending with a space",
        )
        .with_annotation_override(annotation)
        .into());
    }
    Ok(name)
}

fn resolve_path<S>(vm: &vm::VM<S>, file_name: &str) -> PathBuf {
    let mut path = PathBuf::from(file_name);
    if path.extension().is_none() {
        path.set_extension("tex");
    }
    if path.is_relative() {
        if let Some(working_directory) = &vm.working_directory {
            return working_directory.join(path);
        }
    }
    path
}

/// Error returned when a file cannot be read.
#[derive(Debug)]
pub struct FileError {
    pub token: token::Token,
    pub path: PathBuf,
    pub message: String,
}

impl error::TexError for FileError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!["could not read {}", self.path.display()]
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![self.message.clone().into()]
    }
}
