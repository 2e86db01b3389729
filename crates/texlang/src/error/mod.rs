//! Error handling
//!
//! Every error in Texlang is a concrete Rust type implementing the [TexError] trait.
//! Primitives return errors boxed inside an [Error], which also records the stack of
//!     operations (expansions, executions, variable assignments) the error propagated through.
//! When the VM stops on an error, it converts the [Error] into a [TracedTexError].
//! The traced error knows the source location of every token it references
//!     and its [Display](std::fmt::Display) implementation prints a source-annotated message.
//!
//! Callers that need to react to a specific error can downcast:
//!
//! ```
//! # use texlang::error::*;
//! # use texlang::token::{trace, Token};
//! let token = Token::new_letter('a', trace::Key::dummy());
//! let err: Box<Error> = SimpleTokenError::new(token, "bad letter").into();
//! assert!(err.downcast_ref::<SimpleTokenError>().is_some());
//! assert!(err.downcast_ref::<SimpleFailedPreconditionError>().is_none());
//! ```

use crate::token;
use crate::token::trace;
use crate::vm;
use std::any::TypeId;
use texcraft_stdext::algorithms::spellcheck::{self, WordDiff};

pub mod display;

pub use display::Note;

/// The type of an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// An error at a particular TeX token.
    ///
    /// For example, a TeX command expects a number but the next token is a letter.
    Token(token::Token),
    /// An end-of-input error.
    ///
    /// For example, a TeX command expects a number but there is no more input.
    EndOfInput,
    /// Some external condition does not hold and so the TeX code is incorrect.
    ///
    /// For example, a TeX command tries to open a file a particular path,
    ///     but the file does not exist.
    FailedPrecondition,
}

/// Implementations of this trait describe an error in TeX source code.
pub trait TexError: std::fmt::Debug + 'static {
    fn kind(&self) -> Kind;

    fn title(&self) -> String;

    fn notes(&self) -> Vec<Note> {
        vec![]
    }

    fn source_annotation(&self) -> String {
        TexError::default_source_annotation(self)
    }

    fn default_source_annotation(&self) -> String {
        match TexError::kind(self) {
            Kind::Token(t) => match (t.char(), t.cat_code()) {
                (Some(c), Some(code)) => {
                    format!["character token with value {c} and category code {code}",]
                }
                _ => "control sequence".to_string(),
            },
            Kind::EndOfInput => "input ended here".into(),
            Kind::FailedPrecondition => "error occurred while running this command".into(),
        }
    }

    #[doc(hidden)]
    fn type_id_of(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

impl dyn TexError {
    /// Returns the concrete error if it has type `T`.
    pub fn downcast_ref<T: TexError>(&self) -> Option<&T> {
        if self.type_id_of() == TypeId::of::<T>() {
            // SAFETY: the type IDs match so the data pointer points at a T.
            Some(unsafe { &*(self as *const dyn TexError as *const T) })
        } else {
            None
        }
    }

    /// Returns whether the concrete error has type `T`.
    pub fn is<T: TexError>(&self) -> bool {
        self.type_id_of() == TypeId::of::<T>()
    }
}

/// An error along with the operations it propagated through.
#[derive(Debug)]
pub struct Error {
    error: Box<dyn TexError>,
    stack_trace: Vec<StackTraceElement>,
}

impl<T: TexError> From<T> for Box<Error> {
    fn from(error: T) -> Self {
        Box::new(Error {
            error: Box::new(error),
            stack_trace: vec![],
        })
    }
}

impl Error {
    /// Records that the error propagated through an operation on the provided token.
    pub fn new_propagated<S>(
        vm: &vm::VM<S>,
        context: OperationKind,
        token: token::Token,
        mut error: Box<Error>,
    ) -> Box<Error> {
        error.stack_trace.push(StackTraceElement {
            context,
            token,
            trace: vm.trace(token),
        });
        error
    }

    /// The root error.
    pub fn error(&self) -> &dyn TexError {
        self.error.as_ref()
    }

    /// Returns the root error if it has type `T`.
    pub fn downcast_ref<T: TexError>(&self) -> Option<&T> {
        self.error.downcast_ref::<T>()
    }

    /// Operations the error propagated through, innermost first.
    pub fn stack_trace(&self) -> &[StackTraceElement] {
        &self.stack_trace
    }
}

/// Element of a stack trace.
#[derive(Clone, Debug)]
pub struct StackTraceElement {
    pub context: OperationKind,
    pub token: token::Token,
    pub trace: trace::SourceCodeTrace,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Expansion,
    Execution,
    VariableIndex,
    VariableAssignment,
}

impl OperationKind {
    pub(crate) fn action(&self) -> &'static str {
        match self {
            OperationKind::Expansion => "expanding this command",
            OperationKind::Execution => "executing this command",
            OperationKind::VariableIndex => "determining the index of this variable",
            OperationKind::VariableAssignment => "determining the value to assign to this variable",
        }
    }
}

/// A fully traced error.
///
/// Every token referenced by the error, either directly or in a note,
///     has been traced back to the source code it came from.
#[derive(Debug)]
pub struct TracedTexError {
    pub error: Box<dyn TexError>,
    /// Where the error occurred.
    ///
    /// This is [None] for failed precondition errors outside of any command.
    pub trace: Option<trace::SourceCodeTrace>,
    /// Operations the error propagated through, innermost first.
    pub stack_trace: Vec<StackTraceElement>,
    pub notes: Vec<TracedNote>,
}

/// A note whose source code references have been traced.
#[derive(Debug, Clone)]
pub enum TracedNote {
    Text(String),
    SourceCodeTrace(String, trace::SourceCodeTrace),
}

impl TracedTexError {
    pub(crate) fn new(
        error: Box<Error>,
        tracer: &trace::Tracer,
        cs_name_interner: &token::CsNameInterner,
    ) -> Self {
        let Error { error, stack_trace } = *error;
        let trace = match error.kind() {
            Kind::Token(token) => Some(tracer.trace(token, cs_name_interner)),
            Kind::EndOfInput => Some(tracer.trace_end_of_input()),
            Kind::FailedPrecondition => stack_trace.first().map(|element| element.trace.clone()),
        };
        let notes = error
            .notes()
            .into_iter()
            .map(|note| match note {
                Note::Text(text) => TracedNote::Text(text),
                Note::SourceCodeTrace(text, token) => {
                    TracedNote::SourceCodeTrace(text, tracer.trace(token, cs_name_interner))
                }
            })
            .collect();
        TracedTexError {
            error,
            trace,
            stack_trace,
            notes,
        }
    }

    /// Returns the root error if it has type `T`.
    pub fn downcast_ref<T: TexError>(&self) -> Option<&T> {
        self.error.downcast_ref::<T>()
    }
}

impl std::fmt::Display for TracedTexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_error(f, self)
    }
}

impl std::error::Error for TracedTexError {}

/// Implementations of this trait describe an error in which in the input ended prematurely.
pub trait EndOfInputError: std::fmt::Debug + 'static {
    fn doing(&self) -> String;
    fn notes(&self) -> Vec<Note> {
        vec![]
    }
}

/// Error returned when the input ends prematurely.
///
/// Wraps an [EndOfInputError].
#[derive(Debug)]
pub struct EofError {
    doing: String,
    notes: Vec<Note>,
}

impl EofError {
    pub fn new<E: EndOfInputError>(err: E) -> Self {
        Self {
            doing: err.doing(),
            notes: err.notes(),
        }
    }
}

impl TexError for EofError {
    fn kind(&self) -> Kind {
        Kind::EndOfInput
    }

    fn title(&self) -> String {
        format!("unexpected end of input while {}", self.doing)
    }

    fn notes(&self) -> Vec<Note> {
        self.notes.clone()
    }
}

#[derive(Debug)]
pub struct SimpleTokenError {
    pub token: token::Token,
    pub title: String,
}

impl SimpleTokenError {
    /// Create a new simple token error.
    pub fn new<T: AsRef<str>>(token: token::Token, title: T) -> SimpleTokenError {
        SimpleTokenError {
            token,
            title: title.as_ref().into(),
        }
    }
}

impl TexError for SimpleTokenError {
    fn kind(&self) -> Kind {
        Kind::Token(self.token)
    }

    fn title(&self) -> String {
        self.title.clone()
    }
}

#[derive(Debug)]
pub struct SimpleFailedPreconditionError {
    pub title: String,
    pub text_notes: Vec<String>,
}

impl SimpleFailedPreconditionError {
    /// Create a new simple failed precondition error.
    pub fn new<T: AsRef<str>>(title: T) -> Self {
        Self {
            title: title.as_ref().into(),
            text_notes: vec![],
        }
    }

    pub fn with_note<T: Into<String>>(mut self, note: T) -> Self {
        self.text_notes.push(note.into());
        self
    }
}

impl TexError for SimpleFailedPreconditionError {
    fn kind(&self) -> Kind {
        Kind::FailedPrecondition
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn notes(&self) -> Vec<Note> {
        self.text_notes.iter().map(Note::from).collect()
    }
}

/// Concrete error for the case when a command is undefined.
///
/// This error is returned when a control sequence or active character
///     is not defined.
#[derive(Debug)]
pub struct UndefinedCommandError {
    /// The token that was referred to an undefined command.
    pub token: token::Token,
    /// Control sequences that are spelled similarly to the token.
    pub close_names: Vec<WordDiff>,
}

impl UndefinedCommandError {
    /// Create a new undefined command error.
    pub fn new<S>(vm: &vm::VM<S>, token: token::Token) -> UndefinedCommandError {
        let close_names = match token.value() {
            token::Value::CommandRef(token::CommandRef::ControlSequence(cs_name)) => {
                let interner = vm.cs_name_interner();
                let name = interner.resolve(cs_name).unwrap_or("");
                let all_names: Vec<&str> = vm
                    .groups
                    .command_refs_slow()
                    .into_iter()
                    .filter_map(|command_ref| match command_ref {
                        token::CommandRef::ControlSequence(cs_name) => interner.resolve(cs_name),
                        token::CommandRef::ActiveCharacter(_) => None,
                    })
                    .collect();
                spellcheck::find_close_words(&all_names, name)
            }
            _ => vec![],
        };
        UndefinedCommandError { token, close_names }
    }
}

impl TexError for UndefinedCommandError {
    fn kind(&self) -> Kind {
        Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "undefined control sequence".into()
    }

    fn notes(&self) -> Vec<Note> {
        use texcraft_stdext::color::Colorize;
        match self.close_names.first() {
            None => vec![],
            Some(close_name) => {
                vec![format!["did you mean \\{}?", close_name.word.as_str().bold()].into()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast() {
        let token = token::Token::new_letter('a', trace::Key::dummy());
        let err: Box<Error> = SimpleTokenError::new(token, "title").into();
        assert_eq!(err.downcast_ref::<SimpleTokenError>().unwrap().title, "title");
        assert!(err.downcast_ref::<UndefinedCommandError>().is_none());
        assert!(err.error().is::<SimpleTokenError>());
        assert_eq!(err.error().kind(), Kind::Token(token));
    }

    #[test]
    fn end_of_input_error_title() {
        #[derive(Debug)]
        struct ParsingThing;
        impl EndOfInputError for ParsingThing {
            fn doing(&self) -> String {
                "parsing a thing".into()
            }
        }
        let err = EofError::new(ParsingThing);
        assert_eq!(err.title(), "unexpected end of input while parsing a thing");
        assert_eq!(err.kind(), Kind::EndOfInput);
    }

    #[test]
    fn failed_precondition_notes() {
        let err = SimpleFailedPreconditionError::new("title").with_note("first");
        assert_eq!(err.notes().len(), 1);
        assert_eq!(err.kind(), Kind::FailedPrecondition);
    }
}
