//! The Texlang virtual machine (VM).
//!
//! This module contains the definition of the runtime VM,
//!     various input streams that wrap the VM
//!     and the main function that is used to run Texlang.

use crate::command;
use crate::command::BuiltIn;
use crate::command::Command;
use crate::error;
use crate::group::{GroupChain, GroupType};
use crate::prelude as txl;
use crate::token;
use crate::token::lexer;
use crate::token::trace;
use crate::token::CommandRef;
use crate::token::CsNameInterner;
use crate::token::Token;
use crate::token::Value;
use crate::types::Mode;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

mod streams;
pub use streams::*;

/// Implementations of this trait determine how the VM handles non-execution-command tokens.
///
/// The main loop of the VM reads the next expanded token and performs
///     some action based on the token.
/// Many cases are handled automatically based on the semantics of the TeX language:
///
/// | token type | example | action |
/// | -- | -- | -- |
/// | execution command | `\def` | run the command |
/// | variable command | `\count` | assign a value to the corresponding variable |
/// | token alias | `\a` after `\let\a=a` | run the main VM loop for the token that is aliased |
/// | begin group character | `{` | begin a simple group
/// | end group character | `}` | end the current simple group
///
/// Note that the first three rows can arise from both control sequences and active character tokens.
///
/// The remaining cases are not specified by the TeX language but instead by
///     the business logic of the TeX engine being built.
/// The behavior in these cases is specified by implementing the associated handler.
/// These cases and handlers are:
///
/// | token type | example | handler | default |
/// | --- | --- | --- | --- |
/// | character token | `b` | [character_handler](Handlers::character_handler) | do nothing
/// | undefined command | `\b` where `\b` was never defined | [undefined_command_handler](Handlers::undefined_command_handler) | return an undefined control sequence error
/// | unexpanded expansion command | `\the` in `\noexpand\the` | [unexpanded_expansion_command](Handlers::unexpanded_expansion_command) | do nothing
///
/// Each of the handlers has the same function signature as an execution command.
pub trait Handlers<S: TexlangState> {
    /// Handler to invoke for character tokens.
    ///
    /// This token is _not_ invoked for tokens whose category code is begin group (1) or end group (2).
    /// These cases are handled automatically by the VM based on the semantics of the TeX language.
    fn character_handler(token: token::Token, input: &mut ExecutionInput<S>) -> txl::Result<()> {
        _ = (token, input);
        Ok(())
    }

    /// Handler to invoke for a control sequence or active character for which no command is defined.
    fn undefined_command_handler(
        token: token::Token,
        input: &mut ExecutionInput<S>,
    ) -> txl::Result<()> {
        Err(error::UndefinedCommandError::new(input.vm(), token).into())
    }

    /// Handler to invoke for expansion commands that were not expanded.
    ///
    /// This handles the `\the` token in `\noexpand\the`.
    fn unexpanded_expansion_command(
        token: token::Token,
        input: &mut ExecutionInput<S>,
    ) -> txl::Result<()> {
        _ = (token, input);
        Ok(())
    }
}

pub struct DefaultHandlers;

impl<S: TexlangState> Handlers<S> for DefaultHandlers {}

impl<S: TexlangState> VM<S> {
    /// Run the VM.
    ///
    /// It is assumed that the VM has been preloaded with TeX source code using the
    /// [VM::push_source] method.
    /// The first error stops the run; it is returned with every token it references traced.
    pub fn run<H: Handlers<S>>(&mut self) -> Result<(), Box<error::TracedTexError>> {
        match run_loop::<S, H>(ExecutionInput::new(self)) {
            Ok(()) => Ok(()),
            Err(err) => Err(Box::new(error::TracedTexError::new(
                err,
                &self.internal.tracer,
                &self.internal.cs_name_interner,
            ))),
        }
    }
}

fn run_loop<S: TexlangState, H: Handlers<S>>(input: &mut ExecutionInput<S>) -> txl::Result<()> {
    loop {
        let token = match input.next()? {
            None => break,
            Some(token) => token,
        };
        match token.value() {
            Value::CommandRef(command_ref) => match input.groups().command(&command_ref) {
                Some(Command::Execution(cmd, _)) => {
                    let cmd = *cmd;
                    if let Err(err) = cmd(token, input) {
                        return Err(error::Error::new_propagated(
                            input.vm(),
                            error::OperationKind::Execution,
                            token,
                            err,
                        ));
                    }
                }
                Some(Command::Variable(cmd)) => {
                    let cmd = cmd.clone();
                    let global = S::variable_assignment_scope_hook(input.state_mut());
                    cmd.set_value_using_input(token, input, global)?;
                }
                Some(Command::CharacterTokenAlias(value)) => {
                    let aliased = Token::new_from_value(*value, token.trace_key());
                    handle_character::<S, H>(aliased, input)?;
                }
                Some(Command::Expansion(_, _)) | Some(Command::Macro(_)) => {
                    H::unexpanded_expansion_command(token, input)?
                }
                None => H::undefined_command_handler(token, input)?,
            },
            _ => handle_character::<S, H>(token, input)?,
        };
    }
    Ok(())
}

#[inline]
fn handle_character<S: TexlangState, H: Handlers<S>>(
    token: Token,
    input: &mut ExecutionInput<S>,
) -> txl::Result<()> {
    match token.value() {
        Value::BeginGroup(_) => input.begin_group(GroupType::Simple, token),
        Value::EndGroup(_) => input.end_group(token, GroupType::Simple),
        _ => H::character_handler(token, input),
    }
}

/// Error returned when a group is ended at the root of the group chain.
#[derive(Debug)]
pub struct EndOfGroupError {
    pub token: Token,
}

impl error::TexError for EndOfGroupError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "there is no group to end".into()
    }
}

/// Error returned when a group is ended by a construct that does not match the one that opened it.
///
/// For example, `\begingroup }`.
#[derive(Debug)]
pub struct GroupTypeMismatchError {
    pub token: Token,
    pub expected: GroupType,
    pub actual: GroupType,
    pub opened_by: Option<Token>,
}

impl error::TexError for GroupTypeMismatchError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!("this command cannot end a {}", self.actual)
    }

    fn notes(&self) -> Vec<error::Note> {
        let mut notes = vec![format!("this command ends a {}", self.expected).into()];
        if let Some(opened_by) = self.opened_by {
            notes.push(error::Note::SourceCodeTrace(
                format!("the {} was opened here", self.actual),
                opened_by,
            ));
        }
        notes
    }
}

/// A change to the group chain, as reported to [TexlangState::group_change_hook].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    /// A group of this type was just opened.
    Began(GroupType),
    /// The current group, of this type, is about to end.
    Ending(GroupType),
}

/// The Texlang virtual machine.
pub struct VM<S> {
    /// The state
    pub state: S,

    /// The group chain, which holds every scoped binding including command definitions.
    pub groups: GroupChain<S>,

    /// File system operations
    ///
    /// By default this is real operations on the file system.
    /// It is replaceable to support both unit testing, and running Texcraft
    ///     in environments like WASM in the browser.
    pub file_system: Box<dyn FileSystem>,

    /// Input operations from the terminal.
    ///
    /// By default this reads from standard in.
    pub terminal_in: Rc<RefCell<dyn TerminalIn>>,

    /// Writer that writes to the terminal
    ///
    /// Defaults to standard error.
    /// In other contexts (for example WASM) this may be changed to e.g. write to a string
    ///     that can be displayed in the browser.
    pub terminal_out: Rc<RefCell<dyn std::io::Write>>,

    /// Writer that writes to the log file
    ///
    /// Defaults to a sink writer that writes nothing.
    pub log_file: Rc<RefCell<dyn std::io::Write>>,

    /// The working directory which is used as the root for relative file paths
    ///
    /// This is [None] if the working directory could not be determined.
    pub working_directory: Option<std::path::PathBuf>,

    internal: Internal,
}

/// File system operations that TeX may need to perform.
///
/// These operations are extracted to a trait so that they be mocked out in unit testing
///     and in execution contexts like WASM.
pub trait FileSystem {
    /// Read the entire contents of a file into a string.
    ///
    /// This is implemented by [std::fs::read_to_string].
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String>;

    /// Write a slice of bytes to a file.
    ///
    /// This is implemented by [std::fs::write].
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()>;
}

struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Input operations from the terminal.
///
/// These operations are extracted to a trait so that they be mocked out in unit testing
///     and in execution contexts like WASM.
pub trait TerminalIn {
    /// Read a line from the terminal and append it to the provided buffer.
    fn read_line(&mut self, prompt: Option<&str>, buffer: &mut String) -> std::io::Result<()>;
}

struct RealTerminalIn;

impl TerminalIn for RealTerminalIn {
    fn read_line(&mut self, prompt: Option<&str>, buffer: &mut String) -> std::io::Result<()> {
        if let Some(prompt) = prompt {
            eprint!("\n{prompt}")
        }
        let stdin = std::io::stdin();
        stdin.read_line(buffer)?;
        Ok(())
    }
}

/// Implementations of this trait may be used as the state in a Texlang VM.
///
/// The most important thing to know about this trait is that it has no required methods.
/// For any type it can be implemented trivially:
/// ```
/// # use texlang::traits::TexlangState;
/// struct SomeNewType;
///
/// impl TexlangState for SomeNewType {}
/// ```
///
/// Methods of the trait are invoked at certain points when the VM is running,
///     and in general offer a way of customizing the behavior of the VM.
/// The trait methods are all dispatched statically, which is important for performance.
pub trait TexlangState: Sized + 'static {
    /// Get current end line char, or [None] if it's undefined.
    ///
    /// The default implementation returns `\r`.
    fn end_line_char(&self) -> Option<char> {
        Some('\r')
    }

    /// Get the current mode of the typesetting engine.
    ///
    /// This is read by the mode conditionals like `\ifvmode`.
    /// The default implementation returns [Mode::Vertical].
    fn mode(&self) -> Mode {
        Mode::Vertical
    }

    /// Hook that potentially overrides the expansion of a command.
    ///
    /// This hook is invoked before an expandable token is expanded.
    /// If the result of the hook is non-empty, that token is returned instead of expanding
    ///     the command, and the returned token is not itself expanded.
    ///
    /// This hook is designed to support the `\noexpand` primitive.
    fn expansion_override_hook(
        token: token::Token,
        input: &mut ExpansionInput<Self>,
        tag: Option<command::Tag>,
    ) -> txl::Result<Option<Token>> {
        _ = (token, input, tag);
        Ok(None)
    }

    /// Hook that determines the scope of a variable assignment.
    ///
    /// Returns true if the assignment is global.
    /// This hook is designed to support the `\global` prefix.
    fn variable_assignment_scope_hook(state: &mut Self) -> bool {
        _ = state;
        false
    }

    /// Hook that is invoked just after a group begins and just before a group ends.
    ///
    /// This hook is designed to support the `\tracinggroups` primitive.
    fn group_change_hook(
        token: token::Token,
        input: &mut ExecutionInput<Self>,
        change: GroupChange,
    ) -> txl::Result<()> {
        _ = (token, input, change);
        Ok(())
    }
}

impl TexlangState for () {}

impl<S: Default> VM<S> {
    /// Create a new VM.
    ///
    /// The built-in commands are defined in the root group and the root namespace.
    pub fn new(initial_built_ins: HashMap<&str, BuiltIn<S>>) -> Box<VM<S>> {
        let mut internal = Internal::new(Default::default());
        let built_ins: Vec<(CommandRef, Command<S>)> = initial_built_ins
            .into_iter()
            .map(|(name, built_in)| {
                let cs_name = internal.cs_name_interner.get_or_intern(name);
                (CommandRef::ControlSequence(cs_name), built_in.into())
            })
            .collect();
        Box::new(VM {
            state: Default::default(),
            groups: GroupChain::new(built_ins),
            internal,
            file_system: Box::new(RealFileSystem {}),
            terminal_in: Rc::new(RefCell::new(RealTerminalIn {})),
            terminal_out: Rc::new(RefCell::new(std::io::stderr())),
            log_file: Rc::new(RefCell::new(std::io::sink())),
            working_directory: match std::env::current_dir() {
                Ok(path_buf) => Some(path_buf),
                Err(err) => {
                    log::warn!("failed to determine the working directory: {err}");
                    None
                }
            },
        })
    }
}

impl<S> VM<S> {
    /// Add new source code to the VM.
    ///
    /// TeX input source code is organized as a stack.
    /// Pushing source code onto the stack will mean it is executed first.
    pub fn push_source<T1: Into<PathBuf>, T2: Into<String>>(
        &mut self,
        file_name: T1,
        source_code: T2,
    ) -> txl::Result<()> {
        self.internal
            .push_source(None, file_name.into(), source_code.into());
        Ok(())
    }

    /// Clear all source code from the VM.
    pub fn clear_sources(&mut self) {
        self.internal.clear_sources()
    }

    /// Return a reference to the control sequence name string interner.
    ///
    /// This interner can be used to resolve [CsName](token::CsName) types into regular strings.
    #[inline]
    pub fn cs_name_interner(&self) -> &CsNameInterner {
        &self.internal.cs_name_interner
    }

    #[inline]
    pub fn cs_name_interner_mut(&mut self) -> &mut CsNameInterner {
        &mut self.internal.cs_name_interner
    }

    pub fn trace(&self, token: Token) -> trace::SourceCodeTrace {
        self.internal
            .tracer
            .trace(token, &self.internal.cs_name_interner)
    }

    pub fn trace_end_of_input(&self) -> trace::SourceCodeTrace {
        self.internal.tracer.trace_end_of_input()
    }
}

/// Parts of the VM that are private.
struct Internal {
    // The sources form a stack. We store the top element directly on the VM
    // for performance reasons.
    current_source: Source,
    sources: Vec<Source>,

    cs_name_interner: CsNameInterner,

    tracer: trace::Tracer,

    token_buffers: std::collections::BinaryHeap<TokenBuffer>,
}

impl Internal {
    fn new(cs_name_interner: CsNameInterner) -> Self {
        Internal {
            current_source: Default::default(),
            sources: Default::default(),
            cs_name_interner,
            tracer: Default::default(),
            token_buffers: Default::default(),
        }
    }

    fn push_source(&mut self, token: Option<Token>, file_name: PathBuf, source_code: String) {
        let trace_key_range =
            self.tracer
                .register_source_code(token, trace::Origin::File(file_name), &source_code);
        let mut new_source = Source::new(source_code, trace_key_range);
        std::mem::swap(&mut new_source, &mut self.current_source);
        self.sources.push(new_source);
    }

    fn clear_sources(&mut self) {
        self.current_source = Default::default();
        self.sources.clear();
    }

    #[inline]
    fn expansions(&self) -> &Vec<Token> {
        &self.current_source.expansions
    }

    #[inline]
    fn expansions_mut(&mut self) -> &mut Vec<Token> {
        &mut self.current_source.expansions
    }

    fn pop_source(&mut self) -> bool {
        match self.sources.pop() {
            None => false,
            Some(source) => {
                self.current_source = source;
                true
            }
        }
    }

    fn checkout_token_buffer(&mut self) -> Vec<Token> {
        self.token_buffers.pop().unwrap_or_default().0
    }

    fn return_token_buffer(&mut self, mut token_buffer: Vec<Token>) {
        token_buffer.clear();
        self.token_buffers.push(TokenBuffer(token_buffer))
    }
}

struct Source {
    expansions: Vec<Token>,
    root: lexer::Lexer,
}

impl Source {
    pub fn new(source_code: String, trace_key_range: trace::KeyRange) -> Source {
        Source {
            expansions: Vec::with_capacity(32),
            root: lexer::Lexer::new(source_code, trace_key_range),
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::new("".into(), trace::KeyRange::empty())
    }
}

// Buffers are ordered by capacity so that the largest buffer is checked out first.
#[derive(Default)]
struct TokenBuffer(Vec<Token>);

impl PartialEq for TokenBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.0.capacity() == other.0.capacity()
    }
}

impl Eq for TokenBuffer {}

impl PartialOrd for TokenBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenBuffer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.capacity().cmp(&other.0.capacity())
    }
}

/// Helper trait for implementing the component pattern in Texlang.
///
/// The component pattern is a design pattern used when implementing TeX commands that require some state.
/// An example of a stateful TeX command is `\ifnum`, which keeps a stack of the conditionals
///     that are currently open.
/// When the component pattern is used, a stateful TeX command
///     can have a single implementation that
///     is used by multiple TeX engines built with Texlang.
/// Additionally, a specific TeX engine can compose many different
///     stateful TeX commands together without worrying about conflicts between their state.
///
/// In the component pattern, the state
///     needed by a specific command is isolated in a _component_, which is a concrete
///     Rust type like a struct.
/// This Rust type is the generic type `C` in the trait.
/// The stateful command is defined in the same Rust module as the component,
///     and the internals of the component are private to that module.
/// Any VM state type that contains the component can implement the trait.
///
/// Most scoped state, like registers and category codes, does not need a component:
///     it lives in the [group chain](crate::group).
/// Components are for state that is not scoped to groups.
///
/// The easiest way to include a component in the state is to make it a direct field
///     of the state.
/// In this case the [implement_has_component] macro can be used to easily implement the
///     trait.
///
/// This trait requires that the type also implements [TexlangState].
/// This is only to reduce the number of trait bounds that need to be explicitly
///     specified when implementing TeX commands.
pub trait HasComponent<C>: TexlangState {
    /// Return a immutable reference to the component.
    fn component(&self) -> &C;

    /// Return a mutable reference to the component.
    fn component_mut(&mut self) -> &mut C;
}

/// This macro is for implementing the [HasComponent] trait in the special (but common)
///     case when the state is a struct and the component is a direct field of the struct.
///
/// ## Examples
///
/// Implementing a single component:
///
/// ```
/// # mod mylibrary{
/// #   pub struct Component;
/// # }
/// # use texlang::vm::implement_has_component;
/// # use texlang::traits::*;
/// #
/// struct MyState {
///     component: mylibrary::Component,
/// }
///
/// impl TexlangState for MyState {}
///
/// implement_has_component![MyState, mylibrary::Component, component];
/// ```
///
/// Implementing multiple components:
///
/// ```
/// # mod mylibrary1{
/// #   pub struct Component;
/// # }
/// # mod mylibrary2{
/// #   pub struct Component;
/// # }
/// # use texlang::vm::implement_has_component;
/// # use texlang::traits::*;
/// #
/// struct MyState {
///     component_1: mylibrary1::Component,
///     component_2: mylibrary2::Component,
/// }
///
/// impl TexlangState for MyState {}
///
/// implement_has_component![
///     MyState,
///     (mylibrary1::Component, component_1),
///     (mylibrary2::Component, component_2),
/// ];
/// ```
#[macro_export]
macro_rules! implement_has_component {
    ( $type: path, $component: path, $field: ident ) => {
        implement_has_component![$type, ($component, $field),];
    };
    ( $type: path, $(($component: path, $field: ident),)+) => {
        $(
            impl ::texlang::vm::HasComponent<$component> for $type {
                #[inline]
                fn component(&self) -> &$component {
                    &self.$field
                }
                #[inline]
                fn component_mut(&mut self) -> &mut $component {
                    &mut self.$field
                }
            }
        )*
    };
}

pub use implement_has_component;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::RegisterKey;
    use crate::types::CatCode;

    #[derive(Default)]
    struct State {
        chars: Vec<char>,
    }

    impl TexlangState for State {}

    struct CollectCharacters;

    impl Handlers<State> for CollectCharacters {
        fn character_handler(token: Token, input: &mut ExecutionInput<State>) -> txl::Result<()> {
            if let Some(c) = token.char() {
                input.state_mut().chars.push(c);
            }
            Ok(())
        }
    }

    const KEY: RegisterKey = RegisterKey::Numbered(0);

    fn set_local(_: Token, input: &mut ExecutionInput<State>) -> txl::Result<()> {
        input.groups_mut().set_int(KEY, 1, false);
        Ok(())
    }

    fn record(_: Token, input: &mut ExecutionInput<State>) -> txl::Result<()> {
        let value = input.groups().int(KEY);
        input.state_mut().chars.push(char::from(b'0' + value as u8));
        Ok(())
    }

    fn space_a(_: Token, input: &mut ExecutionInput<State>) -> txl::Result<()> {
        input.groups_mut().set_cat_code('A', CatCode::Space, false);
        Ok(())
    }

    fn after_group(token: Token, input: &mut ExecutionInput<State>) -> txl::Result<()> {
        input
            .groups_mut()
            .after_group_token(Token::new_letter('x', token.trace_key()));
        input
            .groups_mut()
            .after_group_callback(Box::new(|input| {
                input.state_mut().chars.push('c');
                Ok(())
            }));
        input
            .groups_mut()
            .after_group_token(Token::new_letter('y', token.trace_key()));
        Ok(())
    }

    fn new_vm() -> Box<VM<State>> {
        let built_ins: HashMap<&str, BuiltIn<State>> = HashMap::from([
            ("setlocal", BuiltIn::new_execution(set_local)),
            ("record", BuiltIn::new_execution(record)),
            ("spaceA", BuiltIn::new_execution(space_a)),
            ("aftergroup", BuiltIn::new_execution(after_group)),
            (
                "bgroup",
                Command::CharacterTokenAlias(Value::BeginGroup('{')).into(),
            ),
        ]);
        let mut vm = VM::new(built_ins);
        vm.groups.install_plain_tex_cat_codes();
        vm
    }

    fn run(source: &str) -> Result<Vec<char>, Box<error::TracedTexError>> {
        let mut vm = new_vm();
        vm.push_source("input.tex", source).unwrap();
        vm.run::<CollectCharacters>()?;
        Ok(vm.state.chars.clone())
    }

    #[test]
    fn characters_reach_the_handler() {
        assert_eq!(run("ab %comment").unwrap(), vec!['a', 'b', ' ']);
    }

    #[test]
    fn group_restores_bindings() {
        assert_eq!(run(r"{\setlocal\record}\record").unwrap(), vec!['1', '0']);
    }

    #[test]
    fn character_alias_begins_group() {
        assert_eq!(run(r"\bgroup\setlocal}\record").unwrap(), vec!['0']);
    }

    #[test]
    fn cat_code_change_applies_to_next_character() {
        assert_eq!(run(r"\spaceA xAB").unwrap(), vec!['x', ' ', 'B', ' ']);
    }

    #[test]
    fn after_group_callbacks_then_tokens() {
        assert_eq!(run(r"{\aftergroup}z").unwrap(), vec!['c', 'x', 'y', 'z', ' ']);
    }

    #[test]
    fn end_group_at_root_fails() {
        let err = run("a}").unwrap_err();
        assert!(err.downcast_ref::<EndOfGroupError>().is_some());
        assert_eq!(err.trace.as_ref().unwrap().index, 1);
    }

    #[test]
    fn undefined_command_fails() {
        let err = run(r"\recrod").unwrap_err();
        let err = err.downcast_ref::<error::UndefinedCommandError>().unwrap();
        assert_eq!(err.close_names[0].word, "record");
    }

    #[test]
    fn later_source_runs_first() {
        let mut vm = new_vm();
        vm.push_source("a.tex", "a").unwrap();
        vm.push_source("b.tex", "b").unwrap();
        vm.run::<CollectCharacters>().unwrap();
        assert_eq!(vm.state.chars, vec!['b', ' ', 'a', ' ']);
    }

    #[test]
    fn token_buffers_are_reused() {
        let mut vm = new_vm();
        let input = ExpansionInput::new(&mut vm);
        let mut buffer = input.checkout_token_buffer();
        buffer.reserve(100);
        let capacity = buffer.capacity();
        input.return_token_buffer(buffer);
        let buffer = input.checkout_token_buffer();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);
    }
}
