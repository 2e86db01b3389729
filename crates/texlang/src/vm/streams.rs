use std::path::PathBuf;

use super::TexlangState;
use crate::group;
use crate::group::{GroupChain, GroupType};
use crate::prelude as txl;
use crate::token::trace;
use crate::token::Token;
use crate::*;

/// A stream of tokens generated on demand.
///
/// This trait describes a general stream of tokens where the front of the stream may
/// retrieved using [TokenStream::next] or peeked at using [TokenStream::peek].
/// In practice, all [TokenStreams](TokenStream) in Texlang
/// are either [ExecutionInput], [ExpansionInput], [ExpandedStream] or [UnexpandedStream].
/// This trait exists to allow a generic function to accept any of these types.
///
/// # Note on lazy loading
///
/// The simplest example of a stream is a vector of tokens. However, streams are more general
/// than this and can encompass situations in which the full contents cannot be determined in
/// advance.
/// The classic example of this kind of stream comes from category code changes:
/// ```tex
/// \catcode`\A=10 AB
/// ```
/// The first command changes `A` to be a space character, and so the correct tokenization
/// is the command followed by the single letter token `B`.
/// Every category code is read from the [group chain](crate::group) at the moment
/// the character is lexed.
pub trait TokenStream {
    /// The type of the custom state in the VM.
    type S;

    /// Gets the next token in the stream.
    ///
    /// This method is almost the same
    /// as the `next` method in Rust's iterator trait, except a stream can return an error.
    ///
    /// As with iterators, a result of `Ok(None)` indicates that the stream is exhausted.
    fn next(&mut self) -> txl::Result<Option<Token>>;

    /// Peeks at the next token in the stream without removing it.
    ///
    /// The peek method requires a mutable reference to the stream
    ///     because determining the next token may involve lexing more source code
    ///     or, for expanded streams, performing expansions.
    fn peek(&mut self) -> txl::Result<Option<&Token>>;

    /// Consumes the next token in the stream without returning it.
    ///
    /// This method is mostly to make code self-documenting. It is typically used in
    /// situations where a peek has already occurred, and the token itself is not needed.
    fn consume(&mut self) -> txl::Result<()> {
        self.next().map(|_| ())
    }

    /// Pushes a token back onto the front of the stream.
    ///
    /// The token is the next token returned.
    /// It is not expanded again when read from an unexpanded stream, but it is subject to
    ///     expansion when read from an expanded stream.
    fn back(&mut self, token: Token);

    /// Gets the next token in the stream, or an end of input error if the stream is exhausted.
    fn next_or_err<E: error::EndOfInputError>(&mut self, err: E) -> txl::Result<Token> {
        match self.next()? {
            None => Err(error::EofError::new(err).into()),
            Some(token) => Ok(token),
        }
    }

    /// Returns a reference to the VM.
    fn vm(&self) -> &vm::VM<Self::S>;

    /// Returns a reference to the custom state.
    #[inline]
    fn state(&self) -> &Self::S {
        &self.vm().state
    }

    fn trace(&self, token: Token) -> trace::SourceCodeTrace {
        self.vm().trace(token)
    }

    fn trace_end_of_input(&self) -> trace::SourceCodeTrace {
        self.vm().trace_end_of_input()
    }
}

/// A [TokenStream] that performs expansion.
///
/// The unexpanded tokens are retrieved from the unexpanded stream returned by the
/// [unexpanded](ExpandedStream::unexpanded) method.
#[repr(transparent)]
pub struct ExpandedStream<S>(UnexpandedStream<S>);

impl<S> std::convert::AsMut<ExpandedStream<S>> for ExpandedStream<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        self
    }
}

impl<S> ExpandedStream<S> {
    /// Returns the underlying unexpanded stream.
    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0
    }

    /// Returns a vector than can be used as a token buffer, potentially without allocating memory.
    ///
    /// See [ExpansionInput::checkout_token_buffer].
    pub fn checkout_token_buffer(&mut self) -> Vec<Token> {
        self.0 .0.internal.checkout_token_buffer()
    }

    /// Return a token buffer, allowing it to be reused.
    pub fn return_token_buffer(&mut self, token_buffer: Vec<Token>) {
        self.0 .0.internal.return_token_buffer(token_buffer)
    }

    /// Returns a mutable reference to the expanded tokens stack for the current input source.
    ///
    /// The tokens are a stack, so the next token is the last token in the vector.
    #[inline]
    pub fn expansions_mut(&mut self) -> &mut Vec<Token> {
        self.0 .0.internal.expansions_mut()
    }
}

impl<S: TexlangState> ExpandedStream<S> {
    /// Expand the next token in the input.
    ///
    /// This method only expands a single token. If, after the expansion, the next token
    /// is expandable it will not be expanded.
    ///
    /// Returns false if the next token is not expandable,
    ///     or if the [expansion override hook](TexlangState::expansion_override_hook)
    ///     replaced it with a token that must not be expanded.
    pub fn expand_once(&mut self) -> txl::Result<bool> {
        stream::expand_once(&mut self.0 .0)
    }
}

impl<S: TexlangState> TokenStream for ExpandedStream<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        stream::next_expanded(&mut self.0 .0)
    }

    #[inline]
    fn peek(&mut self) -> txl::Result<Option<&Token>> {
        stream::peek_expanded(&mut self.0 .0)
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.expansions_mut().push(token);
    }

    #[inline]
    fn vm(&self) -> &vm::VM<Self::S> {
        &self.0 .0
    }
}

/// Stream that returns input tokens without performing expansion.
///
/// The unexpanded stream is used when reading tokens without performing expansion;
/// e.g., when reading the replacement text for a macro defined using `\def`,
/// or when a false conditional branch is skipped.
#[repr(transparent)]
pub struct UnexpandedStream<S>(vm::VM<S>);

impl<S: TexlangState> TokenStream for UnexpandedStream<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        stream::next_unexpanded(&mut self.0)
    }

    #[inline]
    fn peek(&mut self) -> txl::Result<Option<&Token>> {
        stream::peek_unexpanded(&mut self.0)
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.internal.expansions_mut().push(token);
    }

    #[inline]
    fn vm(&self) -> &vm::VM<S> {
        &self.0
    }
}

/// Input type for expansion primitives.
///
/// This type provides:
///
/// - Access to the input stream (with or without expansion). Its implementation of the [TokenStream]
///     trait returns expanded tokens.
///     To read the input stream without performing expansion, use the
///     [unexpanded](ExpansionInput::unexpanded) method.
///
/// - Read only access to the VM, including the group chain.
///
/// - Mutable access to the custom state.
///     Conditionals use this to maintain their stack.
///
/// - The ability to push source code or token expansions to the front of the input stream.
///     For source code use [ExpansionInput::push_source];
///     for tokens use [ExpansionInput::expansions_mut].
///
/// - Access to token buffers using the [ExpansionInput::checkout_token_buffer] and
///     [ExpansionInput::return_token_buffer] methods.
#[repr(transparent)]
pub struct ExpansionInput<S>(ExpandedStream<S>);

impl<S> std::convert::AsMut<ExpandedStream<S>> for ExpansionInput<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }
}

impl<S: TexlangState> TokenStream for ExpansionInput<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        self.0.next()
    }

    #[inline]
    fn peek(&mut self) -> txl::Result<Option<&Token>> {
        self.0.peek()
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token)
    }

    #[inline]
    fn vm(&self) -> &vm::VM<Self::S> {
        self.0.vm()
    }
}

impl<S> ExpansionInput<S> {
    /// Creates a mutable reference to this type from the [VM](vm::VM) type.
    #[inline]
    pub fn new(vm: &mut vm::VM<S>) -> &mut ExpansionInput<S> {
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExpansionInput<S>) }
    }

    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0 .0
    }

    #[inline]
    pub fn expanded(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }

    #[inline]
    fn vm_mut(&mut self) -> &mut vm::VM<S> {
        &mut self.0 .0 .0
    }

    /// Returns a mutable reference to the state.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.vm_mut().state
    }

    /// Returns a reference to the expanded tokens stack for the current input source.
    ///
    /// The tokens are a stack, so the next token is the last token in the vector.
    #[inline]
    pub fn expansions(&self) -> &Vec<Token> {
        self.0 .0 .0.internal.expansions()
    }

    /// Returns a mutable reference to the expanded tokens stack for the current input source.
    ///
    /// The tokens are a stack, so the next token is the last token in the vector.
    #[inline]
    pub fn expansions_mut(&mut self) -> &mut Vec<Token> {
        self.vm_mut().internal.expansions_mut()
    }

    /// Returns a vector than can be used as a token buffer, potentially without allocating memory.
    ///
    /// The returned vector is empty, but will generally have non-zero capacity from previous uses of the buffer.
    /// When finished with the buffer, return it using [return_token_buffer](ExpansionInput::return_token_buffer).
    ///
    /// Token buffers are handed out rather than borrowed because
    ///     at any point in time multiple macros may be in the process of expansion,
    ///     each with its own arguments.
    pub fn checkout_token_buffer(&mut self) -> Vec<Token> {
        self.vm_mut().internal.checkout_token_buffer()
    }

    /// Return a token buffer, allowing it to be reused.
    pub fn return_token_buffer(&mut self, token_buffer: Vec<Token>) {
        self.vm_mut().internal.return_token_buffer(token_buffer)
    }

    /// Registers a callback to run when the current group ends.
    ///
    /// This is the only change an expansion command can make to the group chain.
    /// Conditionals use it to detect groups that end inside a conditional.
    pub fn after_group_callback(&mut self, callback: group::AfterGroupCallback<S>) {
        self.vm_mut().groups.after_group_callback(callback)
    }

    /// Pushes the characters of a string to the front of the input, as TeX's `\the` does.
    ///
    /// Spaces become space tokens and every other character becomes an other token.
    pub fn push_string_tokens(&mut self, token: Token, s: &str) {
        let trace_key = token.trace_key();
        for c in s.chars().rev() {
            let token = match c {
                ' ' => token::Token::new_space(' ', trace_key),
                _ => token::Token::new_other(c, trace_key),
            };
            self.expansions_mut().push(token);
        }
    }
}

impl<S: TexlangState> ExpansionInput<S> {
    /// Push source code to the front of the input stream.
    #[inline]
    pub fn push_source(
        &mut self,
        token: Token,
        file_name: PathBuf,
        source_code: String,
    ) -> txl::Result<()> {
        self.vm_mut()
            .internal
            .push_source(Some(token), file_name, source_code);
        Ok(())
    }
}

/// Input type for execution primitives.
///
/// This type provides:
///
/// - Access to the input stream (with or without expansion). Its implementation of the [TokenStream]
///     trait returns expanded tokens.
///     To read the input stream without performing expansion, use the
///     [unexpanded](ExecutionInput::unexpanded) method.
///
/// - Mutable access to the state and the group chain using
///     the [ExecutionInput::state_mut]
///     and [ExecutionInput::groups_mut] methods.
#[repr(transparent)]
pub struct ExecutionInput<S>(ExpandedStream<S>);

impl<S> std::convert::AsMut<ExpandedStream<S>> for ExecutionInput<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }
}

impl<S: TexlangState> TokenStream for ExecutionInput<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        self.0.next()
    }

    #[inline]
    fn peek(&mut self) -> txl::Result<Option<&Token>> {
        self.0.peek()
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token)
    }

    #[inline]
    fn vm(&self) -> &vm::VM<Self::S> {
        self.0.vm()
    }
}

impl<S> ExecutionInput<S> {
    /// Creates a mutable reference to this type from the [VM](vm::VM) type.
    #[inline]
    pub fn new(vm: &mut vm::VM<S>) -> &mut ExecutionInput<S> {
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExecutionInput<S>) }
    }

    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0 .0
    }

    #[inline]
    fn vm_mut(&mut self) -> &mut vm::VM<S> {
        &mut self.0 .0 .0
    }

    /// Returns a mutable reference to the state.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.vm_mut().state
    }

    #[inline]
    pub fn groups(&self) -> &GroupChain<S> {
        &self.0 .0 .0.groups
    }

    #[inline]
    pub fn groups_mut(&mut self) -> &mut GroupChain<S> {
        &mut self.vm_mut().groups
    }

    /// Returns mutable references to the state and the group chain at the same time.
    #[inline]
    pub fn state_and_groups_mut(&mut self) -> (&mut S, &mut GroupChain<S>) {
        let vm = self.vm_mut();
        (&mut vm.state, &mut vm.groups)
    }

    /// Returns a mutable reference to the control sequence name interner.
    ///
    /// This is used by primitives like `\csname` that create control sequences at runtime.
    #[inline]
    pub fn cs_name_interner_mut(&mut self) -> &mut token::CsNameInterner {
        &mut self.vm_mut().internal.cs_name_interner
    }

    /// Return a token buffer, allowing it to be reused.
    pub fn return_token_buffer(&mut self, token_buffer: Vec<Token>) {
        self.vm_mut().internal.return_token_buffer(token_buffer)
    }
}

impl<S: TexlangState> ExecutionInput<S> {
    /// Begins a new group of the provided type.
    ///
    /// The token is the group's locator; it is used in error messages about the group.
    pub fn begin_group(&mut self, group_type: GroupType, token: Token) -> txl::Result<()> {
        self.groups_mut().begin_group(group_type, Some(token));
        S::group_change_hook(token, self, vm::GroupChange::Began(group_type))
    }

    /// Ends the current group.
    ///
    /// It is an error if there is no group to end,
    ///     or if the current group was not opened by the expected construct.
    /// After the group's bindings are discarded,
    ///     its callbacks run in registration order
    ///     and then its after group tokens are placed at the front of the input,
    ///     also in registration order.
    pub fn end_group(&mut self, token: Token, expected: GroupType) -> txl::Result<()> {
        let actual = self.groups().group_type();
        if self.groups().level() == 0 {
            return Err(vm::EndOfGroupError { token }.into());
        }
        if actual != expected {
            return Err(vm::GroupTypeMismatchError {
                token,
                expected,
                actual,
                opened_by: self.groups().locator(),
            }
            .into());
        }
        S::group_change_hook(token, self, vm::GroupChange::Ending(actual))?;
        let ended = match self.groups_mut().end_group() {
            None => return Err(vm::EndOfGroupError { token }.into()),
            Some(ended) => ended,
        };
        for callback in ended.after_group_callbacks {
            callback(self)?;
        }
        self.0
            .expansions_mut()
            .extend(ended.after_group_tokens.iter().rev());
        Ok(())
    }

    /// Runs the callbacks registered in the current group without ending the group.
    ///
    /// Each callback runs at most once: the callbacks are removed before they run.
    pub fn run_after_group(&mut self) -> txl::Result<()> {
        for callback in self.groups_mut().take_after_group_callbacks() {
            callback(self)?;
        }
        Ok(())
    }
}

/// Strips the lifetime from the token.
///
/// This function is intended to get around limitations of the borrow checker only. It
/// should only be used when the code is actually fine but the borrow checker is being
/// too conservative. Don't do anything fancy.
///
/// See this question for the type of code this function is designed for:
/// https://stackoverflow.com/questions/69680201/is-this-use-of-unsafe-trivially-safe
#[inline]
unsafe fn launder<'a>(token: &Token) -> &'a Token {
    &*(token as *const Token)
}

/// Error returned when the lexer reads a character with category code 15.
#[derive(Debug)]
pub struct InvalidCharacterError {
    pub char: char,
    token: Token,
}

impl error::TexError for InvalidCharacterError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!(
            "input contains a character with category code {} (invalid)",
            types::CatCode::Invalid as u8
        )
    }

    fn notes(&self) -> Vec<error::Note> {
        vec![format!(
            "the character is {:?} (U+{:04X})",
            self.char, self.char as u32
        )
        .into()]
    }
}

mod stream {
    use super::*;
    use crate::token::lexer;

    // The lexer reads category codes from the group chain,
    //  so a \catcode assignment takes effect on the very next character.
    struct LexerConfig<'a, S> {
        groups: &'a GroupChain<S>,
        state: &'a S,
    }

    impl<'a, S: TexlangState> lexer::Config for LexerConfig<'a, S> {
        #[inline]
        fn cat_code(&self, c: char) -> types::CatCode {
            self.groups.cat_code(c)
        }

        #[inline]
        fn end_line_char(&self) -> Option<char> {
            self.state.end_line_char()
        }
    }

    // Reads the next token from the lexer of the current source.
    #[inline]
    fn lex<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<Token>> {
        let config = LexerConfig {
            groups: &vm.groups,
            state: &vm.state,
        };
        match vm
            .internal
            .current_source
            .root
            .next(&config, &mut vm.internal.cs_name_interner)
        {
            Ok(token) => Ok(token),
            Err(lexer::InvalidCharacter { char, trace_key }) => Err(InvalidCharacterError {
                char,
                token: Token::new_other(char, trace_key),
            }
            .into()),
        }
    }

    #[inline]
    pub fn next_unexpanded<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<Token>> {
        if let Some(token) = vm.internal.current_source.expansions.pop() {
            return Ok(Some(token));
        }
        if let Some(token) = lex(vm)? {
            return Ok(Some(token));
        }
        next_unexpanded_recurse(vm)
    }

    fn next_unexpanded_recurse<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<Token>> {
        if vm.internal.pop_source() {
            next_unexpanded(vm)
        } else {
            Ok(None)
        }
    }

    #[inline]
    pub fn peek_unexpanded<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<&Token>> {
        if let Some(token) = vm.internal.current_source.expansions.last() {
            return Ok(Some(unsafe { launder(token) }));
        }
        if let Some(token) = lex(vm)? {
            vm.internal.current_source.expansions.push(token);
            return Ok(vm.internal.current_source.expansions.last());
        }
        peek_unexpanded_recurse(vm)
    }

    fn peek_unexpanded_recurse<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<&Token>> {
        if vm.internal.pop_source() {
            peek_unexpanded(vm)
        } else {
            Ok(None)
        }
    }

    pub fn next_expanded<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<Token>> {
        let (token, command) = match next_unexpanded(vm)? {
            None => return Ok(None),
            Some(token) => match token.value() {
                token::Value::CommandRef(command_ref) => (token, vm.groups.command(&command_ref)),
                _ => return Ok(Some(token)),
            },
        };
        match command {
            Some(command::Command::Expansion(command, tag)) => {
                let command = *command;
                let tag = *tag;
                match S::expansion_override_hook(token, ExpansionInput::new(vm), tag) {
                    Ok(None) => (),
                    Ok(Some(override_expansion)) => {
                        return Ok(Some(override_expansion));
                    }
                    Err(err) => return Err(convert_command_error(vm, token, err)),
                };
                if let Err(err) = command(token, ExpansionInput::new(vm)) {
                    return Err(convert_command_error(vm, token, err));
                };
                next_expanded(vm)
            }
            Some(command::Command::Macro(command)) => {
                let command = command.clone();
                if let Err(err) = command.call(token, ExpansionInput::new(vm)) {
                    return Err(convert_command_error(vm, token, err));
                }
                next_expanded(vm)
            }
            _ => Ok(Some(token)),
        }
    }

    pub fn peek_expanded<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<Option<&Token>> {
        if expand_once(vm)? {
            return peek_expanded(vm);
        }
        peek_unexpanded(vm)
    }

    pub fn expand_once<S: TexlangState>(vm: &mut vm::VM<S>) -> txl::Result<bool> {
        let (token, command) = match peek_unexpanded(vm)? {
            None => return Ok(false),
            Some(token) => match token.value() {
                token::Value::CommandRef(command_ref) => {
                    (*token, vm.groups.command(&command_ref))
                }
                _ => return Ok(false),
            },
        };
        match command {
            Some(command::Command::Expansion(command, tag)) => {
                let command = *command;
                let tag = *tag;
                consume_peek(vm);
                match S::expansion_override_hook(token, ExpansionInput::new(vm), tag) {
                    Ok(None) => (),
                    Ok(Some(override_expansion)) => {
                        vm.internal.expansions_mut().push(override_expansion);
                        return Ok(false);
                    }
                    Err(err) => return Err(convert_command_error(vm, token, err)),
                };
                if let Err(err) = command(token, ExpansionInput::new(vm)) {
                    return Err(convert_command_error(vm, token, err));
                };
                Ok(true)
            }
            Some(command::Command::Macro(command)) => {
                let command = command.clone();
                consume_peek(vm);
                if let Err(err) = command.call(token, ExpansionInput::new(vm)) {
                    return Err(convert_command_error(vm, token, err));
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    #[inline]
    fn consume_peek<S>(vm: &mut vm::VM<S>) {
        // When we peek at a token, it is placed on top of the expansions stack.
        // So to consume the token, we just need to remove it from the stack.
        vm.internal.current_source.expansions.pop();
    }

    fn convert_command_error<S: TexlangState>(
        vm: &mut vm::VM<S>,
        token: Token,
        err: Box<error::Error>,
    ) -> Box<error::Error> {
        error::Error::new_propagated(vm, error::OperationKind::Expansion, token, err)
    }
}
