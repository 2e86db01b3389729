//! Texlang commands API
//!
//! One of the most important parts of any TeX engine is the primitives that it provides.
//! This module describes the mechanism by which TeX engines add new primitives.
//!
//! A note on terminology: *commands* can be categorized into primitives,
//! which are implemented in the TeX engine, and user defined macros,
//!  which are created in specific TeX documents using primitives like `\def`.
//!
//! ## Expansion vs execution
//!
//! Expansion and execution commands seem similar because they both optionally
//! read input tokens and then make changes to the VM.
//! However the differences are pretty significant in practice:
//!
//! |                                          | Expansion | Execution
//! |------------------------------------------|-----------|-----------
//! Can read tokens from the input stream?     | Yes       | Yes
//! Can add tokens to the input stream?        | Yes       | It's possible, but the API discourages it.
//! Can make changes to the group chain?       | No        | Yes
//! Is evaluated when tokens are only being expanded | Yes | No
//!
//! Conditionals are the exception to the second last row.
//! They are expansion commands, but they keep their own stack in the state.

use crate::prelude as txl;
use crate::texmacro;
use crate::token;
use crate::variable;
use crate::vm;
use std::num;
use std::rc;
use std::sync::atomic;

/// The Rust type of expansion primitive functions.
pub type ExpansionFn<S> =
    fn(token: token::Token, input: &mut vm::ExpansionInput<S>) -> txl::Result<()>;

/// The Rust type of execution primitive functions.
pub type ExecutionFn<S> =
    fn(token: token::Token, input: &mut vm::ExecutionInput<S>) -> txl::Result<()>;

/// A TeX command.
pub enum Command<S> {
    /// An expansion primitive that is implemented in the engine.
    ///
    /// Examples: `\the`, `\ifnum`.
    Expansion(ExpansionFn<S>, Option<Tag>),

    /// A user defined macro.
    Macro(rc::Rc<texmacro::Macro>),

    /// A non-expansion primitive that performs operations on the state.
    ///
    /// Examples: `\def`, `\begingroup`.
    Execution(ExecutionFn<S>, Option<Tag>),

    /// A command that is used to reference a variable, like a parameter or a register.
    ///
    /// Examples: `\count`, `\catcode`, `\tracingifs`.
    Variable(rc::Rc<variable::Command<S>>),

    /// A command that aliases a character token.
    ///
    /// Depending on the context in which this command appears it may behave like a
    ///   character (when typesetting or comparing with `\if`) or like an unexpandable command.
    /// Created using `\let\cmd=<character>`.
    CharacterTokenAlias(token::Value),
}

impl<S> std::fmt::Display for Command<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Expansion(_, _) => write![f, "an expansion command"],
            Command::Macro(_) => write![f, "a user-defined macro"],
            Command::Execution(_, _) => write![f, "an execution command"],
            Command::Variable(_) => write![f, "a variable command"],
            Command::CharacterTokenAlias(_) => write![f, "a character token alias"],
        }
    }
}

impl<S> Command<S> {
    /// Gets the tag associated to this command, or [None] if the command has no tag.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Command::Expansion(_, tag) => *tag,
            Command::Execution(_, tag) => *tag,
            Command::Macro(_) | Command::Variable(_) | Command::CharacterTokenAlias(_) => None,
        }
    }
}

/// Returns whether two possibly undefined commands are the same, in the sense of `\ifx`.
///
/// Two primitives are equal if they have the same [PrimitiveKey].
/// Macros are equal if they have the same prefix, parameters and replacement text.
/// Character aliases are equal if they alias the same value.
/// Two undefined commands are equal.
pub fn equal<S>(lhs: Option<&Command<S>>, rhs: Option<&Command<S>>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(Command::Macro(a)), Some(Command::Macro(b))) => a == b,
        (Some(Command::CharacterTokenAlias(a)), Some(Command::CharacterTokenAlias(b))) => a == b,
        (Some(a), Some(b)) => match (PrimitiveKey::new(a), PrimitiveKey::new(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// A built-in command. This is a command provided at VM initialization.
///
/// This struct is simply a combination of a [Command] and a documentation string for the command.
pub struct BuiltIn<S> {
    cmd: Command<S>,
    doc: Option<&'static str>,
}

impl<S> BuiltIn<S> {
    /// Create a new expansion built-in command.
    pub fn new_expansion(t: ExpansionFn<S>) -> BuiltIn<S> {
        t.into()
    }

    /// Create a new execution built-in command.
    pub fn new_execution(t: ExecutionFn<S>) -> BuiltIn<S> {
        t.into()
    }

    /// Create a new variable built-in command.
    pub fn new_variable(cmd: variable::Command<S>) -> BuiltIn<S> {
        Command::Variable(rc::Rc::new(cmd)).into()
    }

    /// Set the tag for this built-in command.
    ///
    /// # Panics
    ///
    /// Panics if the command is not an expansion or execution command.
    /// Built-ins are assembled when the VM is constructed, so this is a programming error.
    pub fn with_tag(mut self, tag: Tag) -> BuiltIn<S> {
        match &mut self.cmd {
            Command::Expansion(_, t) => *t = Some(tag),
            Command::Execution(_, t) => *t = Some(tag),
            Command::Macro(_) | Command::Variable(_) | Command::CharacterTokenAlias(_) => {
                panic!("cannot add a tag to this type of command")
            }
        }
        self
    }

    // Set the doc for this built-in command.
    pub fn with_doc(mut self, doc: &'static str) -> BuiltIn<S> {
        self.doc = Some(doc);
        self
    }

    pub fn cmd(&self) -> &Command<S> {
        &self.cmd
    }

    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }
}

// We need to implement Clone manually as the derived implementation requires S to be Clone.
impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        match self {
            Command::Expansion(e, t) => Command::Expansion::<S>(*e, *t),
            Command::Macro(m) => Command::Macro(m.clone()),
            Command::Execution(e, t) => Command::Execution(*e, *t),
            Command::Variable(v) => Command::Variable(v.clone()),
            Command::CharacterTokenAlias(tv) => Command::CharacterTokenAlias(*tv),
        }
    }
}

impl<S> Clone for BuiltIn<S> {
    fn clone(&self) -> Self {
        Self {
            cmd: self.cmd.clone(),
            doc: self.doc,
        }
    }
}

impl<S> From<ExpansionFn<S>> for BuiltIn<S> {
    fn from(cmd: ExpansionFn<S>) -> Self {
        Command::Expansion(cmd, None).into()
    }
}

impl<S> From<rc::Rc<texmacro::Macro>> for BuiltIn<S> {
    fn from(cmd: rc::Rc<texmacro::Macro>) -> Self {
        Command::Macro(cmd).into()
    }
}

impl<S> From<ExecutionFn<S>> for BuiltIn<S> {
    fn from(cmd: ExecutionFn<S>) -> Self {
        Command::Execution(cmd, None).into()
    }
}

impl<S> From<variable::Command<S>> for BuiltIn<S> {
    fn from(cmd: variable::Command<S>) -> Self {
        Command::Variable(rc::Rc::new(cmd)).into()
    }
}

impl<S> From<Command<S>> for BuiltIn<S> {
    fn from(cmd: Command<S>) -> Self {
        BuiltIn { cmd, doc: None }
    }
}

impl<S> From<BuiltIn<S>> for Command<S> {
    fn from(built_in: BuiltIn<S>) -> Self {
        built_in.cmd
    }
}

/// A tag is a piece of metadata that is optionally attached to a command.
///
/// Tags are used to implement certain TeX language semantics.
/// The main example is TeX conditionals.
/// When a TeX conditional statement evaluates to false, the `\if` command must scan
///     the input stream until it finds either an `\else` or `\fi` command.
/// While scanning it must also count nested conditionals,
///     so every `\if`-like command has to be recognizable too.
/// Tags are the mechanism by which the scanning algorithm
///     classifies the tokens it reads.
/// Concretely, `\else`, `\or` and `\fi` each have a unique tag,
///     and every `\if`-like command shares one more tag.
/// When scanning the stream,
///     if a token is a command token then the tag for the associated command is
///     compared to the known tags.
///
/// The same tag can be used for multiple commands,
/// but each command can only have one tag.
///
/// ## Implementation details
///
/// Tags are non-zero 32 bit integers handed out by a global atomic counter.
/// Tags have the property that `Option<Tag>` takes up 4 bytes in memory.
#[derive(PartialEq, Eq, Clone, Copy, Debug, PartialOrd, Ord, Hash)]
pub struct Tag(num::NonZeroU32);

static NEXT_TAG_VALUE: atomic::AtomicU32 = atomic::AtomicU32::new(1);

impl Tag {
    /// Creates a new unique tag.
    ///
    /// ```
    /// # use texlang::command::Tag;
    /// let tag_1 = Tag::new();
    /// let tag_2 = Tag::new();
    /// assert_ne!(tag_1, tag_2);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics after 2^32 - 1 tags have been created.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Tag {
        let n = NEXT_TAG_VALUE.fetch_add(1, atomic::Ordering::Relaxed);
        match num::NonZeroU32::new(n) {
            Some(n) => Tag(n),
            None => panic!("ran out of command tags"),
        }
    }
}

/// A static tag enables creating a tag in a static variable.
///
/// ```
/// # use texlang::command::StaticTag;
/// static TAG: StaticTag = StaticTag::new();
///
/// let first_get = TAG.get();
/// let second_get = TAG.get();
/// assert_eq!(first_get, second_get);
/// ```
pub struct StaticTag(std::sync::OnceLock<Tag>);

impl Default for StaticTag {
    fn default() -> Self {
        StaticTag::new()
    }
}

impl StaticTag {
    /// Create a new static tag.
    pub const fn new() -> StaticTag {
        StaticTag(std::sync::OnceLock::new())
    }

    /// Get the actual [Tag] out of this [StaticTag].
    /// Repeated calls to this function return the same tag.
    ///
    /// The [Tag] is lazily constructed, so this is not a trivial getter.
    /// Hot loops like the conditional skip scan should read the tag once up front.
    pub fn get(&self) -> Tag {
        *self.0.get_or_init(Tag::new)
    }
}

/// A primitive key uniquely identifies a primitive.
///
/// If two commands have the same key, they are the same primitive (expansion, execution, or variable primitive).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) enum PrimitiveKey {
    Execution(usize, Option<Tag>),
    Expansion(usize, Option<Tag>),
    Variable(variable::Key),
}

impl PrimitiveKey {
    /// Returns [None] if the command is not a primitive (a macro or a token alias).
    pub(crate) fn new<S>(command: &Command<S>) -> Option<Self> {
        match command {
            Command::Expansion(f, tag) => Some(PrimitiveKey::Expansion(*f as usize, *tag)),
            Command::Execution(f, tag) => Some(PrimitiveKey::Execution(*f as usize, *tag)),
            Command::Variable(v) => Some(PrimitiveKey::Variable(v.key())),
            Command::Macro(_) | Command::CharacterTokenAlias(_) => None,
        }
    }
}
