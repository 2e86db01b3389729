//! TeX tokens and category codes.

mod catcode;
pub mod lexer;
pub mod trace;
pub use catcode::CatCode;
use std::fmt::Display;
use std::num;
use texcraft_stdext::collections::interner;

/// String type used to represent control sequence names in Texlang.
///
/// The implementation of this type is opaque so that it can be performance optimized
/// without worrying about downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsName(num::NonZeroU32);

/// String interner for control sequence names.
pub type CsNameInterner = interner::Interner<CsName>;

impl interner::Key for CsName {
    fn try_from_usize(index: usize) -> Option<Self> {
        <num::NonZeroU32 as interner::Key>::try_from_usize(index).map(CsName)
    }

    fn into_usize(self) -> usize {
        <num::NonZeroU32 as interner::Key>::into_usize(self.0)
    }
}

/// The value of a token.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    BeginGroup(char),
    EndGroup(char),
    MathShift(char),
    AlignmentTab(char),
    Parameter(char),
    Superscript(char),
    Subscript(char),
    Space(char),
    Letter(char),
    Other(char),
    CommandRef(CommandRef),
}

/// The value of a token that references a command.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandRef {
    ControlSequence(CsName),
    ActiveCharacter(char),
}

impl CommandRef {
    pub fn to_string(&self, cs_name_interner: &CsNameInterner) -> String {
        match self {
            CommandRef::ControlSequence(cs_name) => {
                format!("\\{}", cs_name_interner.resolve(*cs_name).unwrap_or(""))
            }
            CommandRef::ActiveCharacter(c) => format!("{c}"),
        }
    }
}

impl Value {
    /// Build the value of a character token.
    ///
    /// # Panics
    ///
    /// Panics if the category code is raw (see [CatCode::is_raw]).
    /// Such codes never appear on tokens.
    pub fn new(c: char, cat_code: CatCode) -> Value {
        match cat_code {
            CatCode::BeginGroup => Value::BeginGroup(c),
            CatCode::EndGroup => Value::EndGroup(c),
            CatCode::MathShift => Value::MathShift(c),
            CatCode::AlignmentTab => Value::AlignmentTab(c),
            CatCode::Parameter => Value::Parameter(c),
            CatCode::Superscript => Value::Superscript(c),
            CatCode::Subscript => Value::Subscript(c),
            CatCode::Space => Value::Space(c),
            CatCode::Letter => Value::Letter(c),
            CatCode::Other => Value::Other(c),
            CatCode::Active => Value::CommandRef(CommandRef::ActiveCharacter(c)),
            raw => panic!("raw category code {raw} cannot be the value of a token"),
        }
    }

    /// The character of this value, or [None] for control sequences.
    pub fn char(&self) -> Option<char> {
        match *self {
            Value::BeginGroup(c)
            | Value::EndGroup(c)
            | Value::MathShift(c)
            | Value::AlignmentTab(c)
            | Value::Parameter(c)
            | Value::Superscript(c)
            | Value::Subscript(c)
            | Value::Space(c)
            | Value::Letter(c)
            | Value::Other(c)
            | Value::CommandRef(CommandRef::ActiveCharacter(c)) => Some(c),
            Value::CommandRef(CommandRef::ControlSequence(_)) => None,
        }
    }

    /// The category code of this value, or [None] for control sequences.
    pub fn cat_code(&self) -> Option<CatCode> {
        Some(match self {
            Value::BeginGroup(_) => CatCode::BeginGroup,
            Value::EndGroup(_) => CatCode::EndGroup,
            Value::MathShift(_) => CatCode::MathShift,
            Value::AlignmentTab(_) => CatCode::AlignmentTab,
            Value::Parameter(_) => CatCode::Parameter,
            Value::Superscript(_) => CatCode::Superscript,
            Value::Subscript(_) => CatCode::Subscript,
            Value::Space(_) => CatCode::Space,
            Value::Letter(_) => CatCode::Letter,
            Value::Other(_) => CatCode::Other,
            Value::CommandRef(CommandRef::ActiveCharacter(_)) => CatCode::Active,
            Value::CommandRef(CommandRef::ControlSequence(_)) => return None,
        })
    }

    /// A human readable description of the value, used in error messages.
    pub fn describe(&self, cs_name_interner: &CsNameInterner) -> String {
        match self {
            Value::CommandRef(CommandRef::ControlSequence(_)) => {
                format!["the control sequence {}", self.to_string(cs_name_interner)]
            }
            Value::CommandRef(CommandRef::ActiveCharacter(c)) => {
                format!["the active character {c}"]
            }
            Value::Letter(c) => format!["the letter {c}"],
            Value::Other(c) => format!["the non-letter character {c}"],
            _ => match (self.char(), self.cat_code()) {
                (Some(c), Some(code)) => {
                    format!["a token with value {c:?} and category code {code}"]
                }
                _ => "a token".to_string(),
            },
        }
    }

    pub fn to_string(&self, cs_name_interner: &CsNameInterner) -> String {
        match self {
            Value::CommandRef(command_ref) => command_ref.to_string(cs_name_interner),
            _ => self.char().map(String::from).unwrap_or_default(),
        }
    }
}

/// A TeX token.
///
/// Equality of tokens only considers their values, not where they came from.
#[derive(Debug, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    value: Value,
    trace_key: trace::Key,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

macro_rules! token_constructor {
    ($name: ident, $value: expr) => {
        pub fn $name(c: char, trace_key: trace::Key) -> Token {
            Token {
                value: $value(c),
                trace_key,
            }
        }
    };
}

impl Token {
    token_constructor!(new_begin_group, Value::BeginGroup);
    token_constructor!(new_end_group, Value::EndGroup);
    token_constructor!(new_math_shift, Value::MathShift);
    token_constructor!(new_alignment_tab, Value::AlignmentTab);
    token_constructor!(new_parameter, Value::Parameter);
    token_constructor!(new_superscript, Value::Superscript);
    token_constructor!(new_subscript, Value::Subscript);
    token_constructor!(new_space, Value::Space);
    token_constructor!(new_letter, Value::Letter);
    token_constructor!(new_other, Value::Other);

    pub fn new_active_character(c: char, trace_key: trace::Key) -> Token {
        Token {
            value: Value::CommandRef(CommandRef::ActiveCharacter(c)),
            trace_key,
        }
    }

    pub fn new_control_sequence(name: CsName, trace_key: trace::Key) -> Token {
        Token {
            value: Value::CommandRef(CommandRef::ControlSequence(name)),
            trace_key,
        }
    }

    pub fn new_from_value(value: Value, trace_key: trace::Key) -> Token {
        Token { value, trace_key }
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    #[inline]
    pub fn trace_key(&self) -> trace::Key {
        self.trace_key
    }

    #[inline]
    pub fn char(&self) -> Option<char> {
        self.value.char()
    }

    #[inline]
    pub fn cat_code(&self) -> Option<CatCode> {
        self.value.cat_code()
    }
}

enum PendingWhitespace {
    NotStarted,
    None,
    Space,
    Newlines(usize),
}

impl PendingWhitespace {
    fn start(&mut self) {
        *self = PendingWhitespace::None;
    }

    fn add_space(&mut self) {
        if let PendingWhitespace::None = self {
            *self = PendingWhitespace::Space;
        }
    }

    fn add_newline(&mut self) {
        *self = match self {
            PendingWhitespace::NotStarted => PendingWhitespace::NotStarted,
            PendingWhitespace::None | PendingWhitespace::Space => PendingWhitespace::Newlines(1),
            PendingWhitespace::Newlines(n) => PendingWhitespace::Newlines(*n + 1),
        }
    }
}

impl Display for PendingWhitespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingWhitespace::NotStarted | PendingWhitespace::None => Ok(()),
            PendingWhitespace::Space => write!(f, " "),
            PendingWhitespace::Newlines(n) => {
                for _ in 0..*n {
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Writes tokens to an IO writer, collapsing runs of whitespace.
///
/// Leading and trailing whitespace is dropped.
pub struct Writer<I> {
    io_writer: I,
    pending_whitespace: PendingWhitespace,
}

impl<I: Default> Default for Writer<I> {
    fn default() -> Self {
        Writer::new(Default::default())
    }
}

impl<I> Writer<I> {
    /// Create a new writer that writes output to the provided IO writer.
    pub fn new(io_writer: I) -> Self {
        Self {
            io_writer,
            pending_whitespace: PendingWhitespace::NotStarted,
        }
    }

    pub fn take_io_writer(self) -> I {
        self.io_writer
    }
}

impl<I: std::io::Write> Writer<I> {
    /// Write a token.
    pub fn write(&mut self, interner: &CsNameInterner, token: Token) -> std::io::Result<()> {
        match token.value {
            Value::Space('\n') => self.pending_whitespace.add_newline(),
            Value::Space(_) => self.pending_whitespace.add_space(),
            value => {
                write!(
                    self.io_writer,
                    "{}{}",
                    self.pending_whitespace,
                    value.to_string(interner)
                )?;
                self.pending_whitespace.start();
            }
        }
        Ok(())
    }
}

/// Write a collection of tokens to a string.
pub fn write_tokens<'a, T>(tokens: T, interner: &CsNameInterner) -> String
where
    T: IntoIterator<Item = &'a Token>,
{
    let mut writer: Writer<Vec<u8>> = Default::default();
    for token in tokens.into_iter() {
        // Writing to a vector cannot fail.
        let _ = writer.write(interner, *token);
    }
    String::from_utf8_lossy(&writer.take_io_writer()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    enum PreInternedToken {
        ControlSequence(&'static str),
        Character(char, CatCode),
    }

    macro_rules! write_tokens_test {
        ($name: ident, $input: expr, $want: expr) => {
            #[test]
            fn $name() {
                let mut tokens: Vec<Token> = vec![];
                let mut interner = CsNameInterner::default();
                for pre_interned_token in $input {
                    let token = match pre_interned_token {
                        PreInternedToken::ControlSequence(name) => {
                            let cs_name = interner.get_or_intern(name);
                            Token::new_control_sequence(cs_name, trace::Key::dummy())
                        }
                        PreInternedToken::Character(c, code) => {
                            Token::new_from_value(Value::new(c, code), trace::Key::dummy())
                        }
                    };
                    tokens.push(token);
                }
                let got = write_tokens(&tokens, &interner);
                let want = $want.to_string();
                assert_eq!(got, want);
            }
        };
    }

    write_tokens_test!(blank, vec!(), "");
    write_tokens_test![
        trim_whitespace_from_start,
        vec![
            PreInternedToken::Character('\n', CatCode::Space),
            PreInternedToken::Character(' ', CatCode::Space),
            PreInternedToken::Character('H', CatCode::Letter),
        ],
        "H"
    ];
    write_tokens_test![
        trim_whitespace_from_end,
        vec![
            PreInternedToken::Character('H', CatCode::Letter),
            PreInternedToken::Character(' ', CatCode::Space),
            PreInternedToken::Character('\n', CatCode::Space),
        ],
        "H"
    ];
    write_tokens_test![
        collapse_spaces,
        vec![
            PreInternedToken::Character('H', CatCode::Letter),
            PreInternedToken::Character(' ', CatCode::Space),
            PreInternedToken::Character(' ', CatCode::Space),
            PreInternedToken::Character('W', CatCode::Letter),
        ],
        "H W"
    ];
    write_tokens_test![
        newlines_win_over_spaces,
        vec![
            PreInternedToken::Character('H', CatCode::Letter),
            PreInternedToken::Character('\n', CatCode::Space),
            PreInternedToken::Character(' ', CatCode::Space),
            PreInternedToken::Character('\n', CatCode::Space),
            PreInternedToken::Character('W', CatCode::Letter),
        ],
        "H\n\nW"
    ];
    write_tokens_test![
        control_sequence_and_active_character,
        vec![
            PreInternedToken::ControlSequence("ifnum"),
            PreInternedToken::Character('~', CatCode::Active),
        ],
        "\\ifnum~"
    ];

    #[test]
    fn value_char_and_cat_code() {
        let value = Value::new('a', CatCode::Letter);
        assert_eq!(value.char(), Some('a'));
        assert_eq!(value.cat_code(), Some(CatCode::Letter));
        let mut interner = CsNameInterner::default();
        let cs = Value::CommandRef(CommandRef::ControlSequence(interner.get_or_intern("fi")));
        assert_eq!(cs.char(), None);
        assert_eq!(cs.cat_code(), None);
        assert_eq!(cs.to_string(&interner), "\\fi");
    }

    #[test]
    fn token_equality_ignores_trace_key() {
        let a = Token::new_letter('a', trace::Key::dummy());
        let mut range = trace::KeyRange::for_testing();
        let b = Token::new_letter('a', range.next());
        assert_eq!(a, b);
    }

    #[test]
    fn token_size() {
        assert_eq!(std::mem::size_of::<Value>(), 8);
        assert_eq!(std::mem::size_of::<Token>(), 12);
        assert_eq!(std::mem::size_of::<Result<Token, Box<error::Error>>>(), 16);
    }
}
