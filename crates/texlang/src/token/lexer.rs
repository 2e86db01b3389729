//! The TeX lexer, which reads input streams of characters and outputs TeX tokens.
//!
//! Because of restrictions of the TeX language itself, the lexer is "just in time". It only
//! produces the next token when that token is requested.
//! Lexing in TeX is controlled by category codes which can change at runtime based on
//! the tokens the lexer has already produced. Consider:
//! ```tex
//! \catcode`\A=10 AB
//! ```
//! If tokenized as a batch, the lexer would return a letter token A.
//! But the first command changes A to be a space character, and so the correct result
//! is the command followed by the single letter token B.
//!
//! The lexer follows the line-oriented rules of chapter 8 of the TeXBook:
//!     each line ends with the current end-of-line character,
//!     a line containing only spaces produces a `\par` token,
//!     and spaces are skipped at the start of lines and after control words.

use crate::token::trace;
use crate::token::CatCode;
use crate::token::CsNameInterner;
use crate::token::Token;

/// Configuration that the lexer reads while producing tokens.
///
/// Both values are read on demand, so changes made by commands take effect on the next character.
pub trait Config {
    fn cat_code(&self, c: char) -> CatCode;

    fn end_line_char(&self) -> Option<char>;
}

/// An invalid character (category code 15) was found in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCharacter {
    pub char: char,
    pub trace_key: trace::Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NewLine,
    MidLine,
    SkipBlanks,
}

/// The Texlang lexer
pub struct Lexer {
    raw_lexer: RawLexer,
    state: State,
    // Control sequence names are read into a shared buffer to avoid allocating for each one.
    buffer: String,
}

impl Lexer {
    pub fn new(source_code: String, trace_key_range: trace::KeyRange) -> Lexer {
        Lexer {
            raw_lexer: RawLexer::new(source_code, trace_key_range),
            state: State::NewLine,
            buffer: Default::default(),
        }
    }

    /// Returns the next token, or [None] if the source code is exhausted.
    pub fn next<C: Config>(
        &mut self,
        config: &C,
        cs_name_interner: &mut CsNameInterner,
    ) -> Result<Option<Token>, InvalidCharacter> {
        while let Some(raw_token) = self.raw_lexer.next(config) {
            let c = raw_token.char;
            let key = raw_token.trace_key;
            let token = match raw_token.code {
                CatCode::Escape => {
                    let (name, is_control_word) = self.read_control_sequence(config);
                    let skip_blanks = is_control_word || name == " ";
                    let cs_name = cs_name_interner.get_or_intern(name);
                    self.state = if skip_blanks {
                        State::SkipBlanks
                    } else {
                        State::MidLine
                    };
                    return Ok(Some(Token::new_control_sequence(cs_name, key)));
                }
                CatCode::EndOfLine => {
                    self.raw_lexer.skip_rest_of_line();
                    let state = self.state;
                    self.state = State::NewLine;
                    match state {
                        State::NewLine => {
                            Token::new_control_sequence(cs_name_interner.get_or_intern("par"), key)
                        }
                        State::MidLine => Token::new_space(' ', key),
                        State::SkipBlanks => continue,
                    }
                }
                CatCode::Space => match self.state {
                    State::MidLine => {
                        self.state = State::SkipBlanks;
                        Token::new_space(' ', key)
                    }
                    State::NewLine | State::SkipBlanks => continue,
                },
                CatCode::Superscript if self.raw_lexer.maybe_apply_caret_notation(c) => {
                    continue;
                }
                CatCode::Comment => {
                    self.raw_lexer.skip_rest_of_line();
                    self.state = State::NewLine;
                    continue;
                }
                CatCode::Ignored => continue,
                CatCode::Invalid => {
                    return Err(InvalidCharacter {
                        char: c,
                        trace_key: key,
                    })
                }
                code => {
                    self.state = State::MidLine;
                    Token::new_from_value(crate::token::Value::new(c, code), key)
                }
            };
            return Ok(Some(token));
        }
        Ok(None)
    }

    /// Reads the name of a control sequence after the escape character.
    ///
    /// Returns the name and whether it is a control word (made of letters).
    fn read_control_sequence<C: Config>(&mut self, config: &C) -> (&str, bool) {
        self.buffer.clear();
        let first = loop {
            match self.raw_lexer.next(config) {
                // A lone escape character at the very end of the input.
                None => return (&self.buffer, false),
                Some(raw_token) => {
                    if raw_token.code == CatCode::Superscript
                        && self.raw_lexer.maybe_apply_caret_notation(raw_token.char)
                    {
                        continue;
                    }
                    break raw_token;
                }
            }
        };
        self.buffer.push(first.char);
        if first.code != CatCode::Letter {
            return (&self.buffer, false);
        }
        while let Some(raw_token) = self.raw_lexer.peek(config) {
            match raw_token.code {
                CatCode::Letter => {
                    self.raw_lexer.advance();
                    self.buffer.push(raw_token.char);
                }
                CatCode::Superscript => {
                    if !self.raw_lexer.maybe_apply_caret_notation_at_peek(raw_token.char) {
                        break;
                    }
                }
                _ => break,
            }
        }
        (&self.buffer, true)
    }
}

struct RawToken {
    code: CatCode,
    char: char,
    trace_key: trace::Key,
}

/// Iterates over the characters of the source code.
///
/// Newlines in the source are replaced by the current end-of-line character.
/// If the source does not end in a newline, one end-of-line character is appended.
struct RawLexer {
    source_code: String,
    pos: usize,
    trace_key_range: trace::KeyRange,
    // Set when the character at `pos` was rewritten by caret notation.
    replacement: Option<char>,
    final_end_line_char_emitted: bool,
}

impl RawLexer {
    fn new(source_code: String, trace_key_range: trace::KeyRange) -> RawLexer {
        RawLexer {
            source_code,
            pos: 0,
            trace_key_range,
            replacement: None,
            final_end_line_char_emitted: false,
        }
    }

    fn current_char<C: Config>(&self, config: &C) -> Option<(char, usize)> {
        if let Some(c) = self.replacement {
            let len = self.source_code[self.pos..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(0);
            return Some((c, len));
        }
        match self.source_code[self.pos..].chars().next() {
            Some('\n') => config.end_line_char().map(|c| (c, 1)).or(Some(('\n', 1))),
            Some(c) => Some((c, c.len_utf8())),
            None => {
                if self.final_end_line_char_emitted
                    || self.source_code.is_empty()
                    || self.source_code.ends_with('\n')
                {
                    None
                } else {
                    config.end_line_char().map(|c| (c, 0))
                }
            }
        }
    }

    fn is_suppressed_newline<C: Config>(&self, config: &C) -> bool {
        self.replacement.is_none()
            && config.end_line_char().is_none()
            && self.source_code[self.pos..].starts_with('\n')
    }

    fn next<C: Config>(&mut self, config: &C) -> Option<RawToken> {
        loop {
            if self.is_suppressed_newline(config) {
                self.advance();
                continue;
            }
            let raw_token = self.peek(config)?;
            self.advance();
            return Some(raw_token);
        }
    }

    fn peek<C: Config>(&mut self, config: &C) -> Option<RawToken> {
        while self.is_suppressed_newline(config) {
            self.advance();
        }
        let (c, _) = self.current_char(config)?;
        Some(RawToken {
            char: c,
            code: config.cat_code(c),
            trace_key: self.trace_key_range.peek(),
        })
    }

    fn advance(&mut self) {
        self.replacement = None;
        match self.source_code[self.pos..].chars().next() {
            Some(c) => self.pos += c.len_utf8(),
            None => self.final_end_line_char_emitted = true,
        }
        self.trace_key_range.next();
    }

    /// Discards characters up to and including the next newline.
    fn skip_rest_of_line(&mut self) {
        self.replacement = None;
        if self.pos > 0 && self.source_code.as_bytes()[self.pos - 1] == b'\n' {
            // The end-of-line character that was just consumed was the newline itself.
            return;
        }
        while let Some(c) = self.source_code[self.pos..].chars().next() {
            self.advance();
            if c == '\n' {
                return;
            }
        }
        self.final_end_line_char_emitted = true;
    }

    /// Applies caret notation `^^X` where the first caret has already been consumed.
    fn maybe_apply_caret_notation(&mut self, c1: char) -> bool {
        let rest = &self.source_code[self.pos..];
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c2), Some(c3)) if c2 == c1 && c3 != '\n' && c3.is_ascii() => {
                self.advance();
                self.replacement = Some(caret_transform(c3));
                true
            }
            _ => false,
        }
    }

    /// Applies caret notation `^^X` where the first caret is the current (peeked) character.
    fn maybe_apply_caret_notation_at_peek(&mut self, c1: char) -> bool {
        if self.replacement.is_some() {
            return false;
        }
        let rest = &self.source_code[self.pos..];
        let mut chars = rest.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(_), Some(c2), Some(c3)) if c2 == c1 && c3 != '\n' && c3.is_ascii() => {
                self.advance();
                self.advance();
                self.replacement = Some(caret_transform(c3));
                true
            }
            _ => false,
        }
    }
}

fn caret_transform(c: char) -> char {
    let u = c as u8;
    let m = if u < 0x40 { u + 0x40 } else { u - 0x40 };
    m as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Value;
    use std::collections::HashMap;

    struct TestConfig {
        cat_codes: HashMap<char, CatCode>,
        end_line_char: Option<char>,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            let mut cat_codes = HashMap::new();
            for c in ('a'..='z').chain('A'..='Z') {
                cat_codes.insert(c, CatCode::Letter);
            }
            cat_codes.insert('\\', CatCode::Escape);
            cat_codes.insert('{', CatCode::BeginGroup);
            cat_codes.insert('}', CatCode::EndGroup);
            cat_codes.insert('^', CatCode::Superscript);
            cat_codes.insert(' ', CatCode::Space);
            cat_codes.insert('\r', CatCode::EndOfLine);
            cat_codes.insert('%', CatCode::Comment);
            cat_codes.insert('~', CatCode::Active);
            cat_codes.insert('\u{7F}', CatCode::Invalid);
            TestConfig {
                cat_codes,
                end_line_char: Some('\r'),
            }
        }
    }

    impl Config for TestConfig {
        fn cat_code(&self, c: char) -> CatCode {
            self.cat_codes.get(&c).copied().unwrap_or_default()
        }
        fn end_line_char(&self) -> Option<char> {
            self.end_line_char
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Want {
        Char(char, CatCode),
        Cs(&'static str),
    }
    use Want::*;

    fn lex(config: &TestConfig, input: &str) -> Vec<Want> {
        let mut interner: CsNameInterner = Default::default();
        let mut tracer: trace::Tracer = Default::default();
        let range = tracer.register_source_code(None, trace::Origin::Unknown, input);
        let mut lexer = Lexer::new(input.to_string(), range);
        let mut result = vec![];
        while let Some(token) = lexer.next(config, &mut interner).unwrap() {
            result.push(match token.value() {
                Value::CommandRef(crate::token::CommandRef::ControlSequence(name)) => {
                    Cs(leak(interner.resolve(name).unwrap()))
                }
                _ => Char(token.char().unwrap(), token.cat_code().unwrap()),
            });
        }
        result
    }

    fn leak(s: &str) -> &'static str {
        Box::leak(s.to_string().into_boxed_str())
    }

    macro_rules! lexer_tests {
        ($( ($name: ident, $input: expr, $want: expr), )+) => {
            $(
                #[test]
                fn $name() {
                    let config: TestConfig = Default::default();
                    assert_eq!(lex(&config, $input), $want);
                }
            )+
        };
    }

    lexer_tests!(
        (empty, "", vec![]),
        (
            letters_and_trailing_space,
            "ab",
            vec![
                Char('a', CatCode::Letter),
                Char('b', CatCode::Letter),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            control_word_skips_spaces,
            "\\a   b",
            vec![Cs("a"), Char('b', CatCode::Letter), Char(' ', CatCode::Space)]
        ),
        (
            control_symbol_keeps_spaces,
            "\\{ b",
            vec![
                Cs("{"),
                Char(' ', CatCode::Space),
                Char('b', CatCode::Letter),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            spaces_collapse,
            "a   b\n",
            vec![
                Char('a', CatCode::Letter),
                Char(' ', CatCode::Space),
                Char('b', CatCode::Letter),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            leading_spaces_skipped,
            "   a\n",
            vec![Char('a', CatCode::Letter), Char(' ', CatCode::Space)]
        ),
        (
            blank_line_is_par,
            "a\n\nb\n",
            vec![
                Char('a', CatCode::Letter),
                Char(' ', CatCode::Space),
                Cs("par"),
                Char('b', CatCode::Letter),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            comment_removes_end_of_line,
            "a% comment\nb\n",
            vec![
                Char('a', CatCode::Letter),
                Char('b', CatCode::Letter),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            control_word_at_end_of_line,
            "\\a\nb",
            vec![Cs("a"), Char('b', CatCode::Letter), Char(' ', CatCode::Space)]
        ),
        (
            escape_at_end_of_line,
            "\\\n",
            vec![Cs("\r")]
        ),
        (
            groups_and_active,
            "{~}",
            vec![
                Char('{', CatCode::BeginGroup),
                Char('~', CatCode::Active),
                Char('}', CatCode::EndGroup),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            caret_notation,
            "^^5a^^4",
            vec![
                Char('u', CatCode::Letter),
                Char('a', CatCode::Letter),
                Char('t', CatCode::Letter),
                Char(' ', CatCode::Space)
            ]
        ),
        (
            caret_notation_in_control_word,
            "\\i^^&false",
            vec![Cs("iffalse"), ]
        ),
        (
            non_letter_default_other,
            "1=",
            vec![
                Char('1', CatCode::Other),
                Char('=', CatCode::Other),
                Char(' ', CatCode::Space)
            ]
        ),
    );

    #[test]
    fn no_end_line_char() {
        let config = TestConfig {
            end_line_char: None,
            ..Default::default()
        };
        assert_eq!(
            lex(&config, "a\nb\n"),
            vec![Char('a', CatCode::Letter), Char('b', CatCode::Letter)]
        );
    }

    #[test]
    fn invalid_character() {
        let config: TestConfig = Default::default();
        let mut interner: CsNameInterner = Default::default();
        let mut lexer = Lexer::new("a\u{7F}".to_string(), trace::KeyRange::for_testing());
        assert!(lexer.next(&config, &mut interner).unwrap().is_some());
        let err = lexer.next(&config, &mut interner).unwrap_err();
        assert_eq!(err.char, '\u{7F}');
    }

    #[test]
    fn cat_code_change_is_seen_immediately() {
        struct Switching(std::cell::Cell<bool>);
        impl Config for Switching {
            fn cat_code(&self, c: char) -> CatCode {
                if c == 'b' && self.0.get() {
                    CatCode::Space
                } else if c.is_ascii_alphabetic() {
                    CatCode::Letter
                } else {
                    CatCode::Other
                }
            }
            fn end_line_char(&self) -> Option<char> {
                None
            }
        }
        let config = Switching(std::cell::Cell::new(false));
        let mut interner: CsNameInterner = Default::default();
        let mut lexer = Lexer::new("abb".to_string(), trace::KeyRange::for_testing());
        let a = lexer.next(&config, &mut interner).unwrap().unwrap();
        assert_eq!(a.char(), Some('a'));
        config.0.set(true);
        let b = lexer.next(&config, &mut interner).unwrap().unwrap();
        assert_eq!(b.value(), Value::Space(' '));
        assert_eq!(lexer.next(&config, &mut interner).unwrap(), None);
    }
}
