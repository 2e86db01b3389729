//! Tracing system for determining the origin of a token.
//!
//! Error messages need to know where a token came from: the file, the line and the column.
//! Storing this on each token would make [Token] large, which hurts the VM's inner loops.
//! Instead each token carries a 32-bit [Key] and the [Tracer] can turn that key into a
//!     full [SourceCodeTrace] on demand.
//!
//! When source code is added to the input, the tracer is told via
//!     [register_source_code](Tracer::register_source_code).
//! It hands back a contiguous [KeyRange] containing one key per character of the source,
//!     plus one extra key for the end-of-line character appended to the last line.
//! The lexer assigns these keys in order.
//! Tracing a key then amounts to finding the registered source whose range contains it;
//!     the difference from the first key of that range is the character offset in the source.
use crate::token::{CsNameInterner, Token};
use std::collections::BTreeMap;
use std::ops::Bound::Included;
use std::path::PathBuf;

/// Key attached to tokens to enable tracing them.
///
/// This type is 32 bits.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key(u32);

impl Key {
    /// A key that traces to no source code.
    pub fn dummy() -> Key {
        Key(u32::MAX)
    }
}

/// Range of free keys that may be assigned to tokens.
#[derive(Debug)]
pub struct KeyRange {
    next: u32,
    limit: u32,
}

impl KeyRange {
    /// Get the next trace [Key].
    ///
    /// Once the range is exhausted the dummy key is returned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Key {
        if self.next >= self.limit {
            return Key::dummy();
        }
        let n = self.next;
        self.next += 1;
        Key(n)
    }

    /// Peek at the next trace [Key].
    pub fn peek(&self) -> Key {
        if self.next >= self.limit {
            return Key::dummy();
        }
        Key(self.next)
    }

    pub fn empty() -> KeyRange {
        KeyRange { next: 0, limit: 0 }
    }

    #[cfg(test)]
    pub fn for_testing() -> KeyRange {
        KeyRange {
            next: 0,
            limit: u32::MAX - 1,
        }
    }
}

/// A token trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCodeTrace {
    /// Origin of the source code this token came from.
    pub origin: Origin,
    /// Content of the line this token came from.
    pub line_content: String,
    /// Number of the line within the file, starting at 1.
    pub line_number: usize,
    /// Index within the line that the token starts.
    pub index: usize,
    /// Value of the token.
    pub value: String,
    /// If this is for a token, the value of the token.
    /// Otherwise this is an end of input snippet.
    pub token: Option<Token>,
}

/// Enum describing the possible origins of source code
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Origin {
    File(PathBuf),
    /// The token was created by Rust code, not read from source.
    Unknown,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Data structure that records information for token tracing
#[derive(Default)]
pub struct Tracer {
    checkpoints: BTreeMap<u32, Checkpoint>,
    next_key: u32,
    // First key of the last source that was pushed by the host, rather than by TeX code.
    last_external_input: Option<u32>,
}

struct Checkpoint {
    origin: Origin,
    content: String,
}

impl Tracer {
    /// Registers source code with the tracer.
    ///
    /// The returned [KeyRange] should be used to assign [Keys](Key) to the characters
    ///     of the source, in order.
    /// The token argument is the token that caused the source to be loaded
    ///     (for example an `\input` command), or [None] if the host pushed the source.
    ///
    /// # Panics
    ///
    /// Panics if the total amount of registered source code exceeds 4GB.
    pub fn register_source_code(
        &mut self,
        token: Option<Token>,
        origin: Origin,
        source_code: &str,
    ) -> KeyRange {
        let num_chars = source_code.chars().count();
        let len = match u32::try_from(num_chars) {
            Ok(n) if n < u32::MAX - 1 => n + 1,
            _ => panic!(
                "source code too big ({num_chars} characters); max is {} characters",
                u32::MAX - 2
            ),
        };
        let limit = match self.next_key.checked_add(len) {
            Some(limit) if limit < u32::MAX => limit,
            _ => panic!("the tracer ran out of keys"),
        };
        let range = KeyRange {
            next: self.next_key,
            limit,
        };
        self.checkpoints.insert(
            range.next,
            Checkpoint {
                origin,
                content: source_code.to_string(),
            },
        );
        if token.is_none() {
            self.last_external_input = Some(self.next_key);
        }
        self.next_key = limit;
        range
    }

    /// Return a trace for the provided token.
    pub fn trace(&self, token: Token, cs_name_interner: &CsNameInterner) -> SourceCodeTrace {
        let value = token.value().to_string(cs_name_interner);
        let key = token.trace_key().0;
        let checkpoint = self
            .checkpoints
            .range((Included(&0), Included(&key)))
            .next_back()
            .filter(|(first_key, checkpoint)| {
                key != u32::MAX && ((key - **first_key) as usize) <= checkpoint.content.len()
            });
        let (&first_key, checkpoint) = match checkpoint {
            None => {
                return SourceCodeTrace {
                    origin: Origin::Unknown,
                    line_content: value.clone(),
                    line_number: 0,
                    index: 0,
                    value,
                    token: Some(token),
                }
            }
            Some(checkpoint) => checkpoint,
        };
        let content = &checkpoint.content;
        let char_offset = (key - first_key) as usize;
        let mut line_number = 1;
        let mut byte_line_start = 0;
        let mut char_line_start = 0;
        for (char_index, (byte_index, c)) in content.char_indices().enumerate() {
            if char_index == char_offset {
                break;
            }
            if c == '\n' {
                byte_line_start = byte_index + 1;
                char_line_start = char_index + 1;
                line_number += 1;
            }
        }
        let tail = &content[byte_line_start..];
        let line_content = match tail.split_once('\n') {
            None => tail.to_string(),
            Some((line, _)) => line.to_string(),
        };
        SourceCodeTrace {
            origin: checkpoint.origin.clone(),
            line_content,
            line_number,
            index: char_offset - char_line_start,
            value,
            token: Some(token),
        }
    }

    /// Return a trace pointing just after the last non-whitespace character of the input.
    pub fn trace_end_of_input(&self) -> SourceCodeTrace {
        let checkpoint = self
            .last_external_input
            .and_then(|key| self.checkpoints.get(&key));
        let checkpoint = match checkpoint {
            None => {
                return SourceCodeTrace {
                    origin: Origin::Unknown,
                    line_content: String::new(),
                    line_number: 0,
                    index: 0,
                    value: " ".to_string(),
                    token: None,
                }
            }
            Some(checkpoint) => checkpoint,
        };
        let content = &checkpoint.content;
        // (line index, byte index of first character)
        let mut last_line: (usize, usize) = (0, 0);
        let mut last_non_empty_line: (usize, usize) = (0, 0);
        for (i, c) in content.char_indices() {
            if !c.is_whitespace() {
                last_non_empty_line = last_line;
            } else if c == '\n' {
                last_line.0 += 1;
                last_line.1 = i + 1;
            }
        }
        let line = content[last_non_empty_line.1..]
            .split('\n')
            .next()
            .unwrap_or("")
            .trim_end();
        SourceCodeTrace {
            origin: checkpoint.origin.clone(),
            line_content: line.to_string(),
            line_number: last_non_empty_line.0 + 1,
            index: line.chars().count(),
            value: " ".to_string(),
            token: None,
        }
    }
}
