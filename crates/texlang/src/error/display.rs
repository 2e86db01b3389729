use crate::error::{self, TracedNote};
use crate::token;
use crate::token::trace::{self, SourceCodeTrace};
use texcraft_stdext::color::{ColoredString, Colorize};

/// A note attached to an error.
#[derive(Debug, Clone)]
pub enum Note {
    Text(String),
    /// A note that points at a token, for example the token that opened a construct.
    SourceCodeTrace(String, token::Token),
}

impl<T: Into<String>> From<T> for Note {
    fn from(value: T) -> Self {
        Note::Text(value.into())
    }
}

pub(super) fn format_error(
    f: &mut std::fmt::Formatter<'_>,
    err: &error::TracedTexError,
) -> std::fmt::Result {
    let line = PrimaryLine {
        kind: PrimaryLineKind::Error,
        source: err.trace.as_ref(),
        title: err.error.title(),
        token_annotation: err.error.source_annotation(),
        notes: &err.notes,
    };
    write!(f, "{line}")?;

    if let Some(immediate) = err.stack_trace.first() {
        let stack = ErrorStack(&err.stack_trace);
        let notes = vec![TracedNote::Text(format![
            "this is the full stack trace of the error:\n\n{stack}"
        ])];
        let line = PrimaryLine {
            kind: PrimaryLineKind::Context,
            source: Some(&immediate.trace),
            title: format!["this error occurred while {}:", immediate.context.action()],
            token_annotation: "".into(),
            notes: &notes,
        };
        write!(f, "\n{line}")?;
    }
    Ok(())
}

struct PrimaryLine<'a> {
    kind: PrimaryLineKind,
    source: Option<&'a trace::SourceCodeTrace>,
    title: String,
    token_annotation: String,
    notes: &'a [TracedNote],
}

#[derive(Debug, Clone, Copy)]
enum PrimaryLineKind {
    Error,
    Context,
}

impl PrimaryLineKind {
    fn paint(&self, s: &str) -> ColoredString {
        match self {
            PrimaryLineKind::Error => s.bright_red(),
            PrimaryLineKind::Context => s.yellow(),
        }
    }
}

impl std::fmt::Display for PrimaryLineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimaryLineKind::Error => "Error",
            PrimaryLineKind::Context => "Context",
        };
        write!(f, "{}", self.paint(name).bold())
    }
}

impl<'a> std::fmt::Display for PrimaryLine<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let margin_width = match self.source {
            None => 2,
            Some(source) => source.line_number.to_string().len() + 1,
        };
        let printer = Printer {
            indent: margin_width,
        };
        writeln!(f, "{}: {}", self.kind, self.title.as_str().bold())?;
        if let Some(source) = self.source {
            fmt_source_code_trace(&printer, f, source, &self.token_annotation, self.kind)?;
        }

        for (i, note) in self.notes.iter().enumerate() {
            let note = match note {
                TracedNote::Text(text) => text.clone(),
                TracedNote::SourceCodeTrace(text, trace) => {
                    format!["{text}\n\n{}", LightTrace(trace)]
                }
            };
            let mut note_lines = note.trim_end().lines();
            let first_note_line = match note_lines.next() {
                None => continue,
                Some(s) => s,
            };
            printer.new_line().print(f)?;
            printer
                .new_line()
                .with_separator('=')
                .with_content(format!["{} {}", "note:".bold(), first_note_line])
                .print(f)?;
            for line in note_lines {
                let mut l = printer.new_line().with_content(format!["      {line}"]);
                if i + 1 == self.notes.len() {
                    l = l.with_separator(' ');
                }
                l.print(f)?;
            }
        }
        Ok(())
    }
}

struct ErrorStack<'a>(&'a [error::StackTraceElement]);

impl<'a> std::fmt::Display for ErrorStack<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, element) in self.0.iter().rev().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            fmt_source_code_trace_light(
                f,
                &element.trace,
                2,
                PrimaryLineKind::Context,
                element.context.action(),
            )?;
        }
        Ok(())
    }
}

struct LightTrace<'a>(&'a SourceCodeTrace);

impl<'a> std::fmt::Display for LightTrace<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_source_code_trace_light(f, self.0, 2, PrimaryLineKind::Error, "")
    }
}

struct Printer {
    indent: usize,
}

struct PrintLineBuilder<'a> {
    printer: &'a Printer,
    margin_content: String,
    separator: Option<char>,
    content: String,
    indent_adjustment: usize,
}

impl Printer {
    fn new_line(&self) -> PrintLineBuilder {
        PrintLineBuilder {
            printer: self,
            margin_content: "".into(),
            separator: Some('|'),
            content: "".into(),
            indent_adjustment: 0,
        }
    }
}

impl<'a> PrintLineBuilder<'a> {
    fn with_content<T: Into<String>>(mut self, content: T) -> Self {
        self.content = content.into();
        self
    }
    fn with_margin_content<T: Into<String>>(mut self, content: T) -> Self {
        self.margin_content = content.into();
        self
    }
    fn with_indent_adjustment(mut self, u: usize) -> Self {
        self.indent_adjustment = u;
        self
    }
    fn with_separator(mut self, c: char) -> Self {
        self.separator = Some(c);
        self
    }
    fn without_separator(mut self) -> Self {
        self.separator = None;
        self
    }

    fn print(self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent: usize = self
            .printer
            .indent
            .saturating_sub(self.indent_adjustment)
            .saturating_sub(self.margin_content.len() + 1);
        let margin_content = format!["{}{} ", " ".repeat(indent), self.margin_content];
        let separator = match self.separator {
            None => "".to_string(),
            Some(c) => format!["{c} "],
        };
        writeln!(
            f,
            "{}{}{}",
            margin_content.as_str().bright_cyan(),
            separator.as_str().bright_cyan(),
            self.content
        )
    }
}

fn fmt_source_code_trace(
    printer: &Printer,
    f: &mut std::fmt::Formatter<'_>,
    s: &trace::SourceCodeTrace,
    annotation: &str,
    kind: PrimaryLineKind,
) -> std::fmt::Result {
    printer
        .new_line()
        .without_separator()
        .with_indent_adjustment(1)
        .with_content(format!(
            "{} {}:{}:{}",
            ">>>".bright_cyan().bold(),
            s.origin,
            s.line_number,
            s.index + 1
        ))
        .print(f)?;
    printer.new_line().print(f)?;
    let width = s.value.chars().count().max(1);
    printer
        .new_line()
        .with_margin_content(format!["{}", s.line_number])
        .with_content(highlight_substring(&s.line_content, s.index, width))
        .print(f)?;
    printer
        .new_line()
        .with_content(format![
            "{}{} {}",
            " ".repeat(s.index),
            kind.paint(&"^".repeat(width)).bold(),
            kind.paint(annotation).bold(),
        ])
        .print(f)?;
    Ok(())
}

// Indices are in characters, not bytes.
fn highlight_substring(line: &str, start: usize, length: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() < start + length {
        return line.trim_end().into();
    }
    let before: String = chars[..start].iter().collect();
    let middle: String = chars[start..start + length].iter().collect();
    let after: String = chars[start + length..].iter().collect();
    format!["{}{}{}", before, middle.as_str().bold(), after.trim_end()]
}

fn fmt_source_code_trace_light(
    f: &mut std::fmt::Formatter<'_>,
    s: &SourceCodeTrace,
    indent: usize,
    kind: PrimaryLineKind,
    annotation: &str,
) -> std::fmt::Result {
    let prefix = format!(
        "{}{}:{}:{}",
        " ".repeat(indent),
        s.origin,
        s.line_number,
        s.index + 1
    );
    let width = s.value.chars().count().max(1);
    writeln!(
        f,
        "{}  {}",
        prefix,
        highlight_substring(&s.line_content, s.index, width)
    )?;
    writeln!(
        f,
        "{}  {} {}",
        " ".repeat(prefix.chars().count() + s.index),
        kind.paint(&"^".repeat(width)).bold(),
        annotation,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_substring_out_of_range() {
        assert_eq!(highlight_substring("ab  ", 5, 1), "ab");
    }

    #[cfg(not(feature = "color"))]
    #[test]
    fn highlight_substring_plain() {
        assert_eq!(highlight_substring("añb  ", 1, 1), "añb");
    }
}
