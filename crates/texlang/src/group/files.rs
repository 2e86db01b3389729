use std::collections::VecDeque;
use std::path::PathBuf;

/// A file opened for reading with `\openin`.
#[derive(Debug)]
pub struct InputFile {
    path: PathBuf,
    lines: VecDeque<String>,
}

impl InputFile {
    pub fn new(path: PathBuf, content: &str) -> InputFile {
        InputFile {
            path,
            lines: content.lines().map(String::from).collect(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Removes and returns the next line of the file.
    pub fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    /// Whether every line of the file has been read.
    pub fn is_eof(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A file opened for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_until_eof() {
        let mut file = InputFile::new("a.tex".into(), "first\nsecond\n");
        assert!(!file.is_eof());
        assert_eq!(file.read_line(), Some("first".to_string()));
        assert_eq!(file.read_line(), Some("second".to_string()));
        assert!(file.is_eof());
        assert_eq!(file.read_line(), None);
    }

    #[test]
    fn empty_file_is_eof() {
        assert!(InputFile::new("a.tex".into(), "").is_eof());
    }
}
