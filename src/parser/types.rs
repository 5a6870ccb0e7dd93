use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based line/column. `(0, 0)` means "unknown".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const INVALID: Position = Position { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_valid(&self) -> bool {
        self.line > 0 && self.column > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.column)
    }
}

/// A position inside a named template (or generated file).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilePosition {
    pub file: String,
    #[serde(flatten)]
    pub position: Position,
}

impl FilePosition {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            position: Position::new(line, column),
        }
    }

    pub fn at(file: impl Into<String>, position: Position) -> Self {
        Self {
            file: file.into(),
            position,
        }
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.file, self.position)
    }
}

/// One physical line of a template, viewed in place over the full text.
///
/// `begin <= begin_non_space <= end <= text.len()`. `end` is the index of the
/// terminating newline (or the end of the text).
#[derive(Debug, Clone, Copy)]
pub struct LineWindow<'a> {
    pub text: &'a str,
    pub begin: usize,
    pub begin_non_space: usize,
    pub end: usize,
    pub position: Position,
}

impl<'a> LineWindow<'a> {
    /// The character rules dispatch on, if the line has any content.
    pub fn trigger(&self) -> Option<char> {
        self.text[self.begin_non_space..self.end].chars().next()
    }

    /// Index just past the trigger character.
    pub fn after_trigger(&self) -> usize {
        self.begin_non_space + self.trigger().map_or(0, char::len_utf8)
    }

    pub fn as_str(&self) -> &'a str {
        &self.text[self.begin..self.end]
    }

    /// Span over `[begin, end)` of the full text; both must lie within this line.
    pub fn span(&self, begin: usize, end: usize) -> SourceSpan<'a> {
        debug_assert!(self.begin <= begin && begin <= end && end <= self.end);
        let column = self.text[self.begin..begin].chars().count() as u32 + 1;
        SourceSpan {
            owner: self.text,
            begin,
            end,
            position: Position::new(self.position.line, column),
        }
    }

    /// Zero-length span marking the end of the line's content.
    pub fn end_span(&self) -> SourceSpan<'a> {
        self.span(self.end, self.end)
    }
}

/// Half-open range into the original template text plus the position of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan<'a> {
    owner: &'a str,
    begin: usize,
    end: usize,
    position: Position,
}

impl<'a> SourceSpan<'a> {
    pub fn text(&self) -> &'a str {
        &self.owner[self.begin..self.end]
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}
