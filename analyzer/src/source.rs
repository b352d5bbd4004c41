// source.rs — Source files, program-order positions and line/column lookup
//
// A `SourceMap` owns the text of every file loaded into one checking session.
// Positions are `(file index, byte offset)` pairs whose derived ordering is the
// program order used for grouping and reporting.
//
// Preconditions: file text is valid UTF-8.
// Postconditions: every `Pos` handed out refers to a registered file.
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ast::Span;
use crate::id::{next_raw, FileId};

/// A point in program order: file index first, then byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub file: FileId,
    pub offset: u32,
}

impl Pos {
    pub fn new(file: FileId, offset: usize) -> Self {
        Pos {
            file,
            offset: u32::try_from(offset).unwrap_or(u32::MAX),
        }
    }

    /// Position of the first byte of `span` in `file`.
    pub fn of_span(file: FileId, span: Span) -> Self {
        Pos::new(file, span.start)
    }
}

/// A human-readable resolved position (1-based line and byte column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One registered file.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(path: PathBuf, text: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        SourceFile {
            path,
            text,
            line_starts,
        }
    }

    /// 1-based (line, column) of a byte offset. Offsets past the end clamp to
    /// the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }
}

/// All files of a checking session, indexed by `FileId`.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. The returned id is the next free index.
    pub fn add(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> FileId {
        let id = FileId(next_raw(self.files.len()));
        self.files.push(SourceFile::new(path.into(), text.into()));
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn path(&self, id: FileId) -> &Path {
        &self.files[id.index()].path
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolve a program-order position to file/line/column.
    pub fn position(&self, pos: Pos) -> Position {
        let file = self.file(pos.file);
        let (line, column) = file.line_col(pos.offset as usize);
        Position {
            file: file.path.display().to_string(),
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_first_line() {
        let mut map = SourceMap::new();
        let f = map.add("a.go", "package a\n");
        assert_eq!(map.file(f).line_col(0), (1, 1));
        assert_eq!(map.file(f).line_col(8), (1, 9));
    }

    #[test]
    fn line_col_after_newlines() {
        let mut map = SourceMap::new();
        let f = map.add("a.go", "package a\n\nfunc f() {\n\tx()\n}\n");
        // `x` sits after the tab on line 4.
        let offset = "package a\n\nfunc f() {\n\t".len();
        assert_eq!(map.file(f).line_col(offset), (4, 2));
    }

    #[test]
    fn position_display() {
        let mut map = SourceMap::new();
        let f = map.add("unit/main.go", "package main\nvar x int\n");
        let pos = Pos::new(f, "package main\nvar ".len());
        assert_eq!(map.position(pos).to_string(), "unit/main.go:2:5");
    }

    #[test]
    fn program_order_compares_file_before_offset() {
        let a = Pos::new(FileId(0), 500);
        let b = Pos::new(FileId(1), 3);
        assert!(a < b);
        assert!(Pos::new(FileId(1), 2) < b);
    }
}
