//! Source buffer and position tracking.
//!
//! Wraps a UTF-8 source string with single-character lookahead, push-back of
//! arbitrary substrings (used by the preprocessor's macro rescan), and nested
//! push of include files. Each push saves the containing position; pop
//! restores it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// Identifies a source file registered with a [`SourceManager`].
///
/// Positions carry a `FileId` rather than a path string so that tokens stay
/// small; the path is looked up through the owning manager only when a
/// diagnostic needs to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// A source position: file, 1-based line, 1-based column.
///
/// Monotonically non-decreasing within a single token stream, except where
/// explicitly reset by a `#line` directive or by an include push/pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

/// A half-open range of source positions, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// A zero-width range at a single position, for diagnostics that don't
    /// span a token (e.g. "expected `;` here").
    pub fn point(pos: SourcePosition) -> Self {
        Self { start: pos, end: pos }
    }
}

/// Registry of file names (real paths and synthetic `#line`-asserted names)
/// keyed by [`FileId`]. Owned by the [`SourceManager`] for one compilation.
#[derive(Debug, Default, Clone)]
pub struct FileTable {
    names: Vec<Rc<str>>,
}

impl FileTable {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    pub fn register(&mut self, name: impl Into<Rc<str>>) -> FileId {
        let id = FileId(self.names.len() as u32);
        self.names.push(name.into());
        id
    }

    pub fn name(&self, id: FileId) -> &str {
        &self.names[id.0 as usize]
    }
}

/// One level of the include/rescan stack: the cursor state a push must
/// restore on pop.
struct Frame {
    text: Rc<str>,
    file: FileId,
    byte_offset: usize,
    line: u32,
    column: u32,
}

/// A lazy, pushable, UTF-8 character source.
///
/// `SourceBuffer` is the lowest layer of the pipeline (`spec.md` §4.1): it
/// knows nothing about tokens, directives, or comments. It exposes
/// single-character lookahead (`peek`/`bump`), push-back of arbitrary
/// substrings (`push_rescan`, used when a macro body must be rescanned as if
/// it were typed at the call site), and nested include push/pop
/// (`push_include`/`pop_include`).
pub struct SourceBuffer {
    stack: Vec<Frame>,
    files: FileTable,
    include_paths: Vec<PathBuf>,
    max_include_depth: usize,
}

impl SourceBuffer {
    /// Creates a buffer over `text`, registering it in a fresh file table
    /// under `name`.
    pub fn new(name: impl Into<Rc<str>>, text: impl Into<Rc<str>>) -> Self {
        let mut files = FileTable::new();
        let file = files.register(name);
        Self {
            stack: vec![Frame {
                text: text.into(),
                file,
                byte_offset: 0,
                line: 1,
                column: 1,
            }],
            files,
            include_paths: Vec::new(),
            max_include_depth: 64,
        }
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    /// Current depth of the include stack, not counting the root buffer.
    pub fn include_depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// The position the next `bump()` will be read from.
    pub fn current_position(&self) -> SourcePosition {
        let top = self.stack.last().expect("source stack is never empty");
        SourcePosition::new(top.file, top.line, top.column)
    }

    /// Peeks the next character without consuming it, popping exhausted
    /// frames (but never the root) as needed.
    pub fn peek(&mut self) -> Option<char> {
        loop {
            let top = self.stack.last()?;
            match top.text[top.byte_offset..].chars().next() {
                Some(c) => return Some(c),
                None if self.stack.len() > 1 => {
                    self.stack.pop();
                }
                None => return None,
            }
        }
    }

    /// Peeks the character after the next one, without consuming anything.
    pub fn peek2(&mut self) -> Option<char> {
        let top = self.stack.last()?;
        let mut chars = top.text[top.byte_offset..].chars();
        chars.next()?;
        chars.next()
    }

    /// Consumes and returns the next character, advancing line/column.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        let top = self.stack.last_mut().expect("checked by peek");
        top.byte_offset += c.len_utf8();
        if c == '\n' {
            top.line += 1;
            top.column = 1;
        } else {
            top.column += 1;
        }
        Some(c)
    }

    /// Pushes `text` to be read before anything currently pending, as if it
    /// had been typed inline at the current position. Used for macro body
    /// rescan. Reported positions while reading pushed text mirror the
    /// position that was current at the push (macro expansions do not
    /// advance `#line`-visible line numbers).
    pub fn push_rescan(&mut self, text: impl Into<Rc<str>>) {
        let (file, line, column) = {
            let top = self.stack.last().expect("source stack is never empty");
            (top.file, top.line, top.column)
        };
        self.stack.push(Frame {
            text: text.into(),
            file,
            byte_offset: 0,
            line,
            column,
        });
    }

    /// Pushes an include file. Returns `Err` if the include stack is already
    /// at `max_include_depth`, matching `spec.md` §4.3's "bounded include
    /// stack" requirement.
    pub fn push_include(
        &mut self,
        name: impl Into<Rc<str>>,
        text: impl Into<Rc<str>>,
    ) -> Result<FileId, IncludeDepthExceeded> {
        if self.include_depth() >= self.max_include_depth {
            return Err(IncludeDepthExceeded {
                depth: self.max_include_depth,
            });
        }
        let file = self.files.register(name);
        self.stack.push(Frame {
            text: text.into(),
            file,
            byte_offset: 0,
            line: 1,
            column: 1,
        });
        Ok(file)
    }

    /// Pops the current include/rescan frame and restores the containing
    /// position. A no-op at the root frame.
    pub fn pop_frame(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Forces the current frame's reported line to `line` (and file name,
    /// if supplied), implementing the `#line` directive.
    pub fn set_line(&mut self, line: u32, file_name: Option<&str>) {
        if let Some(name) = file_name {
            let id = self.files.register(Rc::from(name));
            if let Some(top) = self.stack.last_mut() {
                top.file = id;
            }
        }
        if let Some(top) = self.stack.last_mut() {
            top.line = line;
        }
    }

    pub fn add_include_path(&mut self, path: PathBuf) {
        self.include_paths.push(path);
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IncludeDepthExceeded {
    pub depth: usize,
}

impl std::fmt::Display for IncludeDepthExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "include depth exceeded maximum of {}", self.depth)
    }
}

impl std::error::Error for IncludeDepthExceeded {}

/// Canonicalizes an include path for `#pragma once` de-duplication.
///
/// Pure string-based: the core never touches the filesystem directly (that
/// is the [`crate::preprocessor::include::IncludeHandler`]'s job), so this
/// just normalizes separators and `.`/`..` segments textually.
pub fn canonical_include_key(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.replace('\\', "/").split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Tracks canonical paths already included under `#pragma once`.
#[derive(Debug, Default)]
pub struct PragmaOnceSet {
    seen: HashMap<String, ()>,
}

impl PragmaOnceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `path` as pragma-once'd. Returns `true` if this is the first
    /// time it has been seen.
    pub fn mark(&mut self, path: &str) -> bool {
        let key = canonical_include_key(path);
        if self.seen.contains_key(&key) {
            false
        } else {
            self.seen.insert(key, ());
            true
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains_key(&canonical_include_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_tracks_line_and_column() {
        let mut buf = SourceBuffer::new("t.hlsl", "ab\ncd");
        assert_eq!(buf.current_position(), SourcePosition::new(FileId(0), 1, 1));
        assert_eq!(buf.bump(), Some('a'));
        assert_eq!(buf.current_position(), SourcePosition::new(FileId(0), 1, 2));
        assert_eq!(buf.bump(), Some('b'));
        assert_eq!(buf.bump(), Some('\n'));
        assert_eq!(buf.current_position(), SourcePosition::new(FileId(0), 2, 1));
        assert_eq!(buf.bump(), Some('c'));
    }

    #[test]
    fn push_rescan_is_read_before_remaining_text() {
        let mut buf = SourceBuffer::new("t.hlsl", "Z");
        buf.push_rescan("XY");
        let mut out = String::new();
        while let Some(c) = buf.bump() {
            out.push(c);
        }
        assert_eq!(out, "XYZ");
    }

    #[test]
    fn include_depth_is_bounded() {
        let mut buf = SourceBuffer::new("root.hlsl", "");
        buf.set_max_include_depth(2);
        assert!(buf.push_include("a.hlsli", "").is_ok());
        assert!(buf.push_include("b.hlsli", "").is_ok());
        assert!(buf.push_include("c.hlsli", "").is_err());
    }

    #[test]
    fn pragma_once_dedup_is_path_normalized() {
        let mut set = PragmaOnceSet::new();
        assert!(set.mark("./inc/common.hlsli"));
        assert!(!set.mark("inc/common.hlsli"));
        assert!(!set.mark("foo/../inc/common.hlsli"));
    }
}
