//! Source positions attached to declarations and diagnostics

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Display, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("file{_0}")]
pub struct FileId(pub u32);

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Display, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("{start}..{end}")]
pub struct Span {
    /// First byte
    pub start: u32,
    /// One past the last byte
    pub end: u32,
}

impl Span {
    /// Span covering `start..end`
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Byte range, for slicing source text
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Smallest span covering both
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A span with its file; the position every diagnostic is reported at
#[derive(Copy, Clone, Debug, Display, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("{file}:{span}")]
pub struct FileSpan {
    /// File containing the span
    pub file: FileId,
    /// Byte range inside the file
    pub span: Span,
}

impl FileSpan {
    /// Position `start..end` inside `file`
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self {
            file,
            span: Span::new(start, end),
        }
    }

    /// Position for entities that have no source location (builtins,
    /// implicitly declared members)
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// Byte range, for slicing source text
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }
}
