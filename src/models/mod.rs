use serde::{Deserialize, Serialize};

/// The full input text, conceptually an ordered sequence of lines indexed
/// from 0. Immutable for the duration of a pipeline run and shared
/// read-only by every stage.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// Normalizes line endings to `\n` and splits into lines.
    pub fn new(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let lines = normalized.lines().map(str::to_string).collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Joins `[start, end]` inclusive into a single string.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.lines[start..=end].join("\n")
    }

    /// The first `n` lines (or all lines if the document is shorter), joined
    /// by newlines. Used as the stage 1 head sample.
    pub fn head_sample(&self, n: usize) -> String {
        let take = n.min(self.lines.len());
        self.lines[..take].join("\n")
    }

    pub fn full_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// `{number, title}` produced by stage 1. `number` need not be contiguous
/// but must be distinct within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterIdentity {
    pub number: u64,
    pub title: String,
}

/// The `(start_pattern, end_pattern)` regex pair proposed for one chapter in
/// stage 2, adjudicated by stage 3.
#[derive(Debug, Clone)]
pub struct BoundaryPair {
    pub identity: ChapterIdentity,
    pub start_pattern: String,
    pub end_pattern: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub is_valid: bool,
}

impl BoundaryPair {
    pub fn new(identity: ChapterIdentity, start_pattern: String, end_pattern: String) -> Self {
        Self {
            identity,
            start_pattern,
            end_pattern,
            start_line: None,
            end_line: None,
            is_valid: false,
        }
    }

    /// A pair that never reached stage 2's LM call successfully — already
    /// invalid, carried through so stage 3/4 can skip over it uniformly.
    pub fn failed(identity: ChapterIdentity) -> Self {
        Self {
            identity,
            start_pattern: String::new(),
            end_pattern: String::new(),
            start_line: None,
            end_line: None,
            is_valid: false,
        }
    }
}

/// Produced in stage 4 for each pair that survived stage 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub chapter_number: u64,
    pub chapter_title: String,
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
    pub word_count: usize,
    pub verification_passed: bool,
    pub verification_notes: Option<String>,
}
