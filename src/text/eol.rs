//! Line-ending handling.
//!
//! Matching happens on an LF-normalized view of the file. [`Normalized`]
//! keeps a byte map back to the original text so a match found in the view
//! can be replaced in the original without touching the line endings of
//! anything around it.

use serde::Deserialize;

/// A newline convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    Crlf,
}

impl LineEnding {
    /// Dominant convention of `text`: CRLF if at least half of its newlines
    /// are preceded by `\r`. Text without newlines reports `None`.
    pub fn detect(text: &str) -> Option<Self> {
        let total = text.matches('\n').count();
        if total == 0 {
            return None;
        }
        let crlf = text.matches("\r\n").count();
        if crlf * 2 >= total {
            Some(LineEnding::Crlf)
        } else {
            Some(LineEnding::Lf)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Re-encode `text` (any mix of conventions) using this convention.
    pub fn apply(self, text: &str) -> String {
        let lf = normalize(text);
        match self {
            LineEnding::Lf => lf,
            LineEnding::Crlf => lf.replace('\n', "\r\n"),
        }
    }
}

/// Per-patch policy for the line endings of the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingPolicy {
    /// Leave unrelated text untouched; replacements follow the span they replace.
    #[default]
    Preserve,
    /// Convert the whole file to LF.
    Lf,
    /// Convert the whole file to CRLF.
    Crlf,
}

impl LineEndingPolicy {
    pub fn finish(self, text: String) -> String {
        match self {
            LineEndingPolicy::Preserve => text,
            LineEndingPolicy::Lf => LineEnding::Lf.apply(&text),
            LineEndingPolicy::Crlf => LineEnding::Crlf.apply(&text),
        }
    }
}

/// Replace every `\r\n` with `\n`. Lone `\r` is left alone.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// LF-normalized view of a text with a map back to original byte offsets.
#[derive(Debug)]
pub struct Normalized {
    pub text: String,
    /// `origin[i]` is the original byte offset of normalized byte `i`.
    origin: Vec<usize>,
    original_len: usize,
}

impl Normalized {
    pub fn new(original: &str) -> Self {
        let bytes = original.as_bytes();
        let mut text = String::with_capacity(original.len());
        let mut origin = Vec::with_capacity(original.len());

        let mut last = 0;
        for (idx, _) in original.match_indices("\r\n") {
            text.push_str(&original[last..idx]);
            origin.extend(last..idx);
            last = idx + 1; // keep the '\n'
        }
        text.push_str(&original[last..]);
        origin.extend(last..bytes.len());

        Self {
            text,
            origin,
            original_len: original.len(),
        }
    }

    /// Map a normalized half-open range to the original text.
    ///
    /// The end maps to just past the last included byte, so a range ending
    /// before a `\n` never swallows the `\r` in front of it.
    pub fn original_range(&self, start: usize, end: usize) -> (usize, usize) {
        let orig_start = self.origin.get(start).copied().unwrap_or(self.original_len);
        if end == start {
            return (orig_start, orig_start);
        }
        let orig_end = self
            .origin
            .get(end - 1)
            .map_or(self.original_len, |&offset| offset + 1);
        (orig_start, orig_end)
    }
}
