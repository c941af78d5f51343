use super::near_miss::NearMiss;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("pattern not found: {preview}{}", near_miss_suffix(.near_miss))]
    PatternNotFound {
        /// First line of the block, marker, or search text
        preview: String,
        near_miss: Option<NearMiss>,
    },

    #[error("marker {marker:?} found at line {line} but no {delimiter:?} follows it")]
    UnboundedSpan {
        marker: String,
        delimiter: String,
        line: usize,
    },

    #[error("block matched {count} locations (expected 1), first at line {first_line}")]
    AmbiguousMatch { count: usize, first_line: usize },

    #[error("edit error: {0}")]
    Edit(String),
}

impl PatchError {
    /// Whether the error should stop the file from being written at all.
    pub fn is_hard(&self) -> bool {
        !matches!(self, PatchError::PatternNotFound { .. })
    }

    pub(crate) fn not_found(pattern: &str, near_miss: Option<NearMiss>) -> Self {
        PatchError::PatternNotFound {
            preview: preview(pattern),
            near_miss,
        }
    }
}

impl From<crate::edit::EditError> for PatchError {
    fn from(e: crate::edit::EditError) -> Self {
        PatchError::Edit(e.to_string())
    }
}

fn near_miss_suffix(near_miss: &Option<NearMiss>) -> String {
    match near_miss {
        Some(nm) => format!(" ({nm})"),
        None => String::new(),
    }
}

fn preview(pattern: &str) -> String {
    let first = pattern.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let first = first.trim();
    if pattern.trim().lines().nth(1).is_some() {
        format!("{first:?}...")
    } else {
        format!("{first:?}")
    }
}
