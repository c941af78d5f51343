//! Closest-candidate search for exact blocks that failed to match.

use std::fmt;

/// Minimum similarity worth reporting.
const REPORT_THRESHOLD: f64 = 0.6;
/// Candidate windows compared in full.
const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    /// 1-based line where the candidate window starts
    pub line: usize,
    /// Normalized Levenshtein similarity in [0, 1]
    pub similarity: f64,
    /// The candidate equals the block once all whitespace is removed
    pub whitespace_only: bool,
}

impl fmt::Display for NearMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.whitespace_only {
            write!(
                f,
                "closest match at line {} differs only in whitespace",
                self.line
            )
        } else {
            write!(
                f,
                "closest match at line {} is {:.0}% similar",
                self.line,
                self.similarity * 100.0
            )
        }
    }
}

/// Find the window of lines in `haystack` most similar to `block`.
///
/// Both inputs are expected to be LF-normalized. Windows are shortlisted by
/// how well their first line matches the block's first line, then scored on
/// their full text.
pub fn find_near_miss(haystack: &str, block: &str) -> Option<NearMiss> {
    let block = block.trim_start_matches('\n');
    let block_lines: Vec<&str> = block.lines().collect();
    let first = block_lines.first()?.trim();
    if first.is_empty() {
        return None;
    }

    let lines: Vec<&str> = haystack.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let mut shortlist: Vec<(usize, f64)> = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| (idx, strsim::normalized_levenshtein(line.trim(), first)))
        .collect();
    shortlist.sort_by(|a, b| b.1.total_cmp(&a.1));
    shortlist.truncate(MAX_CANDIDATES);

    let squeezed_block = strip_whitespace(block);

    shortlist
        .into_iter()
        .map(|(start, _)| {
            let end = (start + block_lines.len()).min(lines.len());
            let window = lines[start..end].join("\n");
            NearMiss {
                line: start + 1,
                similarity: strsim::normalized_levenshtein(&window, block.trim_end_matches('\n')),
                whitespace_only: strip_whitespace(&window) == squeezed_block,
            }
        })
        .filter(|nm| nm.whitespace_only || nm.similarity >= REPORT_THRESHOLD)
        .max_by(|a, b| {
            a.whitespace_only
                .cmp(&b.whitespace_only)
                .then(a.similarity.total_cmp(&b.similarity))
        })
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
