//! Text Patcher: declarative literal patching for source trees
//!
//! Patch sets are TOML files listing target files and a rule for each:
//! an exact multi-line block, a marker-to-delimiter span, an ordered rename
//! map, or a literal replace-all. The patcher treats every file as opaque
//! UTF-8 text; it never parses the language inside.
//!
//! # Architecture
//!
//! The [`text`] module holds pure transforms from file text to file text.
//! Each locates its spans and compiles them down to [`Edit`], a verified
//! byte-span replacement. The [`config`] applicator reads each target once,
//! runs every patch for it in memory, and writes the result back only when it
//! differs.
//!
//! # Safety
//!
//! - Missing files and unmatched patterns are reported per file; the batch continues
//! - Unbounded marker spans and ambiguous blocks never reach disk
//! - Atomic file writes (tempfile + fsync + rename)
//! - Workspace boundary enforcement for workspace-relative targets
//! - Unchanged files are never rewritten
//!
//! # Example
//!
//! ```
//! use text_patcher::text::{apply_rename_map, Rename};
//!
//! let renames = [Rename::new("Community Tax", "X"), Rename::new("Community", "Y")];
//! assert_eq!(apply_rename_map("Community Tax Co", &renames), "X Co");
//! ```

pub mod config;
pub mod edit;
pub mod report;
pub mod safety;
pub mod text;

// Re-exports
pub use config::{
    apply_patches, check_patches, load_from_path, load_from_str, ApplicationError, ConfigError,
    PatchConfig, PatchOutcome, PatchResult,
};
pub use edit::{Edit, EditError, EditVerification, WriteOutcome};
pub use report::{Report, Status, Summary};
pub use safety::{SafetyError, WorkspaceGuard};
pub use text::{
    apply_rename_map, replace_exact_block, replace_literal, replace_marker_span, PatchError,
    PatchRule, Rename,
};
