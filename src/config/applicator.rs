//! Patch applicator - runs patch sets against files with per-file isolation
//!
//! This module provides high-level patch application that:
//! - Groups targets by file so each file is read and written at most once
//! - Continues past missing files and unmatched patterns
//! - Writes only when content changed, atomically
//! - Reports one outcome per (patch, file) pair

use crate::config::schema::{PatchConfig, PatchDefinition};
use crate::edit::{write_if_changed, WriteOutcome};
use crate::safety::WorkspaceGuard;
use crate::text::PatchError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether results are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Write changed files to disk
    Write,
    /// Compute outcomes only; nothing is written
    Check,
}

/// Result of applying one patch to one file
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult should be checked for success/failure"]
pub enum PatchResult {
    /// Patch changed the file (or would, in check mode)
    Applied { file: PathBuf },
    /// Patch matched nothing new; the file is already in the patched state
    Unchanged { file: PathBuf },
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchResult::Applied { file } => write!(f, "Applied patch to {}", file.display()),
            PatchResult::Unchanged { file } => write!(f, "Already applied to {}", file.display()),
        }
    }
}

/// Errors during patch application
#[derive(Debug)]
pub enum ApplicationError {
    /// Target path does not exist
    FileNotFound { file: PathBuf },
    /// Locator matched nothing and the replacement is not present either
    PatternNotFound { file: PathBuf, source: PatchError },
    /// Rule failed in a way that must not be written (unbounded span, ambiguous block)
    Patch { file: PathBuf, source: PatchError },
    /// File content is not valid UTF-8
    Encoding {
        file: PathBuf,
        source: std::str::Utf8Error,
    },
    /// File I/O error
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Target rejected by the workspace guard
    Unsafe { file: PathBuf, reason: String },
    /// Another patch on the same file failed, so this change was not written
    Discarded { file: PathBuf, cause: String },
    /// Writing the patched content failed
    Write { file: PathBuf, reason: String },
}

impl ApplicationError {
    pub fn file(&self) -> &Path {
        match self {
            ApplicationError::FileNotFound { file }
            | ApplicationError::PatternNotFound { file, .. }
            | ApplicationError::Patch { file, .. }
            | ApplicationError::Encoding { file, .. }
            | ApplicationError::Unsafe { file, .. }
            | ApplicationError::Discarded { file, .. }
            | ApplicationError::Write { file, .. } => file,
            ApplicationError::Io { path, .. } => path,
        }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::FileNotFound { file } => {
                write!(f, "file not found: {}", file.display())
            }
            ApplicationError::PatternNotFound { file, source } => {
                write!(f, "{} in {}", source, file.display())
            }
            ApplicationError::Patch { file, source } => {
                write!(f, "{} in {}", source, file.display())
            }
            ApplicationError::Encoding { file, source } => {
                write!(f, "{} is not valid UTF-8: {}", file.display(), source)
            }
            ApplicationError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ApplicationError::Unsafe { file, reason } => {
                write!(f, "refusing to edit {}: {}", file.display(), reason)
            }
            ApplicationError::Discarded { file, cause } => {
                write!(
                    f,
                    "change to {} discarded because patch '{}' failed",
                    file.display(),
                    cause
                )
            }
            ApplicationError::Write { file, reason } => {
                write!(f, "failed to write {}: {}", file.display(), reason)
            }
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::PatternNotFound { source, .. }
            | ApplicationError::Patch { source, .. } => Some(source),
            ApplicationError::Encoding { source, .. } => Some(source),
            ApplicationError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Outcome of one patch against one of its target files.
#[derive(Debug)]
pub struct PatchOutcome {
    pub patch_id: String,
    pub file: PathBuf,
    pub result: Result<PatchResult, ApplicationError>,
}

/// Apply a patch set, writing changed files.
///
/// # Arguments
///
/// * `config` - The patch set to apply
/// * `workspace_root` - Root that relative targets resolve against when
///   `meta.workspace_relative` is set
///
/// # Returns
///
/// One outcome per (patch, target file), in declaration order
pub fn apply_patches(config: &PatchConfig, workspace_root: &Path) -> Vec<PatchOutcome> {
    run_patches(config, workspace_root, ApplyMode::Write)
}

/// Compute outcomes without touching the filesystem.
///
/// `Applied` means "would apply".
pub fn check_patches(config: &PatchConfig, workspace_root: &Path) -> Vec<PatchOutcome> {
    run_patches(config, workspace_root, ApplyMode::Check)
}

struct Target<'a> {
    patch_index: usize,
    target_index: usize,
    patch: &'a PatchDefinition,
}

/// A file whose content a run changed, or would change in check mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file: PathBuf,
    pub original: String,
    pub patched: String,
}

/// Everything one run over a patch set produced.
#[derive(Debug)]
pub struct BatchRun {
    /// One outcome per (patch, target file), in declaration order
    pub outcomes: Vec<PatchOutcome>,
    /// Changed files in first-seen order. Files discarded by a hard error or
    /// a failed write are absent.
    pub staged: Vec<StagedFile>,
}

/// Shared driver for [`apply_patches`] and [`check_patches`].
pub fn run_patches(config: &PatchConfig, workspace_root: &Path, mode: ApplyMode) -> Vec<PatchOutcome> {
    run_batch(config, workspace_root, mode).outcomes
}

/// Like [`run_patches`], also returning the before and after text of every
/// changed file.
pub fn run_batch(config: &PatchConfig, workspace_root: &Path, mode: ApplyMode) -> BatchRun {
    // Group targets by resolved path, keeping first-seen order
    let mut by_file: Vec<(PathBuf, Vec<Target<'_>>)> = Vec::new();
    for (patch_index, patch) in config.patches.iter().enumerate() {
        for (target_index, file) in patch.targets().into_iter().enumerate() {
            let path = resolve_target(config, workspace_root, file);
            let target = Target {
                patch_index,
                target_index,
                patch,
            };
            match by_file.iter_mut().find(|(p, _)| *p == path) {
                Some((_, targets)) => targets.push(target),
                None => by_file.push((path, vec![target])),
            }
        }
    }

    let guard = config
        .meta
        .workspace_relative
        .then(|| WorkspaceGuard::new(workspace_root).map_err(|e| e.to_string()));

    let mut ordered = Vec::new();
    let mut staged = Vec::new();
    for (file, targets) in by_file {
        let (results, change) = process_file(&file, &targets, guard.as_ref(), mode);
        staged.extend(change);
        for (target, result) in targets.iter().zip(results) {
            ordered.push((
                (target.patch_index, target.target_index),
                PatchOutcome {
                    patch_id: target.patch.id.clone(),
                    file: file.clone(),
                    result,
                },
            ));
        }
    }

    ordered.sort_by_key(|(key, _)| *key);
    BatchRun {
        outcomes: ordered.into_iter().map(|(_, outcome)| outcome).collect(),
        staged,
    }
}

fn resolve_target(config: &PatchConfig, workspace_root: &Path, file: &str) -> PathBuf {
    if config.meta.workspace_relative {
        workspace_root.join(file)
    } else {
        PathBuf::from(file)
    }
}

type FileResults = Vec<Result<PatchResult, ApplicationError>>;

/// Run every patch targeting `file` against one in-memory copy of it.
fn process_file(
    file: &Path,
    targets: &[Target<'_>],
    guard: Option<&Result<WorkspaceGuard, String>>,
    mode: ApplyMode,
) -> (FileResults, Option<StagedFile>) {
    let fail_all = |make: &dyn Fn() -> ApplicationError| -> (FileResults, Option<StagedFile>) {
        (targets.iter().map(|_| Err(make())).collect(), None)
    };

    if !file.exists() {
        tracing::warn!(file = %file.display(), "target file not found");
        return fail_all(&|| ApplicationError::FileNotFound {
            file: file.to_path_buf(),
        });
    }

    if let Some(guard) = guard {
        let checked = match guard {
            Ok(guard) => guard.validate_path(file).map(|_| ()).map_err(|e| e.to_string()),
            Err(reason) => Err(reason.clone()),
        };
        if let Err(reason) = checked {
            return fail_all(&|| ApplicationError::Unsafe {
                file: file.to_path_buf(),
                reason: reason.clone(),
            });
        }
    }

    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(source) => {
            // std::io::Error is not Clone; rebuild one per patch from kind + message
            let kind = source.kind();
            let msg = source.to_string();
            return fail_all(&|| ApplicationError::Io {
                path: file.to_path_buf(),
                source: std::io::Error::new(kind, msg.clone()),
            });
        }
    };

    let original = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(source) => {
            return fail_all(&|| ApplicationError::Encoding {
                file: file.to_path_buf(),
                source,
            });
        }
    };

    let mut content = original.to_string();
    let mut results = Vec::with_capacity(targets.len());
    let mut aborted_by: Option<&str> = None;

    for target in targets {
        let patch = target.patch;
        match patch.rule.apply(&content) {
            Ok(next) => {
                let next = patch.line_endings.finish(next);
                if next == content {
                    tracing::debug!(patch = %patch.id, file = %file.display(), "unchanged");
                    results.push(Ok(PatchResult::Unchanged {
                        file: file.to_path_buf(),
                    }));
                } else {
                    tracing::debug!(patch = %patch.id, file = %file.display(), "staged");
                    results.push(Ok(PatchResult::Applied {
                        file: file.to_path_buf(),
                    }));
                    content = next;
                }
            }
            Err(source) if source.is_hard() => {
                tracing::warn!(patch = %patch.id, file = %file.display(), %source, "patch failed");
                if aborted_by.is_none() {
                    aborted_by = Some(patch.id.as_str());
                }
                results.push(Err(ApplicationError::Patch {
                    file: file.to_path_buf(),
                    source,
                }));
            }
            Err(source) => {
                tracing::debug!(patch = %patch.id, file = %file.display(), %source, "no match");
                results.push(Err(ApplicationError::PatternNotFound {
                    file: file.to_path_buf(),
                    source,
                }));
            }
        }
    }

    if let Some(cause) = aborted_by {
        let results = results
            .into_iter()
            .map(|result| match result {
                Ok(PatchResult::Applied { file }) => Err(ApplicationError::Discarded {
                    file,
                    cause: cause.to_string(),
                }),
                other => other,
            })
            .collect();
        return (results, None);
    }

    if mode == ApplyMode::Write {
        match write_if_changed(file, original, &content) {
            Ok(WriteOutcome::Written) => {
                tracing::debug!(file = %file.display(), "written");
            }
            Ok(WriteOutcome::Unchanged) => {}
            Err(err) => {
                let reason = err.to_string();
                let results = results
                    .into_iter()
                    .map(|result| match result {
                        Ok(PatchResult::Applied { file }) => Err(ApplicationError::Write {
                            file,
                            reason: reason.clone(),
                        }),
                        other => other,
                    })
                    .collect();
                return (results, None);
            }
        }
    }

    let change = (content != original).then(|| StagedFile {
        file: file.to_path_buf(),
        original: original.to_string(),
        patched: content,
    });
    (results, change)
}
