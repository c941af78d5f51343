use crate::text::{check_rename_order, LineEndingPolicy, PatchRule, RenameOrderError};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        let mut seen_ids = HashSet::new();

        for patch in &self.patches {
            let id = || Some(patch.id.clone());

            if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            } else if !seen_ids.insert(patch.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId(patch.id.clone()));
            }

            match (&patch.file, patch.files.is_empty()) {
                (None, true) => issues.push(ValidationIssue::MissingField {
                    patch_id: id(),
                    field: "file",
                }),
                (Some(_), false) => issues.push(ValidationIssue::InvalidCombo {
                    patch_id: id(),
                    message: "use either 'file' or 'files', not both".to_string(),
                }),
                _ => {}
            }
            if patch.targets().iter().any(|f| f.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    patch_id: id(),
                    field: "files[]",
                });
            }

            match &patch.rule {
                PatchRule::ExactBlock { old, .. } => {
                    if old.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id(),
                            field: "rule.old",
                        });
                    }
                }
                PatchRule::MarkerSpan {
                    start_marker,
                    end_delimiter,
                    ..
                } => {
                    if start_marker.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id(),
                            field: "rule.start_marker",
                        });
                    }
                    if end_delimiter.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id(),
                            field: "rule.end_delimiter",
                        });
                    }
                }
                PatchRule::Rename { renames } => {
                    if renames.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id(),
                            field: "rule.renames",
                        });
                    }
                    if renames.iter().any(|r| r.from.is_empty()) {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id(),
                            field: "rule.renames[].from",
                        });
                    }
                    if let Err(source) = check_rename_order(renames) {
                        issues.push(ValidationIssue::RenameOrder {
                            patch_id: patch.id.clone(),
                            source,
                        });
                    }
                }
                PatchRule::Literal { search, .. } => {
                    if search.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id(),
                            field: "rule.search",
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve relative target paths against the workspace root
    #[serde(default)]
    pub workspace_relative: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    pub rule: PatchRule,
    #[serde(default)]
    pub line_endings: LineEndingPolicy,
}

impl PatchDefinition {
    /// Target paths in declaration order.
    pub fn targets(&self) -> Vec<&str> {
        match &self.file {
            Some(file) => vec![file.as_str()],
            None => self.files.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatchList,
    DuplicateId(String),
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
    /// A rename key runs before a longer key that contains it
    RenameOrder {
        patch_id: String,
        source: RenameOrderError,
    },
}

impl ValidationIssue {
    pub fn patch_id(&self) -> Option<&str> {
        match self {
            ValidationIssue::EmptyPatchList => None,
            ValidationIssue::DuplicateId(id) => Some(id.as_str()),
            ValidationIssue::MissingField { patch_id, .. }
            | ValidationIssue::InvalidCombo { patch_id, .. } => patch_id.as_deref(),
            ValidationIssue::RenameOrder { patch_id, .. } => Some(patch_id.as_str()),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::DuplicateId(id) => write!(f, "patch id '{id}' is used more than once"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
            ValidationIssue::RenameOrder { patch_id, source } => {
                write!(f, "patch '{patch_id}' would shadow a longer key: {source}")
            }
        }
    }
}
