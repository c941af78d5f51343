//! Reading patch sets.
//!
//! A patch set is parsed with `toml_edit`'s serde deserializer and then
//! validated as a whole, so one load reports every problem in the file.

use crate::config::schema::{PatchConfig, ValidationError, ValidationIssue};
use crate::text::line_of;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    /// The patch set file could not be read
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Not TOML, or not shaped like a patch set (unknown rule `type`, missing `id`)
    Parse {
        path: Option<PathBuf>,
        /// 1-based line the deserializer pointed at, when it did
        line: Option<usize>,
        source: toml_edit::de::Error,
    },
    /// Well-formed, but one or more patches cannot run as written
    Invalid {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// Validation issues, empty for read and parse failures.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ConfigError::Invalid { source, .. } => &source.issues,
            _ => &[],
        }
    }

    /// Ids of the patches named by validation issues, deduplicated, in order.
    pub fn patch_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for id in self.issues().iter().filter_map(ValidationIssue::patch_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Whether a rename map lists a shorter key ahead of a longer key containing it.
    pub fn is_rename_order(&self) -> bool {
        self.issues()
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::RenameOrder { .. }))
    }

    fn in_file(self, file: &Path) -> Self {
        match self {
            ConfigError::Parse {
                path: None,
                line,
                source,
            } => ConfigError::Parse {
                path: Some(file.to_path_buf()),
                line,
                source,
            },
            ConfigError::Invalid { path: None, source } => ConfigError::Invalid {
                path: Some(file.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

struct Origin<'a>(&'a Option<PathBuf>);

impl fmt::Display for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "patch set {}", path.display()),
            None => write!(f, "patch set"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read patch set {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, line, source } => match line {
                Some(line) => {
                    write!(f, "{} is malformed at line {}: {}", Origin(path), line, source)
                }
                None => write!(f, "{} is malformed: {}", Origin(path), source),
            },
            ConfigError::Invalid { path, source } => {
                let count = source.issues.len();
                let noun = if count == 1 { "problem" } else { "problems" };
                writeln!(f, "{} has {} {}:", Origin(path), count, noun)?;
                for (idx, issue) in source.issues.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Parse {
            path: None,
            line: source.span().map(|span| line_of(input, span.start)),
            source,
        })?;
    config
        .validate()
        .map_err(|source| ConfigError::Invalid { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.in_file(path))
}
