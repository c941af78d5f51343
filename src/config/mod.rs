pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_patches, check_patches, run_batch, run_patches, ApplicationError, ApplyMode, BatchRun,
    PatchOutcome, PatchResult, StagedFile,
};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{Metadata, PatchConfig, PatchDefinition, ValidationError, ValidationIssue};
