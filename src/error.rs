use std::path::{Path, PathBuf};
use thiserror::Error;

pub type PriorityResult<T> = std::result::Result<T, PriorityError>;

#[derive(Debug, Error)]
pub enum PriorityError {
    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },
    #[error("read error {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("invalid priority value '{value}' ({context})")]
    InvalidPriorityValue { value: String, context: String },
    #[error("could not map source to folder: '{source_name}'")]
    UnmappedSource { source_name: String },
    #[error("write failed {}: {reason}", path.display())]
    WriteFailure { path: PathBuf, reason: String },
}

impl PriorityError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn decode(path: &Path, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_priority(value: impl ToString, context: impl Into<String>) -> Self {
        Self::InvalidPriorityValue {
            value: value.to_string(),
            context: context.into(),
        }
    }

    pub fn write(path: &Path, reason: impl ToString) -> Self {
        Self::WriteFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Scan-level failures that make a single add-on unusable but leave the
    /// rest of a batch intact.
    pub fn is_addon_local(&self) -> bool {
        matches!(
            self,
            PriorityError::Decode { .. }
                | PriorityError::InvalidPriorityValue { .. }
                | PriorityError::WriteFailure { .. }
        )
    }
}
