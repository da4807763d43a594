//! Error types for planning and hand-off.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::Rejection;

/// Broad classes of planning failure. Both are fatal; there is no retry at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inputs or options that cannot produce a plan.
    Configuration,
    /// The filesystem or host refused something the plan needs.
    Resource,
}

/// Errors that can occur while building an execution plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Unknown database type for {path}; recreate the database or add a .dbtype file")]
    UnknownDatabaseType { path: PathBuf },

    #[error("{0}")]
    Unsupported(Rejection),

    #[error("Start sensitivity {start} must not be greater than sensitivity {target}")]
    SensitivitySchedule { start: f32, target: f32 },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Expected at least one positional filename (the temporary directory)")]
    MissingTmpDir,

    #[error("Could not create temporary directory {path}: {source}")]
    TmpDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write script {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine total system memory: {0}")]
    SystemMemory(String),

    #[error("Worker synchronization failed: {0}")]
    Barrier(String),
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::UnknownDatabaseType { .. }
            | PlanError::Unsupported(_)
            | PlanError::SensitivitySchedule { .. }
            | PlanError::InvalidOption(_)
            | PlanError::MissingTmpDir => ErrorKind::Configuration,
            PlanError::TmpDir { .. }
            | PlanError::ScriptWrite { .. }
            | PlanError::SystemMemory(_)
            | PlanError::Barrier(_) => ErrorKind::Resource,
        }
    }
}

impl From<Rejection> for PlanError {
    fn from(rejection: Rejection) -> Self {
        PlanError::Unsupported(rejection)
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised when control could not be handed to the execution engine
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("Failed to execute {program}: {source}")]
    Exec {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution engine declined the plan: {0}")]
    Declined(String),

    #[error("Process replacement is not supported on this platform")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Rejection;

    #[test]
    fn test_error_kinds() {
        let err = PlanError::from(Rejection::ProfileProfile);
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "Profile-profile searches are not supported");

        let err = PlanError::TmpDir {
            path: PathBuf::from("/nowhere"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(err.to_string().contains("/nowhere"));
    }
}
