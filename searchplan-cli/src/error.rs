//! Error handling for the searchplan CLI

use std::path::PathBuf;
use thiserror::Error;

use searchplan_core::{ErrorKind, HandoffError, PlanError};

/// Main error type for searchplan CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("Unknown database type: {path}")]
    UnknownDatabase { path: PathBuf },

    #[error("Unsupported search: {message}")]
    Unsupported { message: String },

    #[error("Resource error: {message}")]
    Resource { message: String },

    #[error("Hand-off failed: {message}")]
    Handoff { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported { message: message.into() }
    }

    pub fn resource<S: Into<String>>(message: S) -> Self {
        Self::Resource { message: message.into() }
    }

    pub fn handoff<S: Into<String>>(message: S) -> Self {
        Self::Handoff { message: message.into() }
    }
}

impl From<PlanError> for CliError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::UnknownDatabaseType { path } => Self::UnknownDatabase { path },
            PlanError::Unsupported(rejection) => Self::unsupported(rejection.to_string()),
            other => match other.kind() {
                ErrorKind::Configuration => Self::config(other.to_string()),
                ErrorKind::Resource => Self::resource(other.to_string()),
            },
        }
    }
}

impl From<HandoffError> for CliError {
    fn from(err: HandoffError) -> Self {
        Self::handoff(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::UnknownDatabase { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that {} is a database and not a FASTA file\n\
                 • Ensure {}.dbtype exists and is readable\n\
                 • Recreate the database with createdb",
                path.display(),
                path.display()
            ));
        }

        CliError::Unsupported { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Swap query and target if only one of them is a profile database\n\
                 • Drop --num-iterations for target-profile searches\n\
                 • Use a gapped --alignment-mode with profile databases",
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your searchplan.toml configuration file\n\
                 • Use 'searchplan config --example' to generate a sample configuration\n\
                 • Verify that --start-sens is not greater than --sensitivity",
            );
        }

        CliError::Resource { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check write permissions of the temporary directory\n\
                 • Free up disk space\n\
                 • Set slicing.total_memory_bytes if /proc/meminfo is unavailable",
            );
        }

        CliError::Handoff { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Ensure the temporary directory is not mounted noexec\n\
                 • Check that /bin/sh is available",
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchplan_core::Rejection;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_plan_error_mapping() {
        let err: CliError = PlanError::from(Rejection::NucleotideNucleotide).into();
        assert_eq!(
            err.to_string(),
            "Unsupported search: Nucleotide-nucleotide searches are not supported"
        );

        let err: CliError = PlanError::SystemMemory("no meminfo".into()).into();
        assert!(matches!(err, CliError::Resource { .. }));

        let err: CliError = PlanError::SensitivitySchedule { start: 7.0, target: 5.7 }.into();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::UnknownDatabase { path: PathBuf::from("queryDB") };
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("queryDB.dbtype"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(matches!(cli_err, CliError::Io { .. }));
    }
}
