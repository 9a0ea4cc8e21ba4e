//! CLI error types with exit code handling

use std::path::PathBuf;

use kustomizily_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Failure inside the engine, diagnostic passed through unchanged
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] CoreError),

    /// Input file could not be opened
    #[error("Failed to open input {}: {source}", path.display())]
    #[diagnostic(
        code(kustomizily::cli::input),
        help("pass `-i -` to read from stdin")
    )]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(err) if err.is_input_error() => exit_codes::INPUT_ERROR,
            CliError::Core(CoreError::UnresolvableNaming { .. }) => exit_codes::NAMING_ERROR,
            CliError::Core(
                CoreError::Sink { .. }
                | CoreError::DuplicateWrite { .. }
                | CoreError::UnsafePath { .. }
                | CoreError::Io(_),
            ) => exit_codes::IO_ERROR,
            CliError::Core(_) => exit_codes::ERROR,
            CliError::OpenInput { .. } => exit_codes::IO_ERROR,
        }
    }

    pub fn open_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenInput {
            path: path.into(),
            source,
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
