//! Core error types

use miette::Diagnostic;
use thiserror::Error;

use crate::naming::Batch;

#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum CoreError {
    #[error("Failed to parse document #{index}: {source}")]
    #[diagnostic(
        code(kustomizily::document::malformed),
        help("every document between `---` separators must be a YAML mapping")
    )]
    MalformedDocument {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Document too large: exceeds {limit} bytes")]
    #[diagnostic(
        code(kustomizily::document::oversized),
        help("raise the limit with --max-document-size")
    )]
    OversizedDocument { limit: usize },

    #[error("Invalid base64 payload for key '{key}' in {resource}: {source}")]
    #[diagnostic(code(kustomizily::payload::base64))]
    InvalidEncodedPayload {
        resource: String,
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("No unique filename strategy for {batch} in directory '{directory}'")]
    #[diagnostic(code(kustomizily::naming::unresolvable))]
    UnresolvableNaming { directory: String, batch: Batch },

    #[error("Failed to write {directory}/{filename}: {source}")]
    #[diagnostic(code(kustomizily::sink))]
    Sink {
        directory: String,
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink already holds {directory}/{filename}")]
    #[diagnostic(code(kustomizily::sink::duplicate))]
    DuplicateWrite { directory: String, filename: String },

    #[error("Refusing to write '{filename}' into '{directory}': path leaves the output root")]
    #[diagnostic(
        code(kustomizily::sink::unsafe_path),
        help("directory labels and data keys must be relative names without `.` or `..`")
    )]
    UnsafePath { directory: String, filename: String },

    #[error("Pipeline stopped by an earlier error")]
    #[diagnostic(code(kustomizily::pipeline::aborted))]
    PipelineAborted,

    #[error("IO error: {0}")]
    #[diagnostic(code(kustomizily::io))]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether the error comes from the input stream rather than naming or output
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::MalformedDocument { .. }
                | CoreError::OversizedDocument { .. }
                | CoreError::InvalidEncodedPayload { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
