// src/error.rs
use std::path::PathBuf;

/// Everything that can abort a pipeline run. There is no recovery from any
/// of these: a run either fully succeeds or surfaces one of them at the top.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to open input file {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output file {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output file {} already exists - refusing to overwrite", .0.display())]
    OutputExists(PathBuf),

    #[error("unrecognized input format: {0}")]
    UnknownInputFormat(String),

    #[error("unrecognized output format: {0}")]
    UnknownOutputFormat(String),
}
