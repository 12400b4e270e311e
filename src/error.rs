//! Error types.
//!
//! Only [`PipelineError`] ever reaches a caller of the orchestrator. Provider
//! failures are [`RecognitionError`]s and are absorbed by the recognition
//! adapter.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("image file not found: {}", .0.display())]
    InputMissing(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// Vision provider could not answer (credential, network, provider error).
    #[error("vision provider unavailable: {0}")]
    SourceUnavailable(String),
}
