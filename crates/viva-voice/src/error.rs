//! Speech engine error types.

/// Errors that can occur at the platform backend seam.
///
/// None of these cross the application port boundary: the controllers
/// absorb them into state flags, log lines, and the exposed error string.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The platform exposes no speech capability of the requested kind.
    #[error("speech recognition is not supported on this platform")]
    Unsupported,

    /// A recognition session could not be opened or started.
    #[error("failed to start recognition session: {0}")]
    SessionStart(String),

    /// Speech synthesis failed for an utterance.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// The recognizer reported an unexpected error.
    #[error("speech recognition failed: {0}")]
    Recognition(String),
}
