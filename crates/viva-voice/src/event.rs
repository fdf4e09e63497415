//! Engine events emitted to the application layer.
//!
//! Both controllers share one unbounded channel; the service bridges it onto
//! the host's event bus. Emission is best-effort — a dropped receiver is
//! logged and otherwise ignored, so the engine never stalls on a dead
//! listener.

use tokio::sync::mpsc;

/// Events emitted by the speech engine to the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// Playback started for a speak request.
    SpeakingStarted,

    /// Playback finished draining, or was cancelled mid-queue.
    SpeakingFinished,

    /// The recognition listening state changed.
    ListeningChanged(bool),

    /// The transcript was rebuilt from the latest result snapshot.
    Transcript {
        /// Full display transcript.
        text: String,
        /// Whether the transcript currently has no unconfirmed tail.
        is_final: bool,
    },

    /// A non-benign engine error.
    Error(String),
}

/// Sender half used by both engine controllers.
pub type VoiceEventSender = mpsc::UnboundedSender<VoiceEvent>;

/// Create the engine event channel.
pub fn channel() -> (VoiceEventSender, mpsc::UnboundedReceiver<VoiceEvent>) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(tx: &VoiceEventSender, event: VoiceEvent) {
    if tx.send(event).is_err() {
        tracing::warn!("voice event receiver dropped");
    }
}
