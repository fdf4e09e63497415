//! Voice engine port — the surface a UI adapter needs to drive speech.
//!
//! # Design Rules
//!
//! - DTOs here are transport-agnostic wire shapes (no `viva-voice` types).
//! - Conversion from engine-native types happens inside `viva-voice`, never
//!   here. This keeps `viva-core` free of any dependency on `viva-voice`.
//! - No method returns a `Result`: engine failures resolve into state-flag
//!   changes and the `error` field of [`VoiceStatusDto`]. Nothing in the
//!   voice subsystem is fatal to the hosting application.

use serde::{Deserialize, Serialize};

/// Snapshot of both engine halves, shaped for a status endpoint.
// Wire-shape DTO: the bools are distinct independent flags (synthesis
// support, speaking, voice mode, interaction latch, recognition support,
// listening); there is no state-machine grouping that would read better in
// the JSON payload.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStatusDto {
    /// Whether the platform exposes a speech synthesis capability.
    pub has_voice_support: bool,
    /// Whether a playback queue is currently draining.
    pub is_speaking: bool,
    /// Whether voice mode is enabled (user preference).
    pub voice_mode_enabled: bool,
    /// Whether the user has interacted with the page since load.
    pub has_user_interaction: bool,
    /// Whether the platform exposes a speech recognition capability.
    pub recognition_supported: bool,
    /// Whether a recognition session is live.
    pub is_listening: bool,
    /// Current display transcript (confirmed speech plus unconfirmed tail).
    pub transcript: String,
    /// Last non-benign recognition error, if any.
    pub error: Option<String>,
}

/// The single surface UI adapters use to drive the speech engine.
///
/// All operations return immediately; platform work completes later via the
/// engine's event stream ([`crate::events::AppEvent`] voice variants).
pub trait VoicePort: Send + Sync {
    /// Snapshot the current engine state.
    fn status(&self) -> VoiceStatusDto;

    /// Queue text for spoken playback, superseding any queue in flight.
    ///
    /// No-op when voice mode is disabled, the user has not yet interacted
    /// with the page, or the text normalizes to empty.
    fn speak(&self, text: &str);

    /// Speak a one-time introduction at most once per session.
    ///
    /// The key is marked as played before speech begins, so a failure during
    /// playback does not cause a repeat on retry.
    fn play_intro(&self, key: &str, text: &str);

    /// Stop any in-progress playback and empty the queue. Idempotent.
    fn cancel_speech(&self);

    /// Enable or disable voice mode.
    fn set_voice_mode(&self, enabled: bool);

    /// Record that the user has interacted with the page.
    ///
    /// The host forwards its first pointer press, key press, or touch event;
    /// the latch never resets for the session lifetime.
    fn mark_interaction(&self);

    /// Start a continuous recognition session, superseding any existing one.
    fn start_listening(&self);

    /// Intentionally stop the live recognition session.
    fn stop_listening(&self);

    /// Reset the transcript without affecting the listening state.
    fn clear_transcript(&self);
}
