//! Canonical event union for all cross-adapter events.
//!
//! This module is the single source of truth for events consumed by the host
//! application's listeners (SSE handlers, desktop shells).
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag for TypeScript compatibility:
//!
//! ```json
//! { "type": "voice_transcript", "text": "hello there", "isFinal": false }
//! ```

use serde::{Deserialize, Serialize};

/// Canonical event types for all adapters.
///
/// Each variant includes all necessary context for the event to be
/// self-describing; listeners never need to query engine state to interpret
/// one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Speech playback has started for a speak request.
    VoiceSpeakingStarted,

    /// Speech playback finished draining, or was cancelled.
    VoiceSpeakingFinished,

    /// The recognition listening state changed.
    VoiceListeningChanged {
        /// Whether a recognition session is now live.
        listening: bool,
    },

    /// The transcript was rebuilt from the latest recognition snapshot.
    VoiceTranscript {
        /// Full display transcript: confirmed speech plus the unconfirmed tail.
        text: String,
        /// Whether the transcript currently has no unconfirmed tail.
        #[serde(rename = "isFinal")]
        is_final: bool,
    },

    /// A non-benign engine error.
    VoiceError {
        /// Human-readable error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_event_wire_shape() {
        let event = AppEvent::VoiceTranscript {
            text: "hello there".to_string(),
            is_final: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "voice_transcript");
        assert_eq!(json["text"], "hello there");
        assert_eq!(json["isFinal"], false);
    }

    #[test]
    fn unit_variants_carry_only_the_tag() {
        let json = serde_json::to_value(AppEvent::VoiceSpeakingStarted).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "voice_speaking_started" }));
    }

    #[test]
    fn events_round_trip() {
        let events = vec![
            AppEvent::VoiceSpeakingStarted,
            AppEvent::VoiceSpeakingFinished,
            AppEvent::VoiceListeningChanged { listening: true },
            AppEvent::VoiceError {
                message: "audio-capture".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let back: AppEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }
}
