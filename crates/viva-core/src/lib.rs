//! Core domain types and port definitions for viva.
//!
//! This crate holds the transport-agnostic surface of the voice subsystem:
//! the canonical [`AppEvent`] union that UI adapters consume, and the
//! [`VoicePort`] trait that is the only thing an adapter needs in order to
//! drive the speech engine. Engine-native types never appear here —
//! conversion happens inside `viva-voice`, keeping the dependency arrow
//! one-way.

pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use events::AppEvent;
pub use ports::{AppEventEmitter, NoopEmitter, VoicePort, VoiceStatusDto};
