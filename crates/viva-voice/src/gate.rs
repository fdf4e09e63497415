//! Interaction gate — blocks playback until the user has interacted.
//!
//! Platform autoplay policy refuses audio output before the first
//! user-initiated input. The host forwards its first pointer press, key
//! press, or touch event to [`InteractionGate::mark_interaction`]; the latch
//! is one-shot and never resets for the lifetime of the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared one-shot latch tracking whether the user has interacted with the
/// page since load.
///
/// Clones share state, so the gate can be handed to both the host input
/// layer (writer) and the playback controller (reader).
#[derive(Debug, Clone)]
pub struct InteractionGate {
    has_interaction: Arc<AtomicBool>,
}

impl InteractionGate {
    /// Create a new gate (initially closed).
    pub fn new() -> Self {
        Self {
            has_interaction: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Latch the gate open. Idempotent; later calls are no-ops.
    pub fn mark_interaction(&self) {
        if !self.has_interaction.swap(true, Ordering::SeqCst) {
            tracing::debug!("interaction gate: unlocked by first user input");
        }
    }

    /// Whether any user interaction has occurred this session.
    pub fn has_interaction(&self) -> bool {
        self.has_interaction.load(Ordering::SeqCst)
    }
}

impl Default for InteractionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_starts_closed() {
        let gate = InteractionGate::new();
        assert!(!gate.has_interaction());
    }

    #[test]
    fn first_interaction_opens_permanently() {
        let gate = InteractionGate::new();

        gate.mark_interaction();
        assert!(gate.has_interaction());

        // Nothing unsets the latch.
        gate.mark_interaction();
        assert!(gate.has_interaction());
    }

    #[test]
    fn clones_share_state() {
        let gate1 = InteractionGate::new();
        let gate2 = gate1.clone();

        gate1.mark_interaction();
        assert!(gate2.has_interaction());
    }
}
