//! Connection state management
//!
//! This module implements the state machine for a DICT session's socket: it
//! is connected once the `220` greeting arrived and identified once the
//! `CLIENT` announcement was accepted.

use std::fmt;

/// Connection state of a DICT session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket
    Disconnected,
    /// Socket being opened, greeting not yet read
    Connecting,
    /// Greeting accepted, client identity not yet announced
    Connected,
    /// Ready for commands
    Identified,
    /// `QUIT` sent, draining the reply
    Disconnecting,
    /// Connection attempt or exchange failed; socket released
    Failed,
}

impl ConnectionState {
    /// Check if commands can be written
    pub fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Identified)
    }

    /// Check if the session is ready for regular commands
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Identified)
    }

    /// Check if the state holds no socket
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Failed
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected (not identified)"),
            ConnectionState::Identified => write!(f, "Identified"),
            ConnectionState::Disconnecting => write!(f, "Disconnecting"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

/// State transition validator
pub struct StateTransition {
    from: ConnectionState,
    to: ConnectionState,
}

impl StateTransition {
    /// Create a new state transition
    pub fn new(from: ConnectionState, to: ConnectionState) -> Self {
        Self { from, to }
    }

    /// Check if the transition is valid according to the state machine rules
    pub fn is_valid(&self) -> bool {
        use ConnectionState::*;

        match (self.from, self.to) {
            (Disconnected, Connecting) => true,

            (Connecting, Connected) => true,
            (Connecting, Failed) => true,
            (Connecting, Disconnected) => true,

            (Connected, Identified) => true,
            (Connected, Disconnecting) => true,
            (Connected, Failed) => true,
            (Connected, Disconnected) => true,

            (Identified, Disconnecting) => true,
            (Identified, Failed) => true,
            // Peer hung up between commands
            (Identified, Disconnected) => true,

            (Disconnecting, Disconnected) => true,
            (Disconnecting, Failed) => true,

            (Failed, Disconnected) => true,
            (Failed, Connecting) => true,

            _ => false,
        }
    }

    /// Get a description of why a transition might be invalid
    pub fn validation_error(&self) -> Option<String> {
        if self.is_valid() {
            None
        } else {
            Some(format!(
                "Invalid transition from {} to {}",
                self.from, self.to
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_capabilities() {
        let state = ConnectionState::Disconnected;
        assert!(!state.can_send());
        assert!(!state.is_ready());
        assert!(state.is_terminal());

        let state = ConnectionState::Connected;
        assert!(state.can_send());
        assert!(!state.is_ready());
        assert!(!state.is_terminal());

        let state = ConnectionState::Identified;
        assert!(state.can_send());
        assert!(state.is_ready());

        assert!(!ConnectionState::Disconnecting.can_send());
        assert!(ConnectionState::Failed.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        use ConnectionState::*;
        let valid_transitions = vec![
            (Disconnected, Connecting),
            (Connecting, Connected),
            (Connected, Identified),
            (Identified, Disconnecting),
            (Disconnecting, Disconnected),
            (Identified, Disconnected),
            (Failed, Connecting),
        ];

        for (from, to) in valid_transitions {
            let transition = StateTransition::new(from, to);
            assert!(
                transition.is_valid(),
                "Transition from {from:?} to {to:?} should be valid"
            );
            assert_eq!(transition.validation_error(), None);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        use ConnectionState::*;
        let invalid_transitions = vec![
            (Disconnected, Identified),
            (Disconnected, Connected),
            (Connecting, Identified),
            (Disconnecting, Connecting),
            (Failed, Identified),
        ];

        for (from, to) in invalid_transitions {
            let transition = StateTransition::new(from, to);
            assert!(
                !transition.is_valid(),
                "Transition from {from:?} to {to:?} should be invalid"
            );
            assert!(transition.validation_error().is_some());
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(
            ConnectionState::Connected.to_string(),
            "Connected (not identified)"
        );
        assert_eq!(ConnectionState::Identified.to_string(), "Identified");
    }
}
