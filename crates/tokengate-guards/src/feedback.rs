//! Final feedback returned from a use interaction

use serde::{Deserialize, Serialize};
use tokengate_core::MessageConfig;

/// Final outcome of `on_use`, as reported to the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackMessage {
    /// No identity token was presented
    NothingHappens,
    /// The credential was accepted
    AccessGranted,
    /// The credential was refused
    AccessDenied,
    /// The resource's use mode is unset or unknown
    Misconfigured,
}

impl FeedbackMessage {
    /// Text for this outcome under a resource's message configuration
    pub fn text<'a>(&self, messages: &'a MessageConfig) -> &'a str {
        match self {
            FeedbackMessage::NothingHappens => &messages.nothing_happens,
            FeedbackMessage::AccessGranted => &messages.access_granted,
            FeedbackMessage::AccessDenied => &messages.access_denied,
            FeedbackMessage::Misconfigured => &messages.misconfigured,
        }
    }

    /// Returns `true` when the protected action will run
    pub fn is_granted(&self) -> bool {
        matches!(self, FeedbackMessage::AccessGranted)
    }
}
