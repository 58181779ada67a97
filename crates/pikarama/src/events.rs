//! Event types delivered by Pikarama webhooks.

use std::fmt;
use std::str::FromStr;

use nodes::NodeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEventType {
    /// A new event was created.
    #[serde(rename = "event.created")]
    EventCreated,
    /// An event completed.
    #[serde(rename = "event.closed")]
    EventClosed,
    /// A vote was cast.
    #[serde(rename = "event.voted")]
    EventVoted,
    /// A submission was added.
    #[serde(rename = "submission.added")]
    SubmissionAdded,
}

impl WebhookEventType {
    pub const ALL: [Self; 4] = [
        Self::EventCreated,
        Self::EventClosed,
        Self::EventVoted,
        Self::SubmissionAdded,
    ];

    /// Subscription used when the trigger's `events` parameter is unset.
    pub const DEFAULT: [Self; 2] = [Self::EventCreated, Self::EventClosed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventCreated => "event.created",
            Self::EventClosed => "event.closed",
            Self::EventVoted => "event.voted",
            Self::SubmissionAdded => "submission.added",
        }
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEventType {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| NodeError::InvalidParameter {
                name: "events".into(),
                message: format!("unknown event type '{s}'"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_form_matches_serde_form() {
        for e in WebhookEventType::ALL {
            let json = serde_json::to_value(e).unwrap();
            assert_eq!(json, e.as_str());
            assert_eq!(e.as_str().parse::<WebhookEventType>().unwrap(), e);
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!("event.deleted".parse::<WebhookEventType>().is_err());
    }
}
