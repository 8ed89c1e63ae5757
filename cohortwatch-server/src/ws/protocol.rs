//! WebSocket protocol message types
//!
//! The relay only pushes; viewers never send application messages.

use serde::{Deserialize, Serialize};

use crate::relay::DecodedEvent;

/// Messages sent from server to viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The cohort currently monitored (`null` when none is selected)
    Cohort {
        /// Cohort name
        cohort: Option<String>,
    },

    /// One decoded event from the monitored cohort's topic
    Event {
        /// Cohort the event was read from
        cohort: String,
        /// The decoded payload, forwarded unchanged
        event: DecodedEvent,
    },

    /// The selected cohort's topic does not exist on the bus
    UnknownCohort {
        /// Cohort name
        cohort: String,
        /// Human-readable explanation
        message: String,
    },
}

impl ServerMessage {
    /// Announcement of the current cohort.
    pub fn cohort(cohort: Option<&str>) -> Self {
        Self::Cohort {
            cohort: cohort.map(str::to_string),
        }
    }

    /// Notice that `cohort` has no topic on the bus.
    pub fn unknown_cohort(cohort: &str) -> Self {
        Self::UnknownCohort {
            cohort: cohort.to_string(),
            message: format!("cohort '{}' does not exist", cohort),
        }
    }
}
