//! The cohort event relay.
//!
//! ```text
//!            select_cohort(name)
//!                   │
//!                   ▼
//! ┌───────────────────────────────┐        ┌──────────────────────┐
//! │ SubscriptionManager           │ opens  │ TopicSubscription    │◀── bus topic
//! │  Idle | Active(cohort)        │───────▶│  poll → decode       │
//! │  generation counter           │        │  → DeliverySink      │
//! └──────────────┬────────────────┘        └──────────┬───────────┘
//!                │ announce                           │ push (if current)
//!                ▼                                    ▼
//!          ┌──────────────────────────────────────────────┐
//!          │ Broadcaster ──▶ every connected viewer        │
//!          └──────────────────────────────────────────────┘
//! ```
//!
//! Only the manager opens and closes subscriptions, one at a time. Every
//! subscription carries the generation it was opened under, and its
//! deliveries are dropped once the manager has moved past that generation.

mod broadcast;
mod decoder;
mod delivery;
mod manager;
mod subscription;

pub use broadcast::{Broadcaster, DEFAULT_BROADCAST_CAPACITY};
pub use decoder::{DecodeError, DecodedEvent, decode};
pub use delivery::{DeliverySink, RelayStats, RelayStatsSnapshot};
pub use manager::SubscriptionManager;
pub use subscription::{SubscriptionState, TopicSubscription};

use cohortwatch_bus::CohortName;

/// Errors surfaced by the relay to its operator.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The subscription for a newly selected cohort could not be opened.
    #[error("failed to open subscription for cohort '{cohort}': {source}")]
    Open {
        cohort: CohortName,
        #[source]
        source: cohortwatch_bus::Error,
    },
}
