//! # Relay Core
//!
//! Building blocks shared by every connection thread of a realtime
//! publish/subscribe relay.
//!
//! ## Core Concepts
//!
//! - **Subscription ids**: Client-chosen, validated, fixed-capacity routing keys
//! - **Subscriptions**: A connection's registration with an opaque filter and a delivery cursor
//! - **Recipient lists**: Deduplicated fan-out targets for one matched event
//! - **Metrics**: Lock-light counters by protocol verb and event kind, rendered for scraping
//!
//! ## Example
//!
//! ```ignore
//! use relay_core::{ClientVerb, ConnId, MetricsConfig, MetricsRegistry, SubscriptionId,
//!     SubscriptionTable, TableConfig};
//!
//! let metrics = MetricsRegistry::install(MetricsConfig::default())?;
//! let table = SubscriptionTable::new(TableConfig::default());
//!
//! // ["REQ", "feed", ...]
//! metrics.record_client_message(ClientVerb::Req);
//! table.subscribe(ConnId(1), SubscriptionId::new("feed")?, |kind: &u64| *kind == 1, "")?;
//!
//! let recipients = table.recipients(&1u64);
//! ```

pub mod error;
pub mod metrics;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{IdError, RelayError, Result};
pub use metrics::{Counter, LabeledCounter, MetricsConfig, MetricsRegistry, MetricsSnapshot};
pub use subscriptions::{
    ConnIdSubId, Filter, RecipientList, Subscription, SubscriptionId, SubscriptionTable,
    TableConfig, MAX_SUBSCRIPTION_ID_LEN,
};
pub use types::*;
