//! Subscription identity and routing.
//!
//! This module provides what the relay needs to route events to clients:
//! - Validated, fixed-capacity subscription ids
//! - Subscription records with an opaque filter and a delivery cursor
//! - Recipient lists for fanning one event out to many subscribers
//! - A routing table that owns live subscriptions
//!
//! # Example
//!
//! ```ignore
//! let table = SubscriptionTable::new(TableConfig::default());
//!
//! // Client sent ["REQ", "feed", {"kinds": [1]}]
//! let sub_id = SubscriptionId::new("feed")?;
//! table.subscribe(ConnId(1), sub_id, |kind: &u64| *kind == 1, "203.0.113.7")?;
//!
//! // An event of kind 1 arrives
//! for recipient in &table.recipients(&1u64) {
//!     println!("deliver to {} / {}", recipient.conn_id, recipient.sub_id);
//! }
//! ```

mod id;
mod table;
mod types;

pub use id::{SubscriptionId, MAX_SUBSCRIPTION_ID_LEN};
pub use table::{SubscriptionTable, TableConfig};
pub use types::{ConnIdSubId, Filter, RecipientList, Subscription};
