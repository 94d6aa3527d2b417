//! Metrics for the relay's message-handling paths.
//!
//! Connection threads bump counters on every protocol message; a scrape
//! handler periodically renders them:
//! - [`Counter`]: a single relaxed atomic
//! - [`LabeledCounter`]: counters keyed by verb or kind, read-locked on the hot path
//! - [`MetricsRegistry`]: the three families the relay reports, plus rendering
//!
//! # Example
//!
//! ```ignore
//! let metrics = MetricsRegistry::install(MetricsConfig::default())?;
//!
//! metrics.record_client_message(ClientVerb::Req);
//! metrics.record_event_kind(1);
//!
//! // Served verbatim by the scrape endpoint
//! let body = metrics.render();
//! ```

mod counter;
mod registry;

pub use counter::{Counter, LabeledCounter};
pub use registry::{MetricsConfig, MetricsRegistry, MetricsSnapshot};
