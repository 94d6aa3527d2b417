//! Routing table mapping live subscriptions to connections.

use crate::error::{RelayError, Result};
use crate::types::{ConnId, Cursor};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::id::SubscriptionId;
use super::types::{ConnIdSubId, Filter, RecipientList, Subscription};

/// Default cap on concurrent subscriptions per connection.
const DEFAULT_MAX_SUBSCRIPTIONS_PER_CONNECTION: usize = 20;

/// Configuration for a subscription table.
#[derive(Clone, Debug)]
pub struct TableConfig {
    /// Max live subscriptions a single connection may hold.
    /// Default: 20
    pub max_subscriptions_per_connection: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_subscriptions_per_connection: DEFAULT_MAX_SUBSCRIPTIONS_PER_CONNECTION,
        }
    }
}

type ConnSubscriptions<F> = HashMap<SubscriptionId, Subscription<F>>;

/// Owns every live subscription and answers "who wants this event".
///
/// Matching runs under a shared lock; subscribe, unsubscribe, connection
/// close and cursor updates take the exclusive lock.
pub struct SubscriptionTable<F> {
    config: TableConfig,
    connections: RwLock<HashMap<ConnId, ConnSubscriptions<F>>>,
}

impl<F> SubscriptionTable<F> {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Register a subscription.
    ///
    /// Re-using an id already open on the same connection replaces that
    /// subscription, resetting its cursor.
    pub fn subscribe(
        &self,
        conn_id: ConnId,
        sub_id: SubscriptionId,
        filter: F,
        origin: impl Into<String>,
    ) -> Result<()> {
        let limit = self.config.max_subscriptions_per_connection;
        let mut connections = self.connections.write();
        let subs = connections.entry(conn_id).or_default();

        if !subs.contains_key(&sub_id) && subs.len() >= limit {
            warn!(conn = %conn_id, sub = %sub_id, limit, "subscription limit reached");
            if subs.is_empty() {
                connections.remove(&conn_id);
            }
            return Err(RelayError::TooManySubscriptions {
                conn: conn_id,
                limit,
            });
        }

        let subscription = Subscription::new(conn_id, sub_id, filter, origin);
        if subs.insert(sub_id, subscription).is_some() {
            debug!(conn = %conn_id, sub = %sub_id, "replaced subscription");
        } else {
            debug!(conn = %conn_id, sub = %sub_id, "created subscription");
        }
        Ok(())
    }

    /// Remove one subscription. Returns false if it was not live.
    pub fn unsubscribe(&self, conn_id: ConnId, sub_id: &SubscriptionId) -> bool {
        let mut connections = self.connections.write();
        let Some(subs) = connections.get_mut(&conn_id) else {
            return false;
        };

        let removed = subs.remove(sub_id).is_some();
        if subs.is_empty() {
            connections.remove(&conn_id);
        }
        if removed {
            debug!(conn = %conn_id, sub = %sub_id, "removed subscription");
        }
        removed
    }

    /// Drop every subscription held by a connection, returning how many.
    pub fn close_connection(&self, conn_id: ConnId) -> usize {
        let removed = self
            .connections
            .write()
            .remove(&conn_id)
            .map_or(0, |subs| subs.len());
        if removed > 0 {
            debug!(conn = %conn_id, removed, "closed connection");
        }
        removed
    }

    /// Collect every live subscription whose filter accepts `event`.
    pub fn recipients<E: ?Sized>(&self, event: &E) -> RecipientList
    where
        F: Filter<E>,
    {
        let connections = self.connections.read();
        let mut list = RecipientList::new();
        for subs in connections.values() {
            for sub in subs.values() {
                if sub.filter().matches(event) {
                    list.insert(sub.key());
                }
            }
        }
        list
    }

    /// Record that `cursor` was delivered to a subscription.
    ///
    /// Returns false when the subscription closed in the meantime; delivery
    /// to a closing connection is best effort.
    pub fn advance_cursor(&self, key: &ConnIdSubId, cursor: Cursor) -> bool {
        let mut connections = self.connections.write();
        match connections
            .get_mut(&key.conn_id)
            .and_then(|subs| subs.get_mut(&key.sub_id))
        {
            Some(sub) => {
                sub.set_cursor(cursor);
                true
            }
            None => false,
        }
    }

    pub fn cursor(&self, key: &ConnIdSubId) -> Option<Cursor> {
        self.connections
            .read()
            .get(&key.conn_id)
            .and_then(|subs| subs.get(&key.sub_id))
            .map(|sub| sub.cursor())
    }

    /// Total live subscriptions across all connections.
    pub fn subscription_count(&self) -> usize {
        self.connections.read().values().map(|subs| subs.len()).sum()
    }

    /// Connections holding at least one subscription.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }
}

impl<F> Default for SubscriptionTable<F> {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
