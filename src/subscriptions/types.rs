//! Subscription records and fan-out addressing.

use crate::types::{ConnId, Cursor};
use std::collections::HashSet;

use super::id::SubscriptionId;

/// Opaque predicate deciding whether a subscription wants an event.
///
/// The relay core stores and forwards filters but never looks inside them.
pub trait Filter<E: ?Sized> {
    fn matches(&self, event: &E) -> bool;
}

impl<E: ?Sized, F> Filter<E> for F
where
    F: Fn(&E) -> bool,
{
    fn matches(&self, event: &E) -> bool {
        self(event)
    }
}

/// A live registration on one connection.
///
/// Carries no locking of its own: whoever owns it (normally a
/// [`SubscriptionTable`](super::SubscriptionTable)) serializes access.
#[derive(Debug)]
pub struct Subscription<F> {
    conn_id: ConnId,
    sub_id: SubscriptionId,
    filter: F,
    /// Remote address of the connection, informational only.
    origin: String,
    /// Latest event delivered to this subscription.
    cursor: Cursor,
}

impl<F> Subscription<F> {
    pub fn new(conn_id: ConnId, sub_id: SubscriptionId, filter: F, origin: impl Into<String>) -> Self {
        Self {
            conn_id,
            sub_id,
            filter,
            origin: origin.into(),
            cursor: Cursor::NONE,
        }
    }

    pub fn conn_id(&self) -> ConnId {
        self.conn_id
    }

    pub fn sub_id(&self) -> &SubscriptionId {
        &self.sub_id
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Routing key of this subscription.
    pub fn key(&self) -> ConnIdSubId {
        ConnIdSubId {
            conn_id: self.conn_id,
            sub_id: self.sub_id,
        }
    }
}

/// One live interest: a subscription on a given connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnIdSubId {
    pub conn_id: ConnId,
    pub sub_id: SubscriptionId,
}

/// Everyone a single matched event must be delivered to.
///
/// Holds at most one entry per subscription, in no particular order.
#[derive(Clone, Debug, Default)]
pub struct RecipientList {
    entries: HashSet<ConnIdSubId>,
}

impl RecipientList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashSet::with_capacity(capacity),
        }
    }

    /// Add a recipient. Returns false if it was already present.
    pub fn insert(&mut self, recipient: ConnIdSubId) -> bool {
        self.entries.insert(recipient)
    }

    pub fn contains(&self, recipient: &ConnIdSubId) -> bool {
        self.entries.contains(recipient)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, ConnIdSubId> {
        self.entries.iter()
    }

    /// Distinct connections that have at least one recipient entry, sorted.
    pub fn connections(&self) -> Vec<ConnId> {
        let mut conns: Vec<ConnId> = self.entries.iter().map(|r| r.conn_id).collect();
        conns.sort_unstable();
        conns.dedup();
        conns
    }
}

impl FromIterator<ConnIdSubId> for RecipientList {
    fn from_iter<I: IntoIterator<Item = ConnIdSubId>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecipientList {
    type Item = ConnIdSubId;
    type IntoIter = std::collections::hash_set::IntoIter<ConnIdSubId>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a ConnIdSubId;
    type IntoIter = std::collections::hash_set::Iter<'a, ConnIdSubId>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(conn: u64, sub: &str) -> ConnIdSubId {
        ConnIdSubId {
            conn_id: ConnId(conn),
            sub_id: SubscriptionId::new(sub).unwrap(),
        }
    }

    #[test]
    fn test_new_subscription_has_no_cursor() {
        let sub = Subscription::new(ConnId(7), SubscriptionId::new("feed").unwrap(), (), "10.0.0.1");
        assert!(sub.cursor().is_none());
        assert_eq!(sub.origin(), "10.0.0.1");
        assert_eq!(sub.key(), recipient(7, "feed"));
    }

    #[test]
    fn test_set_cursor() {
        let mut sub = Subscription::new(ConnId(1), SubscriptionId::new("a").unwrap(), (), "");
        sub.set_cursor(Cursor(42));
        assert_eq!(sub.cursor().get(), Some(42));
    }

    #[test]
    fn test_closure_filter() {
        let sub = Subscription::new(
            ConnId(1),
            SubscriptionId::new("kinds").unwrap(),
            |kind: &u64| *kind == 1,
            "",
        );
        assert!(sub.filter().matches(&1u64));
        assert!(!sub.filter().matches(&7u64));
    }

    #[test]
    fn test_recipient_list_dedup() {
        let mut list = RecipientList::new();
        assert!(list.insert(recipient(1, "a")));
        assert!(list.insert(recipient(1, "b")));
        assert!(list.insert(recipient(2, "a")));
        assert!(!list.insert(recipient(1, "a")));

        assert_eq!(list.len(), 3);
        assert!(list.contains(&recipient(2, "a")));
        assert_eq!(list.connections(), vec![ConnId(1), ConnId(2)]);
    }

    #[test]
    fn test_recipient_list_from_iter() {
        let list: RecipientList = vec![recipient(1, "x"), recipient(1, "x"), recipient(3, "y")]
            .into_iter()
            .collect();
        assert_eq!(list.len(), 2);
        assert_eq!(list.into_iter().count(), 2);
    }

    #[test]
    fn test_recipient_list_iterates_each_entry_once() {
        let mut list = RecipientList::with_capacity(4);
        for _ in 0..3 {
            list.insert(recipient(1, "a"));
            list.insert(recipient(2, "b"));
        }

        let mut seen: Vec<_> = list.iter().map(|r| (r.conn_id, r.sub_id.to_string())).collect();
        seen.sort();
        assert_eq!(
            seen,
            vec![(ConnId(1), "a".to_string()), (ConnId(2), "b".to_string())]
        );
        assert_eq!((&list).into_iter().count(), list.len());
    }
}
