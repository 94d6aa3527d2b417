//! Subscription table routing tests.

use relay_core::{
    ClientVerb, ConnId, ConnIdSubId, Cursor, MetricsRegistry, RelayError, RelayVerb,
    SubscriptionId, SubscriptionTable, TableConfig,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::thread;

/// Stand-in for a parsed event.
struct Event {
    id: u64,
    kind: u64,
    author: &'static str,
}

/// Stand-in for a filter group; the table never looks inside.
struct EventFilter {
    kinds: Vec<u64>,
    authors: Option<Vec<&'static str>>,
}

impl relay_core::Filter<Event> for EventFilter {
    fn matches(&self, event: &Event) -> bool {
        self.kinds.contains(&event.kind)
            && self
                .authors
                .as_ref()
                .map_or(true, |authors| authors.contains(&event.author))
    }
}

fn kinds(kinds: &[u64]) -> EventFilter {
    EventFilter {
        kinds: kinds.to_vec(),
        authors: None,
    }
}

fn sid(s: &str) -> SubscriptionId {
    SubscriptionId::new(s).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Log sink shared between the subscriber and the test body.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with debug logs captured, returning what was logged.
fn capture_logs(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

// --- Dispatch ---

#[test]
fn test_dispatch_flow() {
    init_tracing();
    let metrics = MetricsRegistry::default();
    let table = SubscriptionTable::new(TableConfig::default());

    metrics.record_client_message(ClientVerb::Req);
    table
        .subscribe(ConnId(1), sid("notes"), kinds(&[1]), "198.51.100.4")
        .unwrap();
    metrics.record_client_message(ClientVerb::Req);
    table
        .subscribe(
            ConnId(2),
            sid("alice"),
            EventFilter {
                kinds: vec![1],
                authors: Some(vec!["alice"]),
            },
            "198.51.100.9",
        )
        .unwrap();

    let event = Event {
        id: 99,
        kind: 1,
        author: "bob",
    };
    metrics.record_client_message(ClientVerb::Event);
    metrics.record_event_kind(event.kind);

    let recipients = table.recipients(&event);
    assert_eq!(recipients.len(), 1);
    for recipient in &recipients {
        metrics.record_relay_message(RelayVerb::Event);
        assert!(table.advance_cursor(recipient, Cursor(event.id)));
    }

    let key = ConnIdSubId {
        conn_id: ConnId(1),
        sub_id: sid("notes"),
    };
    assert_eq!(table.cursor(&key).and_then(Cursor::get), Some(99));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.client_messages["REQ"], 2);
    assert_eq!(snapshot.relay_messages["EVENT"], 1);
    assert_eq!(snapshot.events_by_kind["1"], 1);
}

#[test]
fn test_invalid_id_never_reaches_table() {
    let table: SubscriptionTable<EventFilter> = SubscriptionTable::default();

    let result: relay_core::Result<()> = "bad\"id"
        .parse::<SubscriptionId>()
        .and_then(|id| table.subscribe(ConnId(1), id, kinds(&[1]), ""));

    assert!(matches!(result, Err(RelayError::InvalidIdentifier(_))));
    assert_eq!(table.subscription_count(), 0);
}

// --- Logging ---

#[test]
fn test_closing_idle_connection_logs_nothing() {
    let table: SubscriptionTable<EventFilter> = SubscriptionTable::default();

    let logs = capture_logs(|| {
        assert_eq!(table.close_connection(ConnId(42)), 0);
    });
    assert!(!logs.contains("closed connection"), "unexpected log: {logs}");

    table.subscribe(ConnId(42), sid("a"), kinds(&[1]), "").unwrap();
    let logs = capture_logs(|| {
        assert_eq!(table.close_connection(ConnId(42)), 1);
    });
    assert!(logs.contains("closed connection"));
}

// --- Concurrency ---

#[test]
fn test_concurrent_subscribe_and_match() {
    init_tracing();
    let table = Arc::new(SubscriptionTable::new(TableConfig {
        max_subscriptions_per_connection: 100,
    }));

    let writers: Vec<_> = (0..8u64)
        .map(|conn| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = sid(&format!("sub-{i}"));
                    table.subscribe(ConnId(conn), id, kinds(&[1]), "").unwrap();
                    // Matching while others are still subscribing must never
                    // see a duplicate entry
                    let list = table.recipients(&Event {
                        id: i,
                        kind: 1,
                        author: "x",
                    });
                    let unique: HashSet<_> = list.iter().collect();
                    assert_eq!(unique.len(), list.len());
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    let list = table.recipients(&Event {
        id: 0,
        kind: 1,
        author: "x",
    });
    assert_eq!(list.len(), 400);
    assert_eq!(list.connections().len(), 8);

    for conn in 0..8 {
        assert_eq!(table.close_connection(ConnId(conn)), 50);
    }
    assert_eq!(table.subscription_count(), 0);
}
