//! Process-wide metrics registry and exposition rendering.

use crate::error::{RelayError, Result};
use crate::types::{ClientVerb, RelayVerb};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::sync::OnceLock;

use super::counter::LabeledCounter;

static GLOBAL: OnceLock<MetricsRegistry> = OnceLock::new();

/// Configuration for the metrics registry.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Prefix for every metric name.
    /// Default: "nostr"
    pub namespace: String,
}

impl MetricsConfig {
    /// Check that `namespace` can start a metric name: a letter, `_` or `:`
    /// followed by letters, digits, `_` or `:`.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.namespace.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_' || first == ':')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
            }
            None => false,
        };

        if valid {
            Ok(())
        } else {
            Err(RelayError::InvalidNamespace(self.namespace.clone()))
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "nostr".to_string(),
        }
    }
}

/// Static description of one rendered metric family.
struct Family {
    suffix: &'static str,
    help: &'static str,
    label_key: &'static str,
}

const CLIENT_MESSAGES: Family = Family {
    suffix: "client_messages_total",
    help: "Total number of Nostr client messages by verb",
    label_key: "verb",
};

const RELAY_MESSAGES: Family = Family {
    suffix: "relay_messages_total",
    help: "Total number of Nostr relay messages by verb",
    label_key: "verb",
};

const EVENTS_BY_KIND: Family = Family {
    suffix: "events_total",
    help: "Total number of Nostr events by kind",
    label_key: "kind",
};

/// Point-in-time copy of every counter family.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub client_messages: BTreeMap<String, u64>,
    pub relay_messages: BTreeMap<String, u64>,
    pub events_by_kind: BTreeMap<String, u64>,
}

/// Counters touched by the message-handling hot path.
///
/// Build one with [`MetricsRegistry::new`] and share it, or use
/// [`MetricsRegistry::install`]/[`MetricsRegistry::global`] for the single
/// process-wide instance.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    config: MetricsConfig,
    /// Messages from clients to the relay, by verb.
    client_messages: LabeledCounter,
    /// Messages from the relay to clients, by verb.
    relay_messages: LabeledCounter,
    /// Accepted events, by kind.
    events_by_kind: LabeledCounter,
}

impl MetricsRegistry {
    /// Build a registry, rejecting a namespace that would render invalid
    /// metric names.
    pub fn new(config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: MetricsConfig) -> Self {
        Self {
            config,
            client_messages: LabeledCounter::new(),
            relay_messages: LabeledCounter::new(),
            events_by_kind: LabeledCounter::new(),
        }
    }

    /// Install the process-wide registry.
    ///
    /// Fails if the namespace is invalid, or if a registry was already
    /// installed, either explicitly or by an earlier call to
    /// [`MetricsRegistry::global`].
    pub fn install(config: MetricsConfig) -> Result<&'static MetricsRegistry> {
        config.validate()?;
        let mut config = Some(config);
        let registry =
            GLOBAL.get_or_init(|| Self::with_valid_config(config.take().unwrap_or_default()));
        if config.is_some() {
            return Err(RelayError::MetricsAlreadyInstalled);
        }
        Ok(registry)
    }

    /// The process-wide registry, installed with defaults on first use if
    /// nobody called [`MetricsRegistry::install`].
    pub fn global() -> &'static MetricsRegistry {
        GLOBAL.get_or_init(MetricsRegistry::default)
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn client_messages(&self) -> &LabeledCounter {
        &self.client_messages
    }

    pub fn relay_messages(&self) -> &LabeledCounter {
        &self.relay_messages
    }

    pub fn events_by_kind(&self) -> &LabeledCounter {
        &self.events_by_kind
    }

    pub fn record_client_message(&self, verb: ClientVerb) {
        self.client_messages.inc(verb.as_str());
    }

    pub fn record_relay_message(&self, verb: RelayVerb) {
        self.relay_messages.inc(verb.as_str());
    }

    pub fn record_event_kind(&self, kind: u64) {
        self.events_by_kind.inc(&kind.to_string());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            client_messages: self.client_messages.get_all(),
            relay_messages: self.relay_messages.get_all(),
            events_by_kind: self.events_by_kind.get_all(),
        }
    }

    /// Render every family in the text exposition format.
    ///
    /// Always a full snapshot; labels come out in ascending order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_family(&mut out, &CLIENT_MESSAGES, &self.client_messages);
        self.render_family(&mut out, &RELAY_MESSAGES, &self.relay_messages);
        self.render_family(&mut out, &EVENTS_BY_KIND, &self.events_by_kind);
        out
    }

    fn render_family(&self, out: &mut String, family: &Family, counter: &LabeledCounter) {
        let name = format!("{}_{}", self.config.namespace, family.suffix);

        push_line(out, format_args!("# HELP {} {}", name, family.help));
        push_line(out, format_args!("# TYPE {} counter", name));
        for (label, count) in counter.get_all() {
            push_line(
                out,
                format_args!(
                    "{}{{{}=\"{}\"}} {}",
                    name,
                    family.label_key,
                    escape_label(&label),
                    count
                ),
            );
        }
    }
}

fn push_line(out: &mut String, line: fmt::Arguments<'_>) {
    // fmt::Write for String never returns an error.
    let _ = out.write_fmt(line);
    out.push('\n');
}

fn escape_label(value: &str) -> std::borrow::Cow<'_, str> {
    if !value.contains(|c| matches!(c, '\\' | '"' | '\n')) {
        return value.into();
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped.into()
}
