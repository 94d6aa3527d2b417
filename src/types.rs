//! Core types shared by the subscription and metrics layers.

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a client connection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnId(pub u64);

impl fmt::Debug for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnId({})", self.0)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of the latest event delivered to a subscription.
///
/// `u64::MAX` is reserved to mean nothing has been delivered yet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(pub u64);

impl Cursor {
    /// No event delivered yet.
    pub const NONE: Cursor = Cursor(u64::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// The delivered event id, if any.
    pub fn get(self) -> Option<u64> {
        if self.is_none() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(id) => write!(f, "Cursor({})", id),
            None => write!(f, "Cursor(none)"),
        }
    }
}

/// Messages a client sends to the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientVerb {
    Event,
    Req,
    Close,
    Auth,
    Count,
}

impl ClientVerb {
    pub const ALL: [ClientVerb; 5] = [
        ClientVerb::Event,
        ClientVerb::Req,
        ClientVerb::Close,
        ClientVerb::Auth,
        ClientVerb::Count,
    ];

    /// Wire spelling of the verb.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientVerb::Event => "EVENT",
            ClientVerb::Req => "REQ",
            ClientVerb::Close => "CLOSE",
            ClientVerb::Auth => "AUTH",
            ClientVerb::Count => "COUNT",
        }
    }
}

impl fmt::Display for ClientVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientVerb {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| RelayError::UnknownVerb(s.to_string()))
    }
}

/// Messages the relay sends to a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelayVerb {
    Event,
    Ok,
    Eose,
    Closed,
    Notice,
    Auth,
    Count,
}

impl RelayVerb {
    pub const ALL: [RelayVerb; 7] = [
        RelayVerb::Event,
        RelayVerb::Ok,
        RelayVerb::Eose,
        RelayVerb::Closed,
        RelayVerb::Notice,
        RelayVerb::Auth,
        RelayVerb::Count,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelayVerb::Event => "EVENT",
            RelayVerb::Ok => "OK",
            RelayVerb::Eose => "EOSE",
            RelayVerb::Closed => "CLOSED",
            RelayVerb::Notice => "NOTICE",
            RelayVerb::Auth => "AUTH",
            RelayVerb::Count => "COUNT",
        }
    }
}

impl fmt::Display for RelayVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelayVerb {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| RelayError::UnknownVerb(s.to_string()))
    }
}
