//! Fixed-capacity subscription identifiers.

use crate::error::{IdError, RelayError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Longest identifier a client may use, in bytes.
///
/// Must fit in the one-byte length prefix and has to agree with the
/// protocol parser that first accepts the raw id.
pub const MAX_SUBSCRIPTION_ID_LEN: usize = 64;

const _: () = assert!(MAX_SUBSCRIPTION_ID_LEN >= 1 && MAX_SUBSCRIPTION_ID_LEN <= u8::MAX as usize);

/// Client-chosen name of a subscription, stored inline.
///
/// Only printable ASCII is accepted, minus `\` and `"`, so the content can
/// be echoed into JSON or the metrics exposition format without escaping.
/// Comparison and hashing only look at the first `len` bytes.
#[derive(Clone, Copy)]
pub struct SubscriptionId {
    len: u8,
    buf: [u8; MAX_SUBSCRIPTION_ID_LEN],
}

fn is_allowed(byte: u8) -> bool {
    (0x20..0x7F).contains(&byte) && byte != b'\\' && byte != b'"'
}

impl SubscriptionId {
    /// Validate `raw` and copy it into a new identifier.
    pub fn new(raw: impl AsRef<[u8]>) -> Result<Self, IdError> {
        let raw = raw.as_ref();

        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if raw.len() > MAX_SUBSCRIPTION_ID_LEN {
            return Err(IdError::TooLong {
                len: raw.len(),
                max: MAX_SUBSCRIPTION_ID_LEN,
            });
        }
        if let Some(position) = raw.iter().position(|&b| !is_allowed(b)) {
            return Err(IdError::InvalidByte {
                byte: raw[position],
                position,
            });
        }

        let mut buf = [0u8; MAX_SUBSCRIPTION_ID_LEN];
        buf[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            len: raw.len() as u8,
            buf,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Never true for a constructed id.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for SubscriptionId {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SubscriptionId {}

impl Hash for SubscriptionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialOrd for SubscriptionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubscriptionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({:?})", self.as_str())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for SubscriptionId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::ops::Deref for SubscriptionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl FromStr for SubscriptionId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s)?)
    }
}

impl TryFrom<&str> for SubscriptionId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for SubscriptionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
