//! Unix timestamps as carried by payment authorizations.
//!
//! ERC-3009 authorizations encode `validAfter` / `validBefore` as seconds since
//! the Unix epoch. Clients send them either as JSON numbers or as decimal
//! strings; both forms are accepted and the string form is emitted.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::ops::Add;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Current wall-clock time. Clocks before the epoch read as zero.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(secs)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = UnixTimestamp;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(secs) => Ok(UnixTimestamp(secs)),
            Raw::Text(text) => text
                .parse::<u64>()
                .map(UnixTimestamp)
                .map_err(|_| de::Error::custom(format!("invalid unix timestamp {text:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_and_number() {
        let from_str: UnixTimestamp = serde_json::from_str("\"1700000000\"").unwrap();
        let from_num: UnixTimestamp = serde_json::from_str("1700000000").unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(from_str.as_secs(), 1_700_000_000);
    }

    #[test]
    fn test_deserialize_garbage() {
        assert!(serde_json::from_str::<UnixTimestamp>("\"soon\"").is_err());
        assert!(serde_json::from_str::<UnixTimestamp>("-5").is_err());
    }

    #[test]
    fn test_serialize_as_string() {
        let ts = UnixTimestamp::from_secs(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"42\"");
    }

    #[test]
    fn test_add_and_order() {
        let ts = UnixTimestamp::from_secs(10);
        assert!(ts + 6 > ts);
        assert_eq!((UnixTimestamp::from_secs(u64::MAX) + 1).as_secs(), u64::MAX);
        assert!(UnixTimestamp::now() > UnixTimestamp::from_secs(1_600_000_000));
    }
}
