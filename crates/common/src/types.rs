use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One comparable score type for both resolver paths. `Decimal` holds any
/// realistic on-chain reputation integer exactly (96-bit mantissa) and the
/// model's fractional [0, 100] scores, so ranking never goes through f64.
pub type Score = Decimal;

pub const MIN_MESSAGE_CHARS: usize = 3;
pub const MAX_MESSAGE_CHARS: usize = 280;

/// A 20-byte contract account identifier: `0x` + 40 hex chars.
///
/// Hex addresses are case-insensitive on chain, so the constructor
/// normalizes to lowercase — two casings of one address aggregate as a
/// single helper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 40 hex characters, got {0}")]
    BadLength(usize),
    #[error("address contains non-hex character {0:?}")]
    NonHex(char),
}

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form for tables: first 6 and last 4 characters.
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        if hex.len() != 40 {
            return Err(AddressError::BadLength(hex.len()));
        }
        if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::NonHex(c));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One on-chain act of kindness. Produced by a record source per pipeline
/// run, never mutated, never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRecord {
    pub helper: Address,
    pub recipient: Address,
    pub message: String,
    /// Seconds since epoch. Absent for record sources that carry no chain
    /// timestamps (the sample set).
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// A helper paired with its resolved reputation score. Fully recomputed on
/// every pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub address: Address,
    pub score: Score,
}

/// Observable states of a `giveHelp` submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    PendingSignature,
    Confirming,
    Confirmed,
    Failed { reason: String },
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parses_and_normalizes_case() {
        let a: Address = "0xAbCd5a4e9B27c3F1d8026f54e8c9a0b13d7e6F2a"
            .parse()
            .unwrap();
        assert_eq!(a.as_str(), "0xabcd5a4e9b27c3f1d8026f54e8c9a0b13d7e6f2a");
    }

    #[test]
    fn test_differently_cased_addresses_are_equal() {
        let lower: Address = "0x5a4e9b27c3f1d8026f54e8c9a0b13d7e6f2a8c41"
            .parse()
            .unwrap();
        let upper: Address = "0x5A4E9B27C3F1D8026F54E8C9A0B13D7E6F2A8C41"
            .parse()
            .unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_address_rejects_garbage() {
        assert_eq!("0xZZZ".parse::<Address>(), Err(AddressError::BadLength(3)));
        assert_eq!(
            "5a4e9b27c3f1d8026f54e8c9a0b13d7e6f2a8c41".parse::<Address>(),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!(
            "0xga4e9b27c3f1d8026f54e8c9a0b13d7e6f2a8c41".parse::<Address>(),
            Err(AddressError::NonHex('g'))
        );
    }

    #[test]
    fn test_address_short_form() {
        let a: Address = "0x5a4e9b27c3f1d8026f54e8c9a0b13d7e6f2a8c41"
            .parse()
            .unwrap();
        assert_eq!(a.short(), "0x5a4e...8c41");
    }

    #[test]
    fn test_help_record_parses_without_timestamp() {
        let json = r#"{
            "helper": "0x5a4e9b27c3f1d8026f54e8c9a0b13d7e6f2a8c41",
            "recipient": "0x8c41f2a6e7d05b39a1c84e6f20d9b75c3e18a042",
            "message": "Provided guidance on smart contract deployment."
        }"#;
        let record: HelpRecord = serde_json::from_str(json).unwrap();
        assert!(record.timestamp.is_none());
        assert_eq!(record.helper.short(), "0x5a4e...8c41");
    }

    #[test]
    fn test_submission_status_terminality() {
        assert!(!SubmissionStatus::PendingSignature.is_terminal());
        assert!(!SubmissionStatus::Confirming.is_terminal());
        assert!(SubmissionStatus::Confirmed.is_terminal());
        assert!(SubmissionStatus::Failed {
            reason: "reverted".to_string()
        }
        .is_terminal());
    }
}
