use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_PROTOCOL;
use crate::error::PammError;

/// Kind of a recorded AMM update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// Price/state update unrelated to a trade.
    Oracle,
    /// Swap executed against the pool.
    Trade,
    /// Any other label found in the dataset, kept verbatim.
    Other(String),
}

impl EventKind {
    /// Parse a dataset label. `ORACLE` and `TRADE` match case-insensitively.
    pub fn parse(label: &str) -> Result<Self, PammError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(PammError::InvalidEventKind(label.to_string()));
        }
        if trimmed.eq_ignore_ascii_case("ORACLE") {
            Ok(Self::Oracle)
        } else if trimmed.eq_ignore_ascii_case("TRADE") {
            Ok(Self::Trade)
        } else {
            Ok(Self::Other(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Oracle => "ORACLE",
            Self::Trade => "TRADE",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the PropAMM dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmEvent {
    pub slot: u64,
    /// Unix seconds.
    pub time: i64,
    /// Base58 identity of the slot leader.
    pub validator: String,
    /// Protocol that emitted the update, when known.
    pub amm: Option<String>,
    pub kind: EventKind,
}

impl AmmEvent {
    /// Protocol name, or `Unknown` when the row carries none.
    pub fn protocol_label(&self) -> &str {
        self.amm.as_deref().unwrap_or(UNKNOWN_PROTOCOL)
    }

    pub fn datetime(&self) -> Result<DateTime<Utc>, PammError> {
        DateTime::from_timestamp(self.time, 0).ok_or(PammError::TimestampOutOfRange(self.time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(amm: Option<&str>) -> AmmEvent {
        AmmEvent {
            slot: 391_900_000,
            time: 1_767_802_800,
            validator: "HEL1USMZKAL2odpNBj2oCjffnFGaYwmbGmyewGv1e2TU".to_string(),
            amm: amm.map(str::to_string),
            kind: EventKind::Trade,
        }
    }

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(EventKind::parse("ORACLE").unwrap(), EventKind::Oracle);
        assert_eq!(EventKind::parse("trade").unwrap(), EventKind::Trade);
        assert_eq!(EventKind::parse(" Oracle ").unwrap(), EventKind::Oracle);
    }

    #[test]
    fn test_parse_other_kind_is_kept() {
        let kind = EventKind::parse("LIQUIDITY").unwrap();
        assert_eq!(kind, EventKind::Other("LIQUIDITY".to_string()));
        assert_eq!(kind.as_str(), "LIQUIDITY");
    }

    #[test]
    fn test_parse_empty_kind_fails() {
        assert!(EventKind::parse("  ").is_err());
    }

    #[test]
    fn test_protocol_label() {
        assert_eq!(event(Some("HumidiFi")).protocol_label(), "HumidiFi");
        assert_eq!(event(None).protocol_label(), "Unknown");
    }

    #[test]
    fn test_datetime() {
        let dt = event(None).datetime().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2026-01-07 16:20");
    }
}
