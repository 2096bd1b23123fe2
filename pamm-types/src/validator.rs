use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    HARMONIC_SOFTWARE_CLIENT_ID, JITO_SOFTWARE_CLIENT, JITO_SOFTWARE_CLIENT_ID,
};

/// Slot and event totals of one validator over the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorStats {
    pub validator: String,
    pub unique_slots: u64,
    pub total_events: u64,
}

/// A validator's position in the slot ranking (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedValidator {
    pub rank: usize,
    pub validator: String,
    pub unique_slots: u64,
    pub total_events: u64,
}

/// Validator client software family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClientType {
    JitoSolana,
    Harmonic,
    Other,
}

impl ClientType {
    /// All client types in report order.
    pub const ALL: [ClientType; 3] = [Self::JitoSolana, Self::Harmonic, Self::Other];

    /// The two client types compared by the efficiency analysis.
    pub const COMPARED: [ClientType; 2] = [Self::JitoSolana, Self::Harmonic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JitoSolana => "Jito-solana",
            Self::Harmonic => "Harmonic",
            Self::Other => "Other",
        }
    }

    /// Parse a report group name (`Jito-solana`, `Harmonic`, `Other`).
    pub fn from_group_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Classify validators.app client fields.
    ///
    /// Harmonic nodes report an `Unknown` (or absent) client name with id 10.
    pub fn classify(software_client: Option<&str>, software_client_id: Option<i64>) -> Self {
        match (software_client, software_client_id) {
            (Some(JITO_SOFTWARE_CLIENT), Some(JITO_SOFTWARE_CLIENT_ID)) => Self::JitoSolana,
            (None | Some("Unknown"), Some(HARMONIC_SOFTWARE_CLIENT_ID)) => Self::Harmonic,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a validators.app record used by the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorMetadata {
    pub validator_id: String,
    pub software_client: Option<String>,
    pub software_client_id: Option<i64>,
    pub name: Option<String>,
    pub vote_account: Option<String>,
    pub unique_slots: Option<u64>,
    pub total_events: Option<u64>,
}

impl ValidatorMetadata {
    /// Extract the known fields from a raw validators.app JSON document.
    pub fn from_json(validator_id: &str, value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let count = |primary: &str, fallback: &str| {
            match value.get(primary).and_then(as_count) {
                Some(n) if n > 0 => Some(n),
                _ => value.get(fallback).and_then(as_count),
            }
        };
        Self {
            validator_id: validator_id.to_string(),
            software_client: text("software_client"),
            software_client_id: value.get("software_client_id").and_then(Value::as_i64),
            name: text("name"),
            vote_account: text("vote_account"),
            unique_slots: count("unique_slots", "slots"),
            total_events: count("total_events", "events"),
        }
    }

    pub fn client_type(&self) -> ClientType {
        ClientType::classify(self.software_client.as_deref(), self.software_client_id)
    }
}

fn as_count(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .or_else(|| v.as_str().and_then(|s| s.replace(',', "").trim().parse().ok()))
}

/// Result of fetching (or reading back) one validator's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub validator_id: String,
    pub software_client: Option<String>,
    pub software_client_id: Option<i64>,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn from_metadata(meta: &ValidatorMetadata) -> Self {
        Self {
            validator_id: meta.validator_id.clone(),
            software_client: meta.software_client.clone(),
            software_client_id: meta.software_client_id,
            error: None,
        }
    }

    pub fn failed(validator_id: &str, error: impl Into<String>) -> Self {
        Self {
            validator_id: validator_id.to_string(),
            software_client: None,
            software_client_id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Validator → client type assignment read from a client group report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMapping {
    assignments: BTreeMap<String, ClientType>,
}

impl ClientMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a validator to a client type. A later assignment replaces an earlier one.
    pub fn assign(&mut self, validator: impl Into<String>, client: ClientType) {
        self.assignments.insert(validator.into(), client);
    }

    pub fn get(&self, validator: &str) -> Option<ClientType> {
        self.assignments.get(validator).copied()
    }

    pub fn contains(&self, validator: &str) -> bool {
        self.assignments.contains_key(validator)
    }

    /// Number of validators assigned to `client`.
    pub fn count(&self, client: ClientType) -> usize {
        self.assignments.values().filter(|c| **c == client).count()
    }

    pub fn validators(&self, client: ClientType) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|(_, c)| **c == client)
            .map(|(v, _)| v.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Keep only the given client types.
    pub fn restrict_to(&self, clients: &[ClientType]) -> Self {
        Self {
            assignments: self
                .assignments
                .iter()
                .filter(|(_, c)| clients.contains(c))
                .map(|(v, c)| (v.clone(), *c))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ClientType)> {
        self.assignments.iter().map(|(v, c)| (v.as_str(), *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_jito() {
        assert_eq!(
            ClientType::classify(Some("JitoLabs"), Some(1)),
            ClientType::JitoSolana
        );
        // Same vendor with another client id is not Jito-solana.
        assert_eq!(ClientType::classify(Some("JitoLabs"), Some(3)), ClientType::Other);
    }

    #[test]
    fn test_classify_harmonic() {
        assert_eq!(ClientType::classify(Some("Unknown"), Some(10)), ClientType::Harmonic);
        assert_eq!(ClientType::classify(None, Some(10)), ClientType::Harmonic);
        assert_eq!(ClientType::classify(Some("Firedancer"), Some(10)), ClientType::Other);
    }

    #[test]
    fn test_classify_missing_fields() {
        assert_eq!(ClientType::classify(None, None), ClientType::Other);
    }

    #[test]
    fn test_group_name_roundtrip() {
        for client in ClientType::ALL {
            assert_eq!(ClientType::from_group_name(client.as_str()), Some(client));
        }
        assert_eq!(ClientType::from_group_name("agave"), None);
    }

    #[test]
    fn test_metadata_from_json() {
        let doc = json!({
            "name": "Helius",
            "software_client": "JitoLabs",
            "software_client_id": 1,
            "vote_account": "he1iusunGwqrNtafDtLdhsUQDFvo13z9sUa36PauBtk",
            "slots": 3778
        });
        let meta = ValidatorMetadata::from_json("HEL1USMZKAL2odpNBj2oCjffnFGaYwmbGmyewGv1e2TU", &doc);
        assert_eq!(meta.name.as_deref(), Some("Helius"));
        assert_eq!(meta.software_client_id, Some(1));
        assert_eq!(meta.unique_slots, Some(3778));
        assert_eq!(meta.total_events, None);
        assert_eq!(meta.client_type(), ClientType::JitoSolana);
    }

    #[test]
    fn test_metadata_prefers_unique_slots_and_parses_counts() {
        let doc = json!({
            "unique_slots": 12,
            "slots": 99,
            "software_client_id": 10,
            "events": "1,234"
        });
        let meta = ValidatorMetadata::from_json("v", &doc);
        assert_eq!(meta.unique_slots, Some(12));
        assert_eq!(meta.total_events, Some(1234));
        assert_eq!(meta.client_type(), ClientType::Harmonic);
    }

    #[test]
    fn test_metadata_zero_count_falls_back() {
        let doc = json!({
            "unique_slots": 0,
            "slots": 42,
            "total_events": null,
            "events": 0
        });
        let meta = ValidatorMetadata::from_json("v", &doc);
        assert_eq!(meta.unique_slots, Some(42));
        assert_eq!(meta.total_events, Some(0));
    }

    #[test]
    fn test_metadata_string_client_id_is_not_coerced() {
        let doc = json!({"software_client": "JitoLabs", "software_client_id": "1"});
        let meta = ValidatorMetadata::from_json("v", &doc);
        assert_eq!(meta.software_client_id, None);
        assert_eq!(meta.client_type(), ClientType::Other);
    }

    #[test]
    fn test_client_mapping_counts() {
        let mut mapping = ClientMapping::new();
        mapping.assign("a", ClientType::JitoSolana);
        mapping.assign("b", ClientType::JitoSolana);
        mapping.assign("c", ClientType::Harmonic);
        mapping.assign("d", ClientType::Other);
        assert_eq!(mapping.count(ClientType::JitoSolana), 2);
        assert_eq!(mapping.count(ClientType::Harmonic), 1);
        assert_eq!(mapping.validators(ClientType::JitoSolana), vec!["a", "b"]);

        let compared = mapping.restrict_to(&ClientType::COMPARED);
        assert_eq!(compared.len(), 3);
        assert!(!compared.contains("d"));
    }

    #[test]
    fn test_fetch_outcome_constructors() {
        let failed = FetchOutcome::failed("v", "timeout");
        assert!(!failed.is_ok());
        let meta = ValidatorMetadata {
            validator_id: "v".to_string(),
            software_client: Some("JitoLabs".to_string()),
            software_client_id: Some(1),
            ..Default::default()
        };
        let ok = FetchOutcome::from_metadata(&meta);
        assert!(ok.is_ok());
        assert_eq!(ok.software_client_id, Some(1));
    }
}
