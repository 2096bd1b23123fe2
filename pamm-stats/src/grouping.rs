use std::collections::{BTreeMap, HashMap};

use pamm_types::{ClientType, RankedValidator, ValidatorMetadata};
use serde::Serialize;

/// One validator in a client group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub validator_id: String,
    pub name: Option<String>,
    pub slots: Option<u64>,
    pub events: Option<u64>,
}

/// Cached metadata file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupError {
    pub path: String,
    pub error: String,
}

/// Top validators of each client type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientGroups {
    pub limit: usize,
    pub groups: BTreeMap<ClientType, Vec<GroupEntry>>,
    /// Records seen per client type before truncation.
    pub totals: BTreeMap<ClientType, usize>,
    pub errors: Vec<GroupError>,
}

impl ClientGroups {
    /// Classify metadata records and keep the top `limit` of each client type.
    ///
    /// Slot and event counts are taken from `ranking` when the validator
    /// appears there, otherwise from the metadata record itself. Ordering is
    /// slots desc, events desc, validator id asc, with missing counts as 0.
    pub fn build(
        records: &[ValidatorMetadata],
        ranking: Option<&[RankedValidator]>,
        errors: Vec<GroupError>,
        limit: usize,
    ) -> Self {
        let ranked: HashMap<&str, &RankedValidator> = ranking
            .unwrap_or_default()
            .iter()
            .map(|r| (r.validator.as_str(), r))
            .collect();

        let mut groups: BTreeMap<ClientType, Vec<GroupEntry>> =
            ClientType::ALL.into_iter().map(|c| (c, Vec::new())).collect();
        for record in records {
            let (slots, events) = match ranked.get(record.validator_id.as_str()) {
                Some(r) => (Some(r.unique_slots), Some(r.total_events)),
                None => (record.unique_slots, record.total_events),
            };
            groups.entry(record.client_type()).or_default().push(GroupEntry {
                validator_id: record.validator_id.clone(),
                name: record.name.clone(),
                slots,
                events,
            });
        }

        let mut totals = BTreeMap::new();
        for (client, entries) in groups.iter_mut() {
            totals.insert(*client, entries.len());
            entries.sort_by(|a, b| {
                b.slots
                    .unwrap_or(0)
                    .cmp(&a.slots.unwrap_or(0))
                    .then(b.events.unwrap_or(0).cmp(&a.events.unwrap_or(0)))
                    .then_with(|| a.validator_id.cmp(&b.validator_id))
            });
            entries.truncate(limit);
        }

        tracing::info!(
            records = records.len(),
            errors = errors.len(),
            jito = totals.get(&ClientType::JitoSolana).copied().unwrap_or(0),
            harmonic = totals.get(&ClientType::Harmonic).copied().unwrap_or(0),
            "grouped validators by client"
        );

        Self {
            limit,
            groups,
            totals,
            errors,
        }
    }

    pub fn group(&self, client: ClientType) -> &[GroupEntry] {
        self.groups.get(&client).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A Jito-solana validator found while walking the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JitoPick {
    pub rank: usize,
    pub validator_id: String,
    pub slots: u64,
    pub events: u64,
    pub name: Option<String>,
    pub software_client: Option<String>,
    pub software_client_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JitoExtraction {
    pub target: usize,
    pub picks: Vec<JitoPick>,
    /// Validators inspected before the target was reached or the ranking ran out.
    pub checked: usize,
    /// (rank, validator id) of validators without cached metadata.
    pub missing: Vec<(usize, String)>,
}

impl JitoExtraction {
    /// Walk `ranking` in rank order collecting Jito-solana validators until
    /// `target` are found. `lookup` returns the cached metadata of a validator.
    pub fn run<F>(ranking: &[RankedValidator], mut lookup: F, target: usize) -> Self
    where
        F: FnMut(&str) -> Option<ValidatorMetadata>,
    {
        let mut picks = Vec::new();
        let mut missing = Vec::new();
        let mut checked = 0;

        for ranked in ranking {
            if picks.len() >= target {
                break;
            }
            checked += 1;
            let Some(meta) = lookup(&ranked.validator) else {
                tracing::debug!(rank = ranked.rank, validator = %ranked.validator, "metadata not cached");
                missing.push((ranked.rank, ranked.validator.clone()));
                continue;
            };
            if meta.client_type() != ClientType::JitoSolana {
                continue;
            }
            picks.push(JitoPick {
                rank: ranked.rank,
                validator_id: ranked.validator.clone(),
                slots: ranked.unique_slots,
                events: ranked.total_events,
                name: meta.name,
                software_client: meta.software_client,
                software_client_id: meta.software_client_id,
            });
        }

        tracing::info!(found = picks.len(), checked, missing = missing.len(), "jito extraction done");
        Self {
            target,
            picks,
            checked,
            missing,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.picks.len() >= self.target
    }
}
