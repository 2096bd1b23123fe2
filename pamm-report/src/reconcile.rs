use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::error::ReportError;

/// Base58 validator identities as printed in reports.
const VALIDATOR_ID_PATTERN: &str = r"\b[1-9A-HJ-NP-Za-km-z]{43,44}\b";

/// Finds validator ids in free-form report text.
pub struct IdExtractor {
    pattern: Regex,
}

impl IdExtractor {
    pub fn new() -> Result<Self, ReportError> {
        Ok(Self {
            pattern: Regex::new(VALIDATOR_ID_PATTERN)?,
        })
    }

    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Set comparison between ids named in a report and ids in the metadata cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub report_ids: BTreeSet<String>,
    pub cache_ids: BTreeSet<String>,
    pub only_in_cache: Vec<String>,
    pub only_in_report: Vec<String>,
    pub in_both: Vec<String>,
}

impl Reconciliation {
    pub fn compute(report_ids: BTreeSet<String>, cache_ids: BTreeSet<String>) -> Self {
        let only_in_cache = cache_ids.difference(&report_ids).cloned().collect();
        let only_in_report = report_ids.difference(&cache_ids).cloned().collect();
        let in_both = report_ids.intersection(&cache_ids).cloned().collect();
        Self {
            report_ids,
            cache_ids,
            only_in_cache,
            only_in_report,
            in_both,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.only_in_cache.is_empty() && self.only_in_report.is_empty()
    }
}
