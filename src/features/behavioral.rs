//! Behavioral feature builder
//!
//! Computes four grouped yes-rates from the full historical vote table and
//! joins them back onto every row. The whole stage is a pure function of
//! its input: rerunning it on the same table yields identical output.

use std::collections::HashMap;

use tracing::info;

use crate::chamber::{BehavioralFeatures, Bloc, EnrichedVote, ModelingRecord};

/// Neutral prior applied whenever a group has no historical observations.
/// Absence of history must not be read as "always votes no".
pub const NEUTRAL_RATE: f64 = 0.5;

/// Running yes/total counts for one group
#[derive(Debug, Default, Clone, Copy)]
struct GroupCount {
    yes: usize,
    total: usize,
}

impl GroupCount {
    fn observe(&mut self, is_yes: bool) {
        self.total += 1;
        if is_yes {
            self.yes += 1;
        }
    }

    /// count(Yes)/count(total); a group with zero rows is the neutral
    /// prior, never a division by zero and never 0
    fn rate(&self) -> f64 {
        if self.total == 0 {
            NEUTRAL_RATE
        } else {
            self.yes as f64 / self.total as f64
        }
    }
}

fn rates_from_counts<K: std::hash::Hash + Eq>(counts: HashMap<K, GroupCount>) -> HashMap<K, f64> {
    counts.into_iter().map(|(k, c)| (k, c.rate())).collect()
}

/// The four grouped-rate tables computed from a historical vote table
#[derive(Debug, Clone)]
pub struct BehavioralRates {
    by_deputy: HashMap<i64, f64>,
    by_session_party: HashMap<(String, String), f64>,
    by_region: HashMap<String, f64>,
    by_session_bloc: HashMap<(String, Bloc), f64>,
}

impl BehavioralRates {
    /// Group the table four ways and compute the yes-rate of each group
    pub fn compute(records: &[ModelingRecord]) -> Self {
        let mut by_deputy: HashMap<i64, GroupCount> = HashMap::new();
        let mut by_session_party: HashMap<(String, String), GroupCount> = HashMap::new();
        let mut by_region: HashMap<String, GroupCount> = HashMap::new();
        let mut by_session_bloc: HashMap<(String, Bloc), GroupCount> = HashMap::new();

        for record in records {
            let is_yes = record.vote.is_yes();
            let bloc = Bloc::from_party(&record.party);

            by_deputy.entry(record.deputy_id).or_default().observe(is_yes);
            by_session_party
                .entry((record.session_id.clone(), record.party.clone()))
                .or_default()
                .observe(is_yes);
            by_region
                .entry(record.region.clone())
                .or_default()
                .observe(is_yes);
            by_session_bloc
                .entry((record.session_id.clone(), bloc))
                .or_default()
                .observe(is_yes);
        }

        Self {
            by_deputy: rates_from_counts(by_deputy),
            by_session_party: rates_from_counts(by_session_party),
            by_region: rates_from_counts(by_region),
            by_session_bloc: rates_from_counts(by_session_bloc),
        }
    }

    /// Historical yes-rate of one deputy; unmatched keys get the explicit
    /// neutral fill, not whatever the join would leave behind
    pub fn deputy_rate(&self, deputy_id: i64) -> f64 {
        self.by_deputy.get(&deputy_id).copied().unwrap_or(NEUTRAL_RATE)
    }

    /// Yes-rate of one party within one session
    pub fn session_party_rate(&self, session_id: &str, party: &str) -> f64 {
        self.by_session_party
            .get(&(session_id.to_string(), party.to_string()))
            .copied()
            .unwrap_or(NEUTRAL_RATE)
    }

    /// Yes-rate of all votes from one region
    pub fn region_rate(&self, region: &str) -> f64 {
        self.by_region.get(region).copied().unwrap_or(NEUTRAL_RATE)
    }

    /// Yes-rate of one bloc within one session
    pub fn session_bloc_rate(&self, session_id: &str, bloc: Bloc) -> f64 {
        self.by_session_bloc
            .get(&(session_id.to_string(), bloc))
            .copied()
            .unwrap_or(NEUTRAL_RATE)
    }

    /// The full feature set for one row
    pub fn features_for(&self, record: &ModelingRecord, bloc: Bloc) -> BehavioralFeatures {
        BehavioralFeatures {
            deputy_yes_rate: self.deputy_rate(record.deputy_id),
            session_party_yes_rate: self.session_party_rate(&record.session_id, &record.party),
            region_yes_rate: self.region_rate(&record.region),
            session_bloc_yes_rate: self.session_bloc_rate(&record.session_id, bloc),
        }
    }
}

/// Produce the enriched training table: every record with its derived bloc
/// and the four behavioral rates joined back on
pub fn enrich(records: &[ModelingRecord]) -> Vec<EnrichedVote> {
    let rates = BehavioralRates::compute(records);

    let enriched: Vec<EnrichedVote> = records
        .iter()
        .map(|record| {
            let bloc = Bloc::from_party(&record.party);
            let behavioral = rates.features_for(record, bloc);
            EnrichedVote {
                session_id: record.session_id.clone(),
                deputy_id: record.deputy_id,
                summary: record.summary.clone(),
                deputy_name: record.deputy_name.clone(),
                party: record.party.clone(),
                region: record.region.clone(),
                age: record.age,
                education: record.education.clone(),
                bloc,
                vote: record.vote,
                behavioral,
            }
        })
        .collect();

    info!(
        rows = enriched.len(),
        "enriched historical table with behavioral rates"
    );
    enriched
}

/// Per-deputy and per-region rates extracted from an already-enriched
/// table. Scenario prediction uses these two; the session-scoped rates
/// cannot exist for an unvoted proposal.
#[derive(Debug, Clone)]
pub struct HistoricalRates {
    by_deputy: HashMap<i64, f64>,
    by_region: HashMap<String, f64>,
}

impl HistoricalRates {
    /// Collect the deputy and region rates carried on enriched rows.
    /// Rates are constant per key, so the first occurrence wins.
    pub fn from_enriched(rows: &[EnrichedVote]) -> Self {
        let mut by_deputy = HashMap::new();
        let mut by_region = HashMap::new();
        for row in rows {
            by_deputy
                .entry(row.deputy_id)
                .or_insert(row.behavioral.deputy_yes_rate);
            by_region
                .entry(row.region.clone())
                .or_insert(row.behavioral.region_yes_rate);
        }
        Self {
            by_deputy,
            by_region,
        }
    }

    pub fn deputy_rate(&self, deputy_id: i64) -> f64 {
        self.by_deputy.get(&deputy_id).copied().unwrap_or(NEUTRAL_RATE)
    }

    pub fn region_rate(&self, region: &str) -> f64 {
        self.by_region.get(region).copied().unwrap_or(NEUTRAL_RATE)
    }
}
