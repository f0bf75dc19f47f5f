//! Chamber domain types: deputies, voting sessions, and vote records
//! Typed at the data-collection boundary so the core never sees a row with
//! a missing required field.

pub mod bloc;

pub use bloc::Bloc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EngineError, EngineResult};

/// Sentinel text for sessions whose proposal summary is absent upstream.
/// Null summaries are normalized to this string so downstream encoding
/// never has to special-case a missing value.
pub const NO_SUMMARY: &str = "Ementa não disponível";

/// A recorded binary vote. The chamber's raw feed also carries abstention,
/// absence and leadership-obeyed codes; those are filtered out before
/// modeling and the model only ever sees Yes/No.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    #[serde(rename = "Sim")]
    Yes,
    #[serde(rename = "Não")]
    No,
}

impl Vote {
    /// Parse a raw vote string from the chamber feed. Returns `None` for
    /// anything outside the binary set, including abstentions.
    pub fn from_raw(raw: &str) -> Option<Vote> {
        match raw.trim() {
            "Sim" => Some(Vote::Yes),
            "Não" => Some(Vote::No),
            _ => None,
        }
    }

    /// The label string used in artifacts and reports
    pub fn as_label(&self) -> &'static str {
        match self {
            Vote::Yes => "Sim",
            Vote::No => "Não",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Vote::Yes)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One member of the chamber, as collected into the roster table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deputy {
    pub id: i64,
    pub name: String,
    pub party: String,
    pub region: String,
    pub birth_date: NaiveDate,
    pub education: String,
}

impl Deputy {
    /// Age in whole years on the given date
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        let mut age = date.year() - self.birth_date.year();
        if (date.month(), date.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// Bloc is always derived from the party code, never stored
    pub fn bloc(&self) -> Bloc {
        Bloc::from_party(&self.party)
    }
}

/// A roll-call voting session. The id is a composite external identifier
/// (e.g. "2438687-76") kept as a string to preserve exact formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSession {
    pub id: String,
    pub summary: String,
    pub recorded_at: DateTime<Utc>,
}

impl VotingSession {
    /// Normalize a possibly-absent proposal summary to the sentinel text
    pub fn normalize_summary(summary: Option<String>) -> String {
        match summary {
            Some(s) if !s.trim().is_empty() => s,
            _ => NO_SUMMARY.to_string(),
        }
    }
}

/// A single (deputy, session) vote joined with deputy and session
/// attributes — one row of the modeling dataset before enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelingRecord {
    pub session_id: String,
    pub deputy_id: i64,
    pub summary: String,
    pub deputy_name: String,
    pub party: String,
    pub region: String,
    pub age: u32,
    pub education: String,
    pub vote: Vote,
}

/// A modeling row as it arrives from the collection stage, with the raw
/// vote string still unparsed
#[derive(Debug, Clone, Deserialize)]
pub struct RawModelingRow {
    pub session_id: String,
    pub deputy_id: i64,
    pub summary: Option<String>,
    pub deputy_name: String,
    pub party: String,
    pub region: String,
    pub age: u32,
    pub education: String,
    pub vote: String,
}

impl RawModelingRow {
    /// Convert to a typed record, or `None` if the vote is not binary.
    /// Filtering here is deliberate scope reduction, not data loss by
    /// accident: abstentions and absences never reach the model.
    pub fn into_record(self) -> Option<ModelingRecord> {
        let vote = Vote::from_raw(&self.vote)?;
        Some(ModelingRecord {
            session_id: self.session_id,
            deputy_id: self.deputy_id,
            summary: VotingSession::normalize_summary(self.summary),
            deputy_name: self.deputy_name,
            party: self.party,
            region: self.region,
            age: self.age,
            education: self.education,
            vote,
        })
    }
}

/// The four behavioral rates attached to a (deputy, session) pair.
/// Invariant: each rate is in [0,1]; a group with no observations gets the
/// neutral 0.5 prior, never 0 or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehavioralFeatures {
    pub deputy_yes_rate: f64,
    pub session_party_yes_rate: f64,
    pub region_yes_rate: f64,
    pub session_bloc_yes_rate: f64,
}

impl BehavioralFeatures {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.deputy_yes_rate,
            self.session_party_yes_rate,
            self.region_yes_rate,
            self.session_bloc_yes_rate,
        ]
    }
}

/// One row of the enriched historical table: a modeling record plus its
/// derived bloc and behavioral rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedVote {
    pub session_id: String,
    pub deputy_id: i64,
    pub summary: String,
    pub deputy_name: String,
    pub party: String,
    pub region: String,
    pub age: u32,
    pub education: String,
    pub bloc: Bloc,
    pub vote: Vote,
    #[serde(flatten)]
    pub behavioral: BehavioralFeatures,
}

/// Validation helpers applied at the data-collection boundary
pub mod validation {
    use super::*;

    /// Reject records missing a required raw attribute. Unknown category
    /// VALUES pass through (the encoder drops unseen columns at reindex
    /// time); absent attributes do not.
    pub fn validate_record(record: &ModelingRecord) -> EngineResult<()> {
        if record.session_id.trim().is_empty() {
            return Err(EngineError::shape("session_id must not be empty"));
        }
        if record.party.trim().is_empty() {
            return Err(EngineError::shape(format!(
                "deputy {} has an empty party code",
                record.deputy_id
            )));
        }
        if record.region.trim().is_empty() {
            return Err(EngineError::shape(format!(
                "deputy {} has an empty region code",
                record.deputy_id
            )));
        }
        if record.education.trim().is_empty() {
            return Err(EngineError::shape(format!(
                "deputy {} has an empty education level",
                record.deputy_id
            )));
        }
        if record.age == 0 {
            return Err(EngineError::shape(format!(
                "deputy {} has age 0, birth date was not collected",
                record.deputy_id
            )));
        }
        Ok(())
    }

    /// Validate a batch, reporting the first offending row
    pub fn validate_records(records: &[ModelingRecord]) -> EngineResult<()> {
        for record in records {
            validate_record(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(vote: Vote) -> ModelingRecord {
        ModelingRecord {
            session_id: "2438687-76".to_string(),
            deputy_id: 220593,
            summary: NO_SUMMARY.to_string(),
            deputy_name: "Deputado Teste".to_string(),
            party: "PT".to_string(),
            region: "SP".to_string(),
            age: 52,
            education: "Superior".to_string(),
            vote,
        }
    }

    #[test]
    fn test_vote_parsing_filters_non_binary() {
        assert_eq!(Vote::from_raw("Sim"), Some(Vote::Yes));
        assert_eq!(Vote::from_raw(" Não "), Some(Vote::No));
        assert_eq!(Vote::from_raw("Abstenção"), None);
        assert_eq!(Vote::from_raw("Obstrução"), None);
        assert_eq!(Vote::from_raw("Artigo 17"), None);
        assert_eq!(Vote::from_raw(""), None);
    }

    #[test]
    fn test_vote_label_round_trip() {
        for vote in [Vote::Yes, Vote::No] {
            assert_eq!(Vote::from_raw(vote.as_label()), Some(vote));
        }
    }

    #[test]
    fn test_summary_normalization() {
        assert_eq!(VotingSession::normalize_summary(None), NO_SUMMARY);
        assert_eq!(
            VotingSession::normalize_summary(Some("   ".to_string())),
            NO_SUMMARY
        );
        assert_eq!(
            VotingSession::normalize_summary(Some("Reforma tributária".to_string())),
            "Reforma tributária"
        );
    }

    #[test]
    fn test_age_derivation_respects_birthday() {
        let deputy = Deputy {
            id: 1,
            name: "Teste".to_string(),
            party: "PT".to_string(),
            region: "SP".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1970, 6, 15).expect("valid date"),
            education: "Superior".to_string(),
        };
        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date");
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        assert_eq!(deputy.age_on(before_birthday), 53);
        assert_eq!(deputy.age_on(on_birthday), 54);
    }

    #[test]
    fn test_raw_row_filtering() {
        let raw = RawModelingRow {
            session_id: "2438687-76".to_string(),
            deputy_id: 1,
            summary: None,
            deputy_name: "Teste".to_string(),
            party: "PT".to_string(),
            region: "SP".to_string(),
            age: 40,
            education: "Superior".to_string(),
            vote: "Obstrução".to_string(),
        };
        assert!(raw.into_record().is_none());
    }

    #[test]
    fn test_validation_rejects_empty_required_fields() {
        let mut bad = record(Vote::Yes);
        bad.party = String::new();
        assert!(validation::validate_record(&bad).is_err());

        let good = record(Vote::No);
        assert!(validation::validate_record(&good).is_ok());
    }
}
