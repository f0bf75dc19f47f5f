//! Prediction and aggregation layer
//!
//! Applies the trained classifier to one deputy, one voting session, or
//! the full chamber, and turns per-deputy predictions into a pass/fail
//! chamber verdict. All inputs are already-materialized tables; nothing
//! here retries or blocks.

pub mod scenario;

pub use scenario::{DeputyForecast, ScenarioOutcome, ScenarioRequest};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::info;

use crate::artifacts::ModelContext;
use crate::chamber::Vote;
use crate::config::Config;
use crate::errors::{EngineError, EngineResult};
use crate::ml::{Classifier, FeatureRow};

/// Chamber-level outcome of a voting session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Passed,
    Rejected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Passed => "Passed",
            Verdict::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Yes/No counts for one session, predicted or real
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamberTally {
    pub yes: usize,
    pub no: usize,
}

impl ChamberTally {
    pub fn from_votes<I: IntoIterator<Item = Vote>>(votes: I) -> Self {
        let mut tally = ChamberTally::default();
        for vote in votes {
            match vote {
                Vote::Yes => tally.yes += 1,
                Vote::No => tally.no += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.yes + self.no
    }

    /// Passed when the yes-count exceeds the chamber's majority number
    pub fn verdict(&self, majority_threshold: usize) -> Verdict {
        if self.yes > majority_threshold {
            Verdict::Passed
        } else {
            Verdict::Rejected
        }
    }
}

/// Class probabilities decoded into vote terms
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteProbabilities {
    pub yes: f64,
    pub no: f64,
}

/// Prediction for one (deputy, session) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotePrediction {
    pub deputy_id: i64,
    pub deputy_name: String,
    pub party: String,
    pub region: String,
    pub session_id: String,
    pub predicted: Vote,
    pub probabilities: Option<VoteProbabilities>,
    /// Highest class probability, when probabilities were computed
    pub confidence: Option<f64>,
    pub real: Option<Vote>,
    pub correct: Option<bool>,
}

/// Session-wide prediction with the comparative scoreboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPrediction {
    pub session_id: String,
    pub summary: String,
    pub results: Vec<VotePrediction>,
    /// Share of deputies whose vote the model got right in this session
    pub accuracy: f64,
    pub predicted_tally: ChamberTally,
    pub real_tally: ChamberTally,
    pub predicted_verdict: Verdict,
    pub real_verdict: Verdict,
}

impl SessionPrediction {
    /// Deputies who voted against the pattern the model expected
    pub fn mispredicted(&self) -> Vec<&VotePrediction> {
        self.results
            .iter()
            .filter(|r| r.correct == Some(false))
            .collect()
    }
}

/// Global statistics over the enriched historical table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DatasetStats {
    pub sessions: usize,
    pub deputies: usize,
    pub votes: usize,
    pub global_yes_rate: f64,
    pub global_no_rate: f64,
}

/// Historical outcome of one session under the majority rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub summary: String,
    pub tally: ChamberTally,
    pub approval_rate: f64,
    pub verdict: Verdict,
}

/// Prediction engine over an immutable model context
pub struct PredictionEngine<'a> {
    context: &'a ModelContext,
    majority_threshold: usize,
    reference_date: NaiveDate,
}

impl<'a> PredictionEngine<'a> {
    pub fn new(
        context: &'a ModelContext,
        majority_threshold: usize,
        reference_date: NaiveDate,
    ) -> Self {
        Self {
            context,
            majority_threshold,
            reference_date,
        }
    }

    pub fn from_config(context: &'a ModelContext, config: &Config) -> Self {
        Self::new(
            context,
            config.chamber.majority_threshold,
            config.effective_date(),
        )
    }

    pub fn majority_threshold(&self) -> usize {
        self.majority_threshold
    }

    /// Predict the vote of one deputy in one historical session, with
    /// class probabilities and the real recorded vote for comparison
    pub fn predict_single(
        &self,
        deputy_id: i64,
        session_id: &str,
    ) -> EngineResult<VotePrediction> {
        let row = self
            .context
            .enriched
            .iter()
            .find(|r| r.deputy_id == deputy_id && r.session_id == session_id)
            .ok_or_else(|| {
                EngineError::no_data(
                    "vote record",
                    format!("deputy {} in session {}", deputy_id, session_id),
                )
            })?;

        let (matrix, _audit) = self.context.encoder.encode(&[FeatureRow::from(row)])?;
        let labels = self.context.classifier.predict(&matrix)?;
        let probas = self.context.classifier.predict_proba(&matrix)?;

        let class = *labels
            .first()
            .ok_or_else(|| EngineError::shape("classifier returned no labels"))?;
        let pair = probas
            .first()
            .ok_or_else(|| EngineError::shape("classifier returned no probabilities"))?;

        let predicted = self.context.codec.decode(class)?;
        let yes_class = self.context.codec.encode(Vote::Yes)?;
        let no_class = self.context.codec.encode(Vote::No)?;
        let probabilities = VoteProbabilities {
            yes: pair[yes_class],
            no: pair[no_class],
        };

        info!(
            deputy_id,
            session_id,
            predicted = %predicted,
            "single prediction computed"
        );

        Ok(VotePrediction {
            deputy_id,
            deputy_name: row.deputy_name.clone(),
            party: row.party.clone(),
            region: row.region.clone(),
            session_id: session_id.to_string(),
            predicted,
            probabilities: Some(probabilities),
            confidence: Some(probabilities.yes.max(probabilities.no)),
            real: Some(row.vote),
            correct: Some(predicted == row.vote),
        })
    }

    /// Predict every vote of one historical session in a single batch
    /// classifier call, and compare against the recorded outcome
    pub fn predict_session(&self, session_id: &str) -> EngineResult<SessionPrediction> {
        let rows: Vec<_> = self
            .context
            .enriched
            .iter()
            .filter(|r| r.session_id == session_id)
            .collect();
        if rows.is_empty() {
            return Err(EngineError::no_data("session", session_id));
        }

        let feature_rows: Vec<FeatureRow> = rows.iter().map(|r| FeatureRow::from(*r)).collect();
        let (matrix, _audit) = self.context.encoder.encode(&feature_rows)?;
        // One batch call for the whole session, never row-by-row
        let labels = self.context.classifier.predict(&matrix)?;

        let mut results = Vec::with_capacity(rows.len());
        for (row, class) in rows.iter().zip(labels) {
            let predicted = self.context.codec.decode(class)?;
            results.push(VotePrediction {
                deputy_id: row.deputy_id,
                deputy_name: row.deputy_name.clone(),
                party: row.party.clone(),
                region: row.region.clone(),
                session_id: session_id.to_string(),
                predicted,
                probabilities: None,
                confidence: None,
                real: Some(row.vote),
                correct: Some(predicted == row.vote),
            });
        }

        let correct = results.iter().filter(|r| r.correct == Some(true)).count();
        let accuracy = correct as f64 / results.len() as f64;

        let predicted_tally = ChamberTally::from_votes(results.iter().map(|r| r.predicted));
        let real_tally = ChamberTally::from_votes(rows.iter().map(|r| r.vote));

        info!(
            session_id,
            deputies = results.len(),
            accuracy,
            "session prediction computed"
        );

        Ok(SessionPrediction {
            session_id: session_id.to_string(),
            summary: rows[0].summary.clone(),
            results,
            accuracy,
            predicted_tally,
            real_tally,
            predicted_verdict: predicted_tally.verdict(self.majority_threshold),
            real_verdict: real_tally.verdict(self.majority_threshold),
        })
    }

    /// Global counts and rates over the enriched table
    pub fn dataset_stats(&self) -> DatasetStats {
        let enriched = &self.context.enriched;
        let sessions: HashSet<&str> = enriched.iter().map(|r| r.session_id.as_str()).collect();
        let deputies: HashSet<i64> = enriched.iter().map(|r| r.deputy_id).collect();
        let votes = enriched.len();
        let yes = enriched.iter().filter(|r| r.vote.is_yes()).count();
        let (global_yes_rate, global_no_rate) = if votes == 0 {
            (0.0, 0.0)
        } else {
            let yes_rate = yes as f64 / votes as f64;
            (yes_rate, 1.0 - yes_rate)
        };
        DatasetStats {
            sessions: sessions.len(),
            deputies: deputies.len(),
            votes,
            global_yes_rate,
            global_no_rate,
        }
    }

    /// Historical outcome of every session under the same majority rule
    /// used for predictions, newest-first by external id order preserved
    pub fn session_summaries(&self) -> Vec<SessionSummary> {
        let mut seen = HashSet::new();
        let mut summaries = Vec::new();
        for row in &self.context.enriched {
            if !seen.insert(row.session_id.clone()) {
                continue;
            }
            let tally = ChamberTally::from_votes(
                self.context
                    .enriched
                    .iter()
                    .filter(|r| r.session_id == row.session_id)
                    .map(|r| r.vote),
            );
            let approval_rate = if tally.total() == 0 {
                0.0
            } else {
                tally.yes as f64 / tally.total() as f64
            };
            summaries.push(SessionSummary {
                session_id: row.session_id.clone(),
                summary: row.summary.clone(),
                tally,
                approval_rate,
                verdict: tally.verdict(self.majority_threshold),
            });
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_threshold_rule() {
        let majority = 257;
        let passed = ChamberTally { yes: 260, no: 253 };
        assert_eq!(passed.verdict(majority), Verdict::Passed);

        let rejected = ChamberTally { yes: 250, no: 263 };
        assert_eq!(rejected.verdict(majority), Verdict::Rejected);

        // Reaching the threshold exactly is not enough
        let at_threshold = ChamberTally { yes: 257, no: 0 };
        assert_eq!(at_threshold.verdict(majority), Verdict::Rejected);
    }

    #[test]
    fn test_tally_counts_votes() {
        let tally =
            ChamberTally::from_votes([Vote::Yes, Vote::Yes, Vote::No, Vote::Yes, Vote::No]);
        assert_eq!(tally.yes, 3);
        assert_eq!(tally.no, 2);
        assert_eq!(tally.total(), 5);
    }
}
