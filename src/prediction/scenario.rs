//! Scenario extrapolation: forecasting a voting session that has not
//! happened yet
//!
//! With no session on record there is no session-scoped history, so the
//! two session-specific rates are pinned to the neutral prior. That
//! encodes an ASSUMPTION of baseline party/bloc cohesion, not measured
//! cohesion; scenario forecasts are only as good as that assumption.
//!
//! The proposal summary accompanies the forecast as report metadata and
//! does not influence the feature vector: scenario predictions are blind
//! to proposal content.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chamber::{BehavioralFeatures, Bloc, Vote, VotingSession};
use crate::errors::{EngineError, EngineResult};
use crate::features::{HistoricalRates, NEUTRAL_RATE};
use crate::ml::{Classifier, FeatureRow};
use crate::prediction::{ChamberTally, PredictionEngine, Verdict};

/// A proposal that has not been voted on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioRequest {
    /// Free-text proposal summary, carried into the outcome for display
    pub summary: Option<String>,
}

/// Forecast vote of one deputy under the scenario assumptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeputyForecast {
    pub deputy_id: i64,
    pub deputy_name: String,
    pub party: String,
    pub region: String,
    pub bloc: Bloc,
    pub predicted: Vote,
}

/// Chamber-wide forecast for an unvoted proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub summary: String,
    pub forecasts: Vec<DeputyForecast>,
    pub tally: ChamberTally,
    pub verdict: Verdict,
    pub bloc_tallies: Vec<(Bloc, ChamberTally)>,
}

impl<'a> PredictionEngine<'a> {
    /// Forecast every deputy's vote on a proposal with no voting history.
    /// Covers the FULL roster, not just past session participants: a
    /// deputy without any historical record gets the neutral prior for
    /// the history-derived rates as well.
    pub fn predict_scenario(&self, request: &ScenarioRequest) -> EngineResult<ScenarioOutcome> {
        let context = self.context;
        if context.roster.is_empty() {
            return Err(EngineError::artifacts("deputy roster is empty"));
        }

        let historical = HistoricalRates::from_enriched(&context.enriched);
        let reference_date = self.reference_date;

        let feature_rows: Vec<FeatureRow> = context
            .roster
            .iter()
            .map(|deputy| FeatureRow {
                party: deputy.party.clone(),
                bloc: deputy.bloc(),
                region: deputy.region.clone(),
                education: deputy.education.clone(),
                age: deputy.age_on(reference_date),
                behavioral: BehavioralFeatures {
                    deputy_yes_rate: historical.deputy_rate(deputy.id),
                    // No session exists yet: both session-scoped rates
                    // take the neutral prior uniformly
                    session_party_yes_rate: NEUTRAL_RATE,
                    region_yes_rate: historical.region_rate(&deputy.region),
                    session_bloc_yes_rate: NEUTRAL_RATE,
                },
            })
            .collect();

        let (matrix, _audit) = context.encoder.encode(&feature_rows)?;
        let labels = context.classifier.predict(&matrix)?;

        let mut forecasts = Vec::with_capacity(context.roster.len());
        for (deputy, class) in context.roster.iter().zip(labels) {
            forecasts.push(DeputyForecast {
                deputy_id: deputy.id,
                deputy_name: deputy.name.clone(),
                party: deputy.party.clone(),
                region: deputy.region.clone(),
                bloc: deputy.bloc(),
                predicted: context.codec.decode(class)?,
            });
        }

        let tally = ChamberTally::from_votes(forecasts.iter().map(|f| f.predicted));
        let bloc_tallies = Bloc::ALL
            .iter()
            .map(|bloc| {
                let bloc_tally = ChamberTally::from_votes(
                    forecasts
                        .iter()
                        .filter(|f| f.bloc == *bloc)
                        .map(|f| f.predicted),
                );
                (*bloc, bloc_tally)
            })
            .collect();

        info!(
            deputies = forecasts.len(),
            predicted_yes = tally.yes,
            predicted_no = tally.no,
            "scenario forecast computed"
        );

        Ok(ScenarioOutcome {
            summary: VotingSession::normalize_summary(request.summary.clone()),
            forecasts,
            tally,
            verdict: tally.verdict(self.majority_threshold()),
            bloc_tallies,
        })
    }
}
