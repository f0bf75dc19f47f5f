//! CLI command implementations
//!
//! Thin presentation over the prediction engine. Three user-visible
//! states are kept distinct: an empty result for a selection prints a
//! warning and succeeds, while missing artifacts fail the process so the
//! operator sees a setup problem.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::artifacts::{self, ModelContext, ENRICHED_VOTES_FILE};
use crate::chamber::{validation, ModelingRecord, RawModelingRow};
use crate::config::Config;
use crate::features;
use crate::prediction::{PredictionEngine, ScenarioRequest};

/// Build the enriched historical table artifact from the collected
/// modeling dataset
pub fn enrich(config: &Config, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| config.artifacts.data_dir.join("modeling_dataset.json"));
    let output = output.unwrap_or_else(|| config.artifacts.dir.join(ENRICHED_VOTES_FILE));

    let raw = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read modeling dataset from {}", input.display()))?;
    let rows: Vec<RawModelingRow> =
        serde_json::from_str(&raw).context("Malformed modeling dataset")?;

    let total = rows.len();
    let records: Vec<ModelingRecord> = rows
        .into_iter()
        .filter_map(RawModelingRow::into_record)
        .collect();
    validation::validate_records(&records)?;

    info!(
        total,
        binary = records.len(),
        filtered = total - records.len(),
        "filtered modeling dataset to binary votes"
    );

    let enriched = features::enrich(&records);
    artifacts::save_json(&output, &enriched)?;

    println!(
        "Enriched {} of {} records ({} non-binary votes filtered) -> {}",
        enriched.len(),
        total,
        total - records.len(),
        output.display()
    );
    Ok(())
}

pub fn predict(config: &Config, deputy_id: i64, session_id: &str) -> Result<()> {
    let context = ModelContext::load(&config.artifacts.dir)?;
    let engine = PredictionEngine::from_config(&context, config);

    match engine.predict_single(deputy_id, session_id) {
        Ok(result) => {
            println!(
                "{} ({}/{}) — session {}",
                result.deputy_name, result.party, result.region, result.session_id
            );
            println!("Predicted vote: {}", result.predicted);
            if let Some(probabilities) = result.probabilities {
                println!(
                    "Probabilities:  Sim {:.1}% | Não {:.1}%",
                    probabilities.yes * 100.0,
                    probabilities.no * 100.0
                );
            }
            if let Some(confidence) = result.confidence {
                println!("Confidence:     {:.1}%", confidence * 100.0);
            }
            if let (Some(real), Some(correct)) = (result.real, result.correct) {
                println!(
                    "Recorded vote:  {} — {}",
                    real,
                    if correct { "correct" } else { "missed" }
                );
            }
        }
        Err(err) if err.is_no_data() => {
            warn!(deputy_id, session_id, "no data for selection");
            println!("No data for deputy {} in session {}", deputy_id, session_id);
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn session(config: &Config, session_id: &str) -> Result<()> {
    let context = ModelContext::load(&config.artifacts.dir)?;
    let engine = PredictionEngine::from_config(&context, config);

    match engine.predict_session(session_id) {
        Ok(result) => {
            println!("Session {}: {}", result.session_id, result.summary);
            println!(
                "Real:      {} Sim / {} Não -> {}",
                result.real_tally.yes, result.real_tally.no, result.real_verdict
            );
            println!(
                "Predicted: {} Sim / {} Não -> {}",
                result.predicted_tally.yes, result.predicted_tally.no, result.predicted_verdict
            );
            println!("Session accuracy: {:.1}%", result.accuracy * 100.0);

            let mispredicted = result.mispredicted();
            if mispredicted.is_empty() {
                println!("Every vote in this session was predicted correctly.");
            } else {
                println!(
                    "Mispredicted {} of {} votes:",
                    mispredicted.len(),
                    result.results.len()
                );
                for vote in mispredicted {
                    if let Some(real) = vote.real {
                        println!(
                            "  {} ({}/{}): predicted {}, voted {}",
                            vote.deputy_name, vote.party, vote.region, vote.predicted, real
                        );
                    }
                }
            }
        }
        Err(err) if err.is_no_data() => {
            warn!(session_id, "no data for selection");
            println!("No data for session {}", session_id);
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn scenario(config: &Config, summary: Option<String>) -> Result<()> {
    let context = ModelContext::load(&config.artifacts.dir)?;
    let engine = PredictionEngine::from_config(&context, config);

    let outcome = engine.predict_scenario(&ScenarioRequest { summary })?;

    println!("Scenario forecast: {}", outcome.summary);
    println!(
        "Predicted scoreboard: {} Sim / {} Não ({} deputies)",
        outcome.tally.yes,
        outcome.tally.no,
        outcome.forecasts.len()
    );
    println!(
        "Likely outcome: {} (majority threshold {})",
        outcome.verdict,
        engine.majority_threshold()
    );
    println!("By bloc:");
    for (bloc, tally) in &outcome.bloc_tallies {
        println!("  {:<12} {} Sim / {} Não", bloc.as_str(), tally.yes, tally.no);
    }
    Ok(())
}

pub fn sessions(config: &Config) -> Result<()> {
    let context = ModelContext::load(&config.artifacts.dir)?;
    let engine = PredictionEngine::from_config(&context, config);

    let summaries = engine.session_summaries();
    if summaries.is_empty() {
        println!("No historical sessions on record.");
        return Ok(());
    }

    println!(
        "{:<16} {:>5} {:>5} {:>9}  {:<8}  Summary",
        "Session", "Sim", "Não", "Approval", "Verdict"
    );
    for entry in summaries {
        let summary = if entry.summary.chars().count() > 60 {
            let truncated: String = entry.summary.chars().take(57).collect();
            format!("{}...", truncated)
        } else {
            entry.summary.clone()
        };
        println!(
            "{:<16} {:>5} {:>5} {:>8.1}%  {:<8}  {}",
            entry.session_id,
            entry.tally.yes,
            entry.tally.no,
            entry.approval_rate * 100.0,
            entry.verdict.as_str(),
            summary
        );
    }
    Ok(())
}

pub fn stats(config: &Config) -> Result<()> {
    let context = ModelContext::load(&config.artifacts.dir)?;
    let engine = PredictionEngine::from_config(&context, config);

    let stats = engine.dataset_stats();
    println!("Sessions analyzed:   {}", stats.sessions);
    println!("Deputies monitored:  {}", stats.deputies);
    println!("Votes on record:     {}", stats.votes);
    println!("Global Sim rate:     {:.1}%", stats.global_yes_rate * 100.0);
    println!("Global Não rate:     {:.1}%", stats.global_no_rate * 100.0);
    Ok(())
}
