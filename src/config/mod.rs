use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub artifacts: ArtifactsConfig,
    pub chamber: ChamberConfig,

    // Fixed reference date for age derivation (set programmatically for
    // reproducible runs, not from env vars)
    #[serde(skip)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding the trained artifact set
    pub dir: PathBuf,
    /// Directory holding collected data tables
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberConfig {
    /// Total seats in the chamber
    pub total_seats: usize,
    /// Votes needed beyond which a proposal passes: the chamber's
    /// quorum-independent majority number, used for predicted and real
    /// verdicts alike
    pub majority_threshold: usize,
}

impl Config {
    /// Returns the effective date for age derivation, respecting a
    /// programmatic override. Defaults to today.
    pub fn effective_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenv::dotenv().ok();

        let total_seats: usize = env::var("CHAMBER_SEATS")
            .unwrap_or_else(|_| "513".to_string())
            .parse()
            .context("Invalid CHAMBER_SEATS value")?;

        // Majority defaults to strictly more than half the seats
        let majority_threshold: usize = match env::var("MAJORITY_THRESHOLD") {
            Ok(value) => value.parse().context("Invalid MAJORITY_THRESHOLD value")?,
            Err(_) => total_seats / 2 + 1,
        };

        if majority_threshold > total_seats {
            anyhow::bail!(
                "MAJORITY_THRESHOLD ({}) cannot exceed CHAMBER_SEATS ({})",
                majority_threshold,
                total_seats
            );
        }

        let config = Config {
            artifacts: ArtifactsConfig {
                dir: env::var("ARTIFACTS_DIR")
                    .unwrap_or_else(|_| "models".to_string())
                    .into(),
                data_dir: env::var("DATA_DIR")
                    .unwrap_or_else(|_| "data/processed".to_string())
                    .into(),
            },
            chamber: ChamberConfig {
                total_seats,
                majority_threshold,
            },
            reference_date: None,
        };

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                dir: PathBuf::from("models"),
                data_dir: PathBuf::from("data/processed"),
            },
            chamber: ChamberConfig {
                total_seats: 513,
                majority_threshold: 257,
            },
            reference_date: None,
        }
    }
}
