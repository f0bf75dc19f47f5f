//! Trained artifact loading
//!
//! The model context bundles every read-only artifact the prediction paths
//! need: the trained classifier, the label codec, the canonical feature
//! columns, the enriched historical table, and the deputy roster. It is
//! constructed once at startup and passed by reference into every call;
//! nothing here is ever mutated. Retraining produces a new artifact set on
//! disk, never an in-place update.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::chamber::{Deputy, EnrichedVote};
use crate::errors::{EngineError, EngineResult};
use crate::ml::{FeatureEncoder, GradientBoostedTrees, LabelCodec};

/// File names of the persisted artifact set, relative to the artifacts dir
pub const MODEL_FILE: &str = "model.json";
pub const LABEL_CODEC_FILE: &str = "label_codec.json";
pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";
pub const ENRICHED_VOTES_FILE: &str = "enriched_votes.json";
pub const ROSTER_FILE: &str = "deputies.json";

/// Immutable bundle of trained artifacts and reference data
#[derive(Debug)]
pub struct ModelContext {
    pub classifier: GradientBoostedTrees,
    pub codec: LabelCodec,
    pub encoder: FeatureEncoder,
    pub enriched: Vec<EnrichedVote>,
    pub roster: Vec<Deputy>,
}

impl ModelContext {
    /// Load every artifact from the given directory, failing fast with a
    /// distinct artifacts-unavailable condition if any piece is missing.
    /// This is an operational failure surfaced to the operator, not a
    /// per-request error.
    pub fn load(dir: &Path) -> EngineResult<Self> {
        let classifier: GradientBoostedTrees = load_json(&dir.join(MODEL_FILE))?;
        let codec: LabelCodec = load_json(&dir.join(LABEL_CODEC_FILE))?;
        let columns: Vec<String> = load_json(&dir.join(FEATURE_COLUMNS_FILE))?;
        let enriched: Vec<EnrichedVote> = load_json(&dir.join(ENRICHED_VOTES_FILE))?;
        let roster: Vec<Deputy> = load_json(&dir.join(ROSTER_FILE))?;

        let context = Self {
            classifier,
            codec,
            encoder: FeatureEncoder::from_columns(columns),
            enriched,
            roster,
        };
        context.health_check()?;

        info!(
            enriched_rows = context.enriched.len(),
            roster = context.roster.len(),
            features = context.encoder.n_features(),
            "model context loaded"
        );
        Ok(context)
    }

    /// Assemble a context from already-materialized parts
    pub fn from_parts(
        classifier: GradientBoostedTrees,
        codec: LabelCodec,
        encoder: FeatureEncoder,
        enriched: Vec<EnrichedVote>,
        roster: Vec<Deputy>,
    ) -> EngineResult<Self> {
        let context = Self {
            classifier,
            codec,
            encoder,
            enriched,
            roster,
        };
        context.health_check()?;
        Ok(context)
    }

    /// Cross-check the artifact set before any prediction runs, so a
    /// mismatched deployment fails at load time instead of deep inside an
    /// encode call
    pub fn health_check(&self) -> EngineResult<()> {
        if self.encoder.n_features() == 0 {
            return Err(EngineError::artifacts(
                "canonical feature column list is empty",
            ));
        }
        if self.codec.classes().len() != 2 {
            return Err(EngineError::artifacts(format!(
                "label codec carries {} classes, expected the binary pair",
                self.codec.classes().len()
            )));
        }
        if self.classifier.n_features() != self.encoder.n_features() {
            return Err(EngineError::artifacts(format!(
                "model expects {} features but the canonical column list has {}",
                self.classifier.n_features(),
                self.encoder.n_features()
            )));
        }
        Ok(())
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
    let raw = fs::read_to_string(path).map_err(|e| {
        EngineError::artifacts(format!("{}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        EngineError::artifacts(format!("{}: malformed artifact: {}", path.display(), e))
    })
}

/// Persist one artifact as pretty-printed JSON
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> EngineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{Node, Tree};

    fn tiny_classifier(n_features: usize) -> GradientBoostedTrees {
        GradientBoostedTrees::new(
            vec![Tree {
                nodes: vec![Node::Leaf { value: 1.0 }],
            }],
            0.0,
            n_features,
        )
    }

    #[test]
    fn test_load_missing_artifact_reports_unavailable() {
        let dir = std::env::temp_dir().join("plenario-missing-artifacts");
        let err = ModelContext::load(&dir).expect_err("must fail");
        assert!(err.is_setup_failure());
        assert!(err.to_string().contains(MODEL_FILE));
    }

    #[test]
    fn test_health_check_rejects_feature_width_mismatch() {
        use crate::chamber::Vote;
        let codec = LabelCodec::fit(&[Vote::Yes, Vote::No]);
        let encoder = FeatureEncoder::from_columns(vec!["age".to_string()]);
        let result = ModelContext::from_parts(
            tiny_classifier(7),
            codec,
            encoder,
            Vec::new(),
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::ArtifactsUnavailable(_))
        ));
    }

    #[test]
    fn test_save_and_load_json_round_trip() {
        let dir = std::env::temp_dir().join("plenario-artifact-roundtrip");
        let path = dir.join(FEATURE_COLUMNS_FILE);
        let columns = vec!["age".to_string(), "deputy_yes_rate".to_string()];
        save_json(&path, &columns).expect("save");
        let restored: Vec<String> = load_json(&path).expect("load");
        assert_eq!(restored, columns);
        let _ = fs::remove_dir_all(&dir);
    }
}
