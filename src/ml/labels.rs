//! Label codec: the bidirectional mapping between vote labels and the
//! integer class codes the classifier was trained against. Fit once at
//! training time, persisted, and reused verbatim at inference.

use serde::{Deserialize, Serialize};

use crate::chamber::Vote;
use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCodec {
    /// Distinct labels in sorted order; a label's position is its class
    /// code ("Não" sorts before "Sim", so 0 = Não, 1 = Sim)
    classes: Vec<String>,
}

impl LabelCodec {
    /// Fit the codec over the training labels
    pub fn fit(votes: &[Vote]) -> Self {
        let mut classes: Vec<String> = votes
            .iter()
            .map(|v| v.as_label().to_string())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        classes.sort();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Class code for a vote label
    pub fn encode(&self, vote: Vote) -> EngineResult<usize> {
        self.classes
            .iter()
            .position(|c| c == vote.as_label())
            .ok_or_else(|| {
                EngineError::shape(format!(
                    "label '{}' was not seen at training time",
                    vote.as_label()
                ))
            })
    }

    /// Vote label for a predicted class code
    pub fn decode(&self, class: usize) -> EngineResult<Vote> {
        let label = self.classes.get(class).ok_or_else(|| {
            EngineError::shape(format!(
                "class code {} outside the {} trained classes",
                class,
                self.classes.len()
            ))
        })?;
        Vote::from_raw(label)
            .ok_or_else(|| EngineError::shape(format!("class label '{}' is not a vote", label)))
    }
}
