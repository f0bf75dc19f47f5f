//! Trained vote classifier
//!
//! The model is an opaque artifact: a gradient-boosted ensemble of binary
//! decision trees dumped by the training stage. This module only walks the
//! trees; fitting, balancing and tuning happen outside the crate and
//! produce a new immutable artifact, never an in-place update.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::ml::{Classifier, FeatureMatrix};

/// One node of a decision tree, indexed within its tree's node array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Internal split: rows with `feature <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal leaf contributing `value` to the decision score
    Leaf { value: f64 },
}

/// A single decision tree stored as a node array rooted at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree for one encoded row
    fn score(&self, row: &[f64]) -> EngineResult<f64> {
        let mut index = 0usize;
        // Bounded by node count: a well-formed tree terminates at a leaf,
        // a malformed artifact must not loop forever
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).ok_or_else(|| {
                        EngineError::shape(format!(
                            "tree references feature {} but the row has {} columns",
                            feature,
                            row.len()
                        ))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(EngineError::shape(format!(
                        "tree walk reached node {} outside the {}-node array",
                        index,
                        self.nodes.len()
                    )))
                }
            }
        }
        Err(EngineError::shape("tree walk did not reach a leaf"))
    }
}

/// The persisted classifier: summed tree scores pushed through a sigmoid
/// give the probability of class 1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    trees: Vec<Tree>,
    base_score: f64,
    n_features: usize,
}

impl GradientBoostedTrees {
    pub fn new(trees: Vec<Tree>, base_score: f64, n_features: usize) -> Self {
        Self {
            trees,
            base_score,
            n_features,
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn check_width(&self, matrix: &FeatureMatrix) -> EngineResult<()> {
        if matrix.n_columns() != self.n_features {
            return Err(EngineError::shape(format!(
                "matrix has {} columns but the model was trained on {}",
                matrix.n_columns(),
                self.n_features
            )));
        }
        Ok(())
    }

    fn decision(&self, row: &[f64]) -> EngineResult<f64> {
        let mut score = self.base_score;
        for tree in &self.trees {
            score += tree.score(row)?;
        }
        Ok(score)
    }

    fn proba(&self, row: &[f64]) -> EngineResult<[f64; 2]> {
        let score = self.decision(row)?;
        let p1 = sigmoid(score);
        Ok([1.0 - p1, p1])
    }
}

impl Classifier for GradientBoostedTrees {
    fn predict(&self, matrix: &FeatureMatrix) -> EngineResult<Vec<usize>> {
        self.check_width(matrix)?;
        matrix
            .rows
            .iter()
            .map(|row| {
                let [p0, p1] = self.proba(row)?;
                Ok(if p1 > p0 { 1 } else { 0 })
            })
            .collect()
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> EngineResult<Vec<[f64; 2]>> {
        self.check_width(matrix)?;
        matrix.rows.iter().map(|row| self.proba(row)).collect()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
