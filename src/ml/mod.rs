//! Machine learning module: feature encoding, label codec, and inference
//! over the trained vote classifier

pub mod encoder;
pub mod labels;
pub mod model;

pub use encoder::{EncodeAudit, FeatureEncoder, FeatureMatrix, FeatureRow};
pub use labels::LabelCodec;
pub use model::GradientBoostedTrees;

use crate::errors::EngineResult;

/// Inference contract of the trained classifier. The model itself is an
/// opaque artifact produced by the training stage; the core only ever
/// calls these two operations.
pub trait Classifier {
    /// Predicted class index per row
    fn predict(&self, matrix: &FeatureMatrix) -> EngineResult<Vec<usize>>;

    /// Class probability pair per row, indexed by class
    fn predict_proba(&self, matrix: &FeatureMatrix) -> EngineResult<Vec<[f64; 2]>>;
}
