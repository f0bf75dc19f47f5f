use thiserror::Error;

/// Error types for the prediction engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Artifacts unavailable: {0}")]
    ArtifactsUnavailable(String),

    #[error("No data for {entity} '{key}'")]
    NoData { entity: &'static str, key: String },

    #[error("Data shape error: {0}")]
    Shape(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// True for operational/setup failures that the operator must fix
    /// (as opposed to an empty result for a particular selection).
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            EngineError::ArtifactsUnavailable(_)
                | EngineError::Serialization(_)
                | EngineError::Io(_)
        )
    }

    /// True when a requested key simply has no rows; callers surface a
    /// warning and skip the prediction instead of failing.
    pub fn is_no_data(&self) -> bool {
        matches!(self, EngineError::NoData { .. })
    }

    /// Create a shape error with context
    pub fn shape<S: Into<String>>(message: S) -> Self {
        EngineError::Shape(message.into())
    }

    /// Create a no-data error for a missing key
    pub fn no_data<S: Into<String>>(entity: &'static str, key: S) -> Self {
        EngineError::NoData {
            entity,
            key: key.into(),
        }
    }

    /// Create an artifacts-unavailable error naming the missing piece
    pub fn artifacts<S: Into<String>>(message: S) -> Self {
        EngineError::ArtifactsUnavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_failures_are_distinct_from_no_data() {
        let missing = EngineError::artifacts("models/model.json not found");
        assert!(missing.is_setup_failure());
        assert!(!missing.is_no_data());

        let empty = EngineError::no_data("session", "2438687-76");
        assert!(empty.is_no_data());
        assert!(!empty.is_setup_failure());

        let shape = EngineError::shape("age column missing");
        assert!(!shape.is_setup_failure());
        assert!(!shape.is_no_data());
    }

    #[test]
    fn test_error_messages_name_the_key() {
        let err = EngineError::no_data("deputy", "220593");
        assert_eq!(err.to_string(), "No data for deputy '220593'");
    }
}
