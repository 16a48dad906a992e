//! Snapshot error types.

use thiserror::Error;

/// Errors raised while decoding a snapshot or building its hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The snapshot carried no nodes at all.
    #[error("empty snapshot: no accessibility nodes to build from")]
    EmptyInput,

    /// Nodes were present but none of them can act as the root.
    #[error("no root accessibility node found")]
    MissingRoot,

    /// Two records share an identifier and the builder is set to reject them.
    #[error("duplicate accessibility node id: {id}")]
    DuplicateId { id: String },

    /// The payload is not a recognisable snapshot shape.
    #[error("invalid snapshot payload: {0}")]
    Parse(String),
}

impl SnapshotError {
    /// Every snapshot error blocks the current render attempt; none of them
    /// can be retried without a different payload.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// True when the payload decoded but its structure is unusable.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SnapshotError::EmptyInput | SnapshotError::MissingRoot | SnapshotError::DuplicateId { .. }
        )
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SnapshotError::DuplicateId { id: "42".into() };
        assert!(err.to_string().contains("42"));
        assert_eq!(
            SnapshotError::MissingRoot.to_string(),
            "no root accessibility node found"
        );
    }

    #[test]
    fn error_structural() {
        assert!(SnapshotError::EmptyInput.is_structural());
        assert!(SnapshotError::MissingRoot.is_fatal());
        assert!(!SnapshotError::Parse("bad".into()).is_structural());
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let err: SnapshotError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }
}
