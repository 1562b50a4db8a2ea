//! Error types for grid mutation, reconciliation, persistence and options

use thiserror::Error;

/// Rejected grid insertion. The grid is unchanged whenever one of these is
/// returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("coordinate {0} is already occupied")]
    OccupiedCoordinate(String),

    #[error("a location named '{0}' already exists")]
    DuplicateName(String),

    #[error("coordinate {coords} lies outside bounds {bounds}")]
    OutOfBounds { coords: String, bounds: String },
}

/// Failure of a whole reconciliation batch. Nothing has been mutated when
/// one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("invalid name '{name}': {reason}")]
    Validation { name: String, reason: String },

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error(transparent)]
    Grid(#[from] GridError),
}

impl ReconcileError {
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed world data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported world format: {0}")]
    UnsupportedFormat(String),

    #[error("inconsistent world data: {0}")]
    Grid(#[from] GridError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("missing value for option: {0}")]
    MissingValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_error_display() {
        let err = GridError::DuplicateName("Old Mill".to_string());
        assert!(err.to_string().contains("Old Mill"));
    }

    #[test]
    fn test_reconcile_error_wraps_grid_error() {
        let err: ReconcileError = GridError::OccupiedCoordinate("(0, 1)".to_string()).into();
        assert!(matches!(err, ReconcileError::Grid(_)));
        assert!(err.to_string().contains("(0, 1)"));
    }
}
