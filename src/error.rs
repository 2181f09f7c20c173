//! Error types for the segmentation core.
//!
//! Every failure the core can produce is recoverable: the operator fixes the
//! input or the environment and retries.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Errors returned by the record store, the ingestion validator and the
/// segmentation engine.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// A raw field failed to parse into its typed value.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidInput {
        /// Human-readable field name, as in the store header
        field: &'static str,
        /// The raw text that was rejected
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// No customer store exists yet.
    #[error("customer data file '{path}' does not exist")]
    StoreMissing {
        /// Path of the missing store
        path: String,
    },

    /// Too few customers to run clustering.
    #[error("at least {required} customers are needed to perform clustering, found {found}")]
    InsufficientData {
        /// Number of records currently stored
        found: usize,
        /// Minimum number of records required
        required: usize,
    },

    /// The store could not be read or written.
    #[error("permission denied for customer data file '{path}': {source}")]
    Permission {
        /// Path of the store
        path: String,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The store exists but its contents are not valid customer rows.
    #[error("malformed customer data file '{path}': {message}")]
    MalformedStore {
        /// Path of the store
        path: String,
        /// Parser message, including the row position when known
        message: String,
    },

    /// Clustering failed for any other reason.
    #[error("an error occurred during clustering: {message}")]
    Clustering {
        /// Underlying cause
        message: String,
    },
}

impl SegmentError {
    /// Map an I/O failure on a read path: a missing file is `StoreMissing`,
    /// anything else is `Permission`.
    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::StoreMissing {
                path: path.display().to_string(),
            }
        } else {
            Self::access(path, source)
        }
    }

    /// Map an I/O failure on a write path. Always `Permission`.
    pub(crate) fn access(path: &Path, source: io::Error) -> Self {
        Self::Permission {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn from_csv(path: &Path, err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::from_io(path, source),
            _ => Self::MalformedStore {
                path: path.display().to_string(),
                message,
            },
        }
    }

    pub(crate) fn clustering(message: impl Into<String>) -> Self {
        Self::Clustering {
            message: message.into(),
        }
    }

    /// Whether the operation can be retried after the operator corrects the
    /// condition. No error in this crate is fatal.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidInput { .. }
            | Self::StoreMissing { .. }
            | Self::InsufficientData { .. }
            | Self::Permission { .. }
            | Self::MalformedStore { .. }
            | Self::Clustering { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_store_missing() {
        let err = SegmentError::from_io(
            Path::new("customers.csv"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SegmentError::StoreMissing { ref path } if path == "customers.csv"));
    }

    #[test]
    fn test_other_io_maps_to_permission() {
        let err = SegmentError::from_io(
            Path::new("customers.csv"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, SegmentError::Permission { .. }));
        assert!(err.to_string().contains("denied"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_clustering_message_carries_cause() {
        let err = SegmentError::clustering("fit diverged");
        assert_eq!(
            err.to_string(),
            "an error occurred during clustering: fit diverged"
        );
    }
}
