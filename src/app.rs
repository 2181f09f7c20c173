//! Entry points for a presentation shell
//!
//! [`CustomerSegmentation`] is the whole surface a UI needs: add a customer,
//! run clustering, clear the data. Each call runs to completion on the
//! calling thread and reports failures as [`SegmentError`] values.
//!
//! [`SegmentError`]: crate::SegmentError

use std::path::PathBuf;

use tracing::instrument;

use crate::data::{validate_and_build, CustomerRecord, RawCustomerFields};
use crate::model::{ClusteringResult, EngineConfig, SegmentationEngine};
use crate::store::{ClearOutcome, RecordStore};

/// A record store paired with the engine that segments it.
#[derive(Debug, Clone)]
pub struct CustomerSegmentation {
    store: RecordStore,
    engine: SegmentationEngine,
}

impl CustomerSegmentation {
    pub fn new(store: RecordStore, engine: SegmentationEngine) -> Self {
        Self { store, engine }
    }

    /// Store at `path` with the default engine (k = 3, seed 42).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(
            RecordStore::new(path),
            SegmentationEngine::new(EngineConfig::default()),
        )
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn engine(&self) -> &SegmentationEngine {
        &self.engine
    }

    /// Validate raw input and append it. Nothing is written when validation
    /// fails.
    #[instrument(level = "debug", skip_all)]
    pub fn add_customer(&self, raw: &RawCustomerFields) -> crate::Result<CustomerRecord> {
        let record = validate_and_build(raw)?;
        self.store.append(&record)?;
        Ok(record)
    }

    /// Recompute the segmentation from the current store contents.
    pub fn run_clustering(&self) -> crate::Result<ClusteringResult> {
        self.engine.compute_clusters(&self.store)
    }

    /// Drop every stored customer, keeping the header.
    pub fn clear_customer_data(&self) -> crate::Result<ClearOutcome> {
        self.store.clear()
    }

    /// All stored customers in insertion order.
    pub fn customers(&self) -> crate::Result<Vec<CustomerRecord>> {
        self.store.load_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SegmentError;
    use tempfile::tempdir;

    #[test]
    fn test_add_customer_returns_stored_record() {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customers.csv"));

        let record = app
            .add_customer(&RawCustomerFields::new("Ada", "L", "12.5", "3", "24"))
            .unwrap();
        assert_eq!(app.customers().unwrap(), vec![record]);
    }

    #[test]
    fn test_rejected_input_does_not_create_store() {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customers.csv"));

        let result = app.add_customer(&RawCustomerFields::new("Ada", "L", "x", "3", "24"));
        assert!(matches!(result, Err(SegmentError::InvalidInput { .. })));
        assert!(!app.store().exists());
    }

    #[test]
    fn test_run_clustering_without_store() {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customers.csv"));

        assert!(matches!(
            app.run_clustering(),
            Err(SegmentError::InsufficientData { found: 0, .. })
        ));
        assert!(!app.store().exists());
    }

    #[test]
    fn test_clear_without_store() {
        let dir = tempdir().unwrap();
        let app = CustomerSegmentation::open(dir.path().join("customers.csv"));
        assert!(matches!(
            app.clear_customer_data(),
            Err(SegmentError::StoreMissing { .. })
        ));
    }
}
