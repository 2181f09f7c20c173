//! customer-segmenter: record customer purchase behaviour and segment
//! customers with K-Means clustering.
//!
//! Records live in an append-only CSV store. Clustering uses three features
//! per customer (average purchase value, purchase frequency, customer
//! lifespan) and a fixed seed, so the same data always yields the same
//! labels.

pub mod app;
pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod store;
pub mod viz;

// Re-export public items for easier access
pub use app::CustomerSegmentation;
pub use cli::{Args, Command};
pub use data::{validate_and_build, CustomerRecord, RawCustomerFields, HEADER};
pub use error::SegmentError;
pub use model::{ClusteringResult, EngineConfig, SegmentationEngine, MIN_RECORDS};
pub use store::{ClearOutcome, RecordStore};
pub use viz::create_cluster_visualization;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, SegmentError>;
