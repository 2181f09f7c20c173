//! K-Means segmentation of stored customers

use std::collections::HashMap;

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

use crate::data::{feature_matrix, CustomerRecord, N_FEATURES};
use crate::error::SegmentError;
use crate::store::RecordStore;

/// Fewest records clustering will run on.
pub const MIN_RECORDS: usize = 2;

/// Largest absolute feature value the fit accepts. Squared distances across
/// the full range stay well inside `f64`.
pub const MAX_FEATURE_MAGNITUDE: f64 = 1e100;

/// Smallest non-zero absolute feature value the fit accepts.
pub const MIN_FEATURE_MAGNITUDE: f64 = 1e-100;

/// Fit parameters for [`SegmentationEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of clusters (k)
    pub n_clusters: usize,
    /// Seed for centroid initialisation, reused on every fit
    pub seed: u64,
    /// Maximum Lloyd iterations per run
    pub max_iterations: u64,
    /// Convergence tolerance on centroid movement
    pub tolerance: f64,
    /// Independent initialisations; the lowest-inertia run wins
    pub n_runs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }
}

impl EngineConfig {
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> crate::Result<()> {
        if self.n_clusters == 0 {
            return Err(SegmentError::clustering("number of clusters must be at least 1"));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(SegmentError::clustering(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 || self.n_runs == 0 {
            return Err(SegmentError::clustering(
                "max_iterations and n_runs must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Labels and features from one clustering pass. Not persisted.
#[derive(Debug, Clone)]
pub struct ClusteringResult {
    /// Records in load order
    pub records: Vec<CustomerRecord>,
    /// (n_records, 3): average purchase value, frequency, lifespan
    pub features: Array2<f64>,
    /// Cluster label per record, each `< n_clusters`
    pub labels: Vec<usize>,
    /// One row per occupied cluster label, in label order
    pub centroids: Array2<f64>,
    /// Number of clusters targeted
    pub n_clusters: usize,
    /// Within-cluster sum of squares
    pub inertia: f64,
}

impl ClusteringResult {
    /// Record count per cluster label; empty clusters count zero.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Clusters with no members, which happens when there are fewer
    /// distinct customers than clusters.
    pub fn empty_clusters(&self) -> usize {
        self.cluster_sizes().iter().filter(|&&size| size == 0).count()
    }
}

/// Partitions customers into `n_clusters` segments with K-Means.
#[derive(Debug, Clone, Default)]
pub struct SegmentationEngine {
    config: EngineConfig,
}

impl SegmentationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load every stored record and cluster them.
    ///
    /// A missing store, or one with fewer than [`MIN_RECORDS`] records, is
    /// [`SegmentError::InsufficientData`]. Any other failure is reported as
    /// [`SegmentError::Clustering`] with its cause.
    #[instrument(level = "debug", skip(self, store), fields(path = %store.path().display()))]
    pub fn compute_clusters(&self, store: &RecordStore) -> crate::Result<ClusteringResult> {
        let records = match store.load_all() {
            Ok(records) => records,
            Err(SegmentError::StoreMissing { .. }) => {
                return Err(SegmentError::InsufficientData {
                    found: 0,
                    required: MIN_RECORDS,
                })
            }
            Err(e) => return Err(SegmentError::clustering(e.to_string())),
        };
        debug!(?records, "loaded customer data");

        self.fit(records)
    }

    /// Cluster an in-memory set of records.
    pub fn fit(&self, records: Vec<CustomerRecord>) -> crate::Result<ClusteringResult> {
        if records.len() < MIN_RECORDS {
            return Err(SegmentError::InsufficientData {
                found: records.len(),
                required: MIN_RECORDS,
            });
        }
        self.config.validate()?;

        let features = feature_matrix(&records)?;
        let n_clusters = self.config.n_clusters;

        check_feature_range(&features)?;

        let (distinct_labels, distinct_centroids) = assign_distinct(&features);
        let (labels, centroids) = if distinct_centroids.nrows() < n_clusters {
            warn!(
                records = records.len(),
                distinct = distinct_centroids.nrows(),
                n_clusters,
                "fewer distinct customers than clusters, some clusters will be empty"
            );
            (distinct_labels, distinct_centroids)
        } else {
            self.fit_kmeans(&features)?
        };

        let inertia = compute_inertia(&features, &labels, &centroids);
        let result = ClusteringResult {
            records,
            features,
            labels,
            centroids,
            n_clusters,
            inertia,
        };

        info!(
            customers = result.labels.len(),
            n_clusters,
            inertia = result.inertia,
            sizes = ?result.cluster_sizes(),
            "clustering complete"
        );
        Ok(result)
    }

    fn fit_kmeans(&self, features: &Array2<f64>) -> crate::Result<(Vec<usize>, Array2<f64>)> {
        let n_samples = features.nrows();
        let targets: Array1<usize> = Array1::zeros(n_samples); // unsupervised, targets unused
        let dataset = Dataset::new(features.clone(), targets);

        let rng = StdRng::seed_from_u64(self.config.seed);
        let model = KMeans::params_with(self.config.n_clusters, rng, L2Dist)
            .max_n_iterations(self.config.max_iterations)
            .tolerance(self.config.tolerance)
            .n_runs(self.config.n_runs)
            .fit(&dataset)
            .map_err(|e| SegmentError::clustering(e.to_string()))?;

        let labels: Array1<usize> = model.predict(&dataset);
        Ok((labels.to_vec(), model.centroids().clone()))
    }
}

/// Reject features whose squared Euclidean distances would overflow to
/// infinity or underflow to zero; k-means++ cannot weight such points.
fn check_feature_range(features: &Array2<f64>) -> crate::Result<()> {
    for &value in features.iter() {
        let magnitude = value.abs();
        if !value.is_finite() || magnitude > MAX_FEATURE_MAGNITUDE {
            return Err(SegmentError::clustering(format!(
                "feature value {value:e} is too large for Euclidean distance (limit {MAX_FEATURE_MAGNITUDE:e})"
            )));
        }
        if magnitude != 0.0 && magnitude < MIN_FEATURE_MAGNITUDE {
            return Err(SegmentError::clustering(format!(
                "feature value {value:e} is too small for Euclidean distance (limit {MIN_FEATURE_MAGNITUDE:e})"
            )));
        }
    }
    Ok(())
}

/// Give every distinct row its own label, in first-appearance order.
/// Returns the labels and one centroid row per distinct point.
fn assign_distinct(features: &Array2<f64>) -> (Vec<usize>, Array2<f64>) {
    let mut seen: HashMap<[u64; N_FEATURES], usize> = HashMap::new();
    let mut centroid_data = Vec::new();
    let mut labels = Vec::with_capacity(features.nrows());

    for row in features.outer_iter() {
        let next = seen.len();
        let label = *seen.entry(row_key(row.iter().copied())).or_insert_with(|| {
            centroid_data.extend(row.iter().copied());
            next
        });
        labels.push(label);
    }

    let centroids = Array2::from_shape_vec((seen.len(), N_FEATURES), centroid_data)
        .unwrap_or_else(|_| Array2::zeros((0, N_FEATURES)));
    (labels, centroids)
}

fn row_key(values: impl Iterator<Item = f64>) -> [u64; N_FEATURES] {
    let mut key = [0u64; N_FEATURES];
    for (slot, value) in key.iter_mut().zip(values) {
        // -0.0 and 0.0 are the same point
        *slot = if value == 0.0 { 0 } else { value.to_bits() };
    }
    key
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    let mut inertia = 0.0;

    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let point = features.row(i);
            let centroid = centroids.row(cluster);
            inertia += point
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
        }
    }

    inertia
}
