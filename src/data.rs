//! Customer records, raw-input validation and feature extraction

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::SegmentError;

/// Column names of the store header, in file order.
pub const HEADER: [&str; 5] = [
    "First Name",
    "Last Name",
    "Average Purchase Value",
    "Purchase Frequency",
    "Customer Lifespan",
];

/// Number of numeric features per record used for clustering.
pub const N_FEATURES: usize = 3;

/// One persisted customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Average Purchase Value")]
    pub avg_purchase_value: f64,
    #[serde(rename = "Purchase Frequency")]
    pub purchase_frequency: i64,
    /// Time units are left to the operator
    #[serde(rename = "Customer Lifespan")]
    pub customer_lifespan: i64,
}

impl CustomerRecord {
    /// Clustering features in fixed order: average purchase value,
    /// purchase frequency, customer lifespan.
    pub fn features(&self) -> [f64; N_FEATURES] {
        [
            self.avg_purchase_value,
            self.purchase_frequency as f64,
            self.customer_lifespan as f64,
        ]
    }
}

/// Unparsed text for the five customer fields, as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCustomerFields {
    pub first_name: String,
    pub last_name: String,
    pub avg_purchase_value: String,
    pub purchase_frequency: String,
    pub customer_lifespan: String,
}

impl RawCustomerFields {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        avg_purchase_value: impl Into<String>,
        purchase_frequency: impl Into<String>,
        customer_lifespan: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            avg_purchase_value: avg_purchase_value.into(),
            purchase_frequency: purchase_frequency.into(),
            customer_lifespan: customer_lifespan.into(),
        }
    }
}

/// Parse and type-check raw fields into a [`CustomerRecord`].
///
/// Names are kept verbatim. The three numeric fields ignore surrounding
/// whitespace; an empty, non-numeric or non-finite value fails with
/// [`SegmentError::InvalidInput`]. Nothing is written here, so a failed
/// validation can never leave a partial row behind.
pub fn validate_and_build(raw: &RawCustomerFields) -> crate::Result<CustomerRecord> {
    let avg_purchase_value = parse_real(HEADER[2], &raw.avg_purchase_value)?;
    let purchase_frequency = parse_integer(HEADER[3], &raw.purchase_frequency)?;
    let customer_lifespan = parse_integer(HEADER[4], &raw.customer_lifespan)?;

    Ok(CustomerRecord {
        first_name: raw.first_name.clone(),
        last_name: raw.last_name.clone(),
        avg_purchase_value,
        purchase_frequency,
        customer_lifespan,
    })
}

fn parse_real(field: &'static str, value: &str) -> crate::Result<f64> {
    let trimmed = require_value(field, value)?;
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| invalid(field, value, "expected a number"))?;
    if !parsed.is_finite() {
        return Err(invalid(field, value, "must be a finite number"));
    }
    Ok(parsed)
}

fn parse_integer(field: &'static str, value: &str) -> crate::Result<i64> {
    let trimmed = require_value(field, value)?;
    trimmed
        .parse()
        .map_err(|_| invalid(field, value, "expected a whole number"))
}

fn require_value<'a>(field: &'static str, value: &'a str) -> crate::Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, value, "a value is required"));
    }
    Ok(trimmed)
}

fn invalid(field: &'static str, value: &str, reason: &str) -> SegmentError {
    SegmentError::InvalidInput {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Build the (n_records, 3) feature matrix, one row per record in order.
pub fn feature_matrix(records: &[CustomerRecord]) -> crate::Result<Array2<f64>> {
    let mut raw_data = Vec::with_capacity(records.len() * N_FEATURES);
    for record in records {
        raw_data.extend_from_slice(&record.features());
    }

    Array2::from_shape_vec((records.len(), N_FEATURES), raw_data)
        .map_err(|e| SegmentError::clustering(format!("failed to build feature matrix: {e}")))
}
