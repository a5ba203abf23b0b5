//! Feature extraction for term deposit model inference.
//!
//! Turns a validated customer record into the raw feature frame the
//! artifact's preprocessing pipeline was fitted on. The training data carried
//! two columns the API does not collect; they are filled with fixed values.

use crate::models::frame::{ColumnKind, FeatureFrame};
use std::collections::BTreeMap;
use crate::types::customer::CustomerRecord;

/// Day of month assumed for every request
pub const DEFAULT_DAY: f64 = 1.0;

/// Days since previous contact; -1 means the customer was never contacted
pub const DEFAULT_PDAYS: f64 = -1.0;

/// Numeric columns produced, in this order
const NUMERIC_COLUMNS: [&str; 7] = [
    "age", "balance", "duration", "campaign", "previous", "day", "pdays",
];

/// Categorical columns produced, in this order
const CATEGORICAL_COLUMNS: [&str; 9] = [
    "job", "marital", "education", "default", "housing", "loan", "contact", "month", "poutcome",
];

/// Feature extractor that transforms customer records into feature frames.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the raw training columns from a record.
    pub fn extract(&self, record: &CustomerRecord) -> FeatureFrame {
        let mut frame = FeatureFrame::new();

        frame.set_numeric("age", record.age as f64);
        frame.set_numeric("balance", record.balance);
        frame.set_numeric("duration", record.duration as f64);
        frame.set_numeric("campaign", record.campaign as f64);
        frame.set_numeric("previous", record.previous as f64);
        frame.set_numeric("day", DEFAULT_DAY);
        frame.set_numeric("pdays", DEFAULT_PDAYS);

        frame.set_categorical("job", record.job.as_str());
        frame.set_categorical("marital", record.marital.as_str());
        frame.set_categorical("education", record.education.as_str());
        frame.set_categorical("default", record.default.as_str());
        frame.set_categorical("housing", record.housing.as_str());
        frame.set_categorical("loan", record.loan.as_str());
        frame.set_categorical("contact", record.contact.as_str());
        frame.set_categorical("month", record.month.as_str());
        frame.set_categorical("poutcome", record.poutcome.as_str());

        frame
    }

    /// Names and kinds of the columns `extract` produces.
    pub fn schema(&self) -> BTreeMap<String, ColumnKind> {
        let numeric = NUMERIC_COLUMNS.iter().map(|c| (c.to_string(), ColumnKind::Numeric));
        let categorical = CATEGORICAL_COLUMNS
            .iter()
            .map(|c| (c.to_string(), ColumnKind::Categorical));
        numeric.chain(categorical).collect()
    }

    /// Get the number of columns produced.
    pub fn feature_count(&self) -> usize {
        NUMERIC_COLUMNS.len() + CATEGORICAL_COLUMNS.len()
    }

    /// Get column names (numeric first, then categorical).
    pub fn feature_names(&self) -> Vec<&'static str> {
        NUMERIC_COLUMNS
            .iter()
            .chain(CATEGORICAL_COLUMNS.iter())
            .copied()
            .collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
