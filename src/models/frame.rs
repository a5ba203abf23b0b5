//! Single-row feature frame flowing through the preprocessing pipeline

use crate::error::InferenceError;
use std::collections::BTreeMap;

/// Kind of value a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Value held by one frame column
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Numeric(f64),
    Categorical(String),
}

/// One record as named columns.
///
/// Preprocessing steps add, replace and drop columns; the estimator then
/// reads the columns it was trained on, in its own order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    columns: BTreeMap<String, Cell>,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_numeric(&mut self, name: impl Into<String>, value: f64) {
        self.columns.insert(name.into(), Cell::Numeric(value));
    }

    pub fn set_categorical(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.columns
            .insert(name.into(), Cell::Categorical(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Cell> {
        self.columns.remove(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Read a numeric column
    pub fn numeric(&self, name: &str) -> Result<f64, InferenceError> {
        match self.columns.get(name) {
            Some(Cell::Numeric(v)) => Ok(*v),
            Some(Cell::Categorical(_)) => Err(InferenceError::ColumnKind {
                column: name.to_string(),
                expected: "numeric",
            }),
            None => Err(InferenceError::MissingColumn(name.to_string())),
        }
    }

    /// Read a categorical column
    pub fn categorical(&self, name: &str) -> Result<&str, InferenceError> {
        match self.columns.get(name) {
            Some(Cell::Categorical(v)) => Ok(v),
            Some(Cell::Numeric(_)) => Err(InferenceError::ColumnKind {
                column: name.to_string(),
                expected: "categorical",
            }),
            None => Err(InferenceError::MissingColumn(name.to_string())),
        }
    }

    /// Gather the named numeric columns into an estimator input vector
    pub fn to_vector(&self, features: &[String]) -> Result<Vec<f32>, InferenceError> {
        features
            .iter()
            .map(|name| {
                let value = self.numeric(name)? as f32;
                if !value.is_finite() {
                    return Err(InferenceError::NonFinite(name.clone()));
                }
                Ok(value)
            })
            .collect()
    }
}
