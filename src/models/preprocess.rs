//! Preprocessing components referenced by model artifacts.
//!
//! These are the transformers the training pipeline was fitted with. An
//! artifact can only name components listed in [`Transformer::NAMES`]; they
//! are compiled into the binary rather than looked up at load time.

use crate::error::{ArtifactError, InferenceError};
use crate::models::frame::{ColumnKind, FeatureFrame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Policy for categories not seen during fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Encode as all zeros
    #[default]
    Ignore,
    /// Fail the request
    Error,
}

/// A fitted preprocessing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transformer {
    /// `sign(x) * ln(1 + |x|)`
    SignedLog1p { columns: Vec<String> },

    /// Clamp into `[min, max]`; either bound may be omitted
    Clip {
        columns: Vec<String>,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },

    /// `(x - mean) / scale` per column
    StandardScale {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },

    /// Replace a categorical column with `<column>_<category>` indicators
    OneHot {
        column: String,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },

    /// Replace a categorical column with its category index
    Ordinal {
        column: String,
        categories: Vec<String>,
    },

    /// Set a numeric column when absent
    Fill { column: String, value: f64 },

    /// Remove columns
    Drop { columns: Vec<String> },
}

impl Transformer {
    /// Components this binary can resolve
    pub const NAMES: &'static [&'static str] = &[
        "signed_log1p",
        "clip",
        "standard_scale",
        "one_hot",
        "ordinal",
        "fill",
        "drop",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Transformer::SignedLog1p { .. } => "signed_log1p",
            Transformer::Clip { .. } => "clip",
            Transformer::StandardScale { .. } => "standard_scale",
            Transformer::OneHot { .. } => "one_hot",
            Transformer::Ordinal { .. } => "ordinal",
            Transformer::Fill { .. } => "fill",
            Transformer::Drop { .. } => "drop",
        }
    }

    /// Check the fitted parameters are usable
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let name = self.name();
        let invalid = |msg: String| Err(ArtifactError::Invalid(format!("{}: {}", name, msg)));

        match self {
            Transformer::SignedLog1p { columns } | Transformer::Drop { columns } => {
                if columns.is_empty() {
                    return invalid("no columns".into());
                }
            }
            Transformer::Clip { columns, min, max } => {
                if columns.is_empty() {
                    return invalid("no columns".into());
                }
                if min.is_none() && max.is_none() {
                    return invalid("neither min nor max given".into());
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return invalid(format!("min {} exceeds max {}", lo, hi));
                    }
                }
                if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
                    return invalid("bounds must be finite".into());
                }
            }
            Transformer::StandardScale {
                columns,
                mean,
                scale,
            } => {
                if columns.is_empty() {
                    return invalid("no columns".into());
                }
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return invalid(format!(
                        "{} columns but {} means and {} scales",
                        columns.len(),
                        mean.len(),
                        scale.len()
                    ));
                }
                if mean.iter().any(|v| !v.is_finite()) {
                    return invalid("means must be finite".into());
                }
                if scale.iter().any(|v| *v == 0.0 || !v.is_finite()) {
                    return invalid("scales must be finite and non-zero".into());
                }
            }
            Transformer::OneHot {
                column, categories, ..
            }
            | Transformer::Ordinal { column, categories } => {
                if categories.is_empty() {
                    return invalid(format!("no categories for `{}`", column));
                }
                let mut seen = std::collections::HashSet::new();
                if let Some(dup) = categories.iter().find(|c| !seen.insert(c.as_str())) {
                    return invalid(format!("duplicate category `{}` for `{}`", dup, column));
                }
            }
            Transformer::Fill { value, .. } => {
                if !value.is_finite() {
                    return invalid("fill value must be finite".into());
                }
            }
        }
        Ok(())
    }

    /// Track column names and kinds through this step without values.
    ///
    /// Mirrors [`Transformer::apply`] so that a pipeline whose steps can
    /// never find their inputs is rejected at load time.
    pub fn propagate(
        &self,
        schema: &mut BTreeMap<String, ColumnKind>,
    ) -> Result<(), ArtifactError> {
        let name = self.name();
        let expect = |schema: &BTreeMap<String, ColumnKind>, column: &str, kind: ColumnKind| {
            match schema.get(column) {
                Some(found) if *found == kind => Ok(()),
                Some(found) => Err(ArtifactError::Invalid(format!(
                    "{}: column `{}` is {:?}, expected {:?}",
                    name, column, found, kind
                ))),
                None => Err(ArtifactError::Invalid(format!(
                    "{}: column `{}` does not exist at this step",
                    name, column
                ))),
            }
        };

        match self {
            Transformer::SignedLog1p { columns }
            | Transformer::Clip { columns, .. }
            | Transformer::StandardScale { columns, .. } => {
                for column in columns {
                    expect(schema, column, ColumnKind::Numeric)?;
                }
            }
            Transformer::OneHot {
                column, categories, ..
            } => {
                expect(schema, column, ColumnKind::Categorical)?;
                schema.remove(column);
                for category in categories {
                    schema.insert(format!("{}_{}", column, category), ColumnKind::Numeric);
                }
            }
            Transformer::Ordinal { column, .. } => {
                expect(schema, column, ColumnKind::Categorical)?;
                schema.insert(column.clone(), ColumnKind::Numeric);
            }
            Transformer::Fill { column, .. } => {
                schema.entry(column.clone()).or_insert(ColumnKind::Numeric);
            }
            Transformer::Drop { columns } => {
                for column in columns {
                    schema.remove(column);
                }
            }
        }
        Ok(())
    }

    /// Apply the step to a frame in place
    pub fn apply(&self, frame: &mut FeatureFrame) -> Result<(), InferenceError> {
        match self {
            Transformer::SignedLog1p { columns } => {
                for column in columns {
                    let x = frame.numeric(column)?;
                    frame.set_numeric(column.as_str(), x.signum() * x.abs().ln_1p());
                }
            }
            Transformer::Clip { columns, min, max } => {
                for column in columns {
                    let mut x = frame.numeric(column)?;
                    if let Some(lo) = min {
                        x = x.max(*lo);
                    }
                    if let Some(hi) = max {
                        x = x.min(*hi);
                    }
                    frame.set_numeric(column.as_str(), x);
                }
            }
            Transformer::StandardScale {
                columns,
                mean,
                scale,
            } => {
                for ((column, mu), sigma) in columns.iter().zip(mean).zip(scale) {
                    let x = frame.numeric(column)?;
                    frame.set_numeric(column.as_str(), (x - mu) / sigma);
                }
            }
            Transformer::OneHot {
                column,
                categories,
                handle_unknown,
            } => {
                let value = frame.categorical(column)?.to_string();
                if *handle_unknown == HandleUnknown::Error && !categories.contains(&value) {
                    return Err(InferenceError::UnknownCategory {
                        column: column.clone(),
                        value,
                    });
                }
                frame.remove(column);
                for category in categories {
                    let hit = if *category == value { 1.0 } else { 0.0 };
                    frame.set_numeric(format!("{}_{}", column, category), hit);
                }
            }
            Transformer::Ordinal { column, categories } => {
                let value = frame.categorical(column)?;
                let index = categories.iter().position(|c| c == value).ok_or_else(|| {
                    InferenceError::UnknownCategory {
                        column: column.clone(),
                        value: value.to_string(),
                    }
                })?;
                frame.set_numeric(column.as_str(), index as f64);
            }
            Transformer::Fill { column, value } => {
                if !frame.contains(column) {
                    frame.set_numeric(column.as_str(), *value);
                }
            }
            Transformer::Drop { columns } => {
                for column in columns {
                    frame.remove(column);
                }
            }
        }
        Ok(())
    }
}

/// Ordered preprocessing pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    #[serde(default)]
    pub steps: Vec<Transformer>,
}

impl Preprocessor {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.steps.iter().try_for_each(Transformer::validate)
    }

    /// Run every step over a copy of the frame
    pub fn transform(&self, frame: &FeatureFrame) -> Result<FeatureFrame, InferenceError> {
        let mut out = frame.clone();
        for step in &self.steps {
            step.apply(&mut out)?;
        }
        Ok(out)
    }

    /// Columns and kinds the pipeline produces from `input`
    pub fn output_schema(
        &self,
        mut input: BTreeMap<String, ColumnKind>,
    ) -> Result<BTreeMap<String, ColumnKind>, ArtifactError> {
        for step in &self.steps {
            step.propagate(&mut input)?;
        }
        Ok(input)
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FeatureFrame {
        let mut frame = FeatureFrame::new();
        frame.set_numeric("balance", 1500.0);
        frame.set_numeric("campaign", 63.0);
        frame.set_categorical("contact", "cellular");
        frame
    }

    #[test]
    fn test_signed_log1p() {
        let mut f = frame();
        f.set_numeric("debt", -99.0);
        Transformer::SignedLog1p {
            columns: vec!["balance".into(), "debt".into()],
        }
        .apply(&mut f)
        .unwrap();

        assert!((f.numeric("balance").unwrap() - 1501.0_f64.ln()).abs() < 1e-12);
        assert!((f.numeric("debt").unwrap() + 100.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_clip() {
        let mut f = frame();
        Transformer::Clip {
            columns: vec!["campaign".into()],
            min: Some(1.0),
            max: Some(20.0),
        }
        .apply(&mut f)
        .unwrap();
        assert_eq!(f.numeric("campaign").unwrap(), 20.0);
    }

    #[test]
    fn test_standard_scale() {
        let mut f = frame();
        Transformer::StandardScale {
            columns: vec!["balance".into()],
            mean: vec![1000.0],
            scale: vec![250.0],
        }
        .apply(&mut f)
        .unwrap();
        assert_eq!(f.numeric("balance").unwrap(), 2.0);
    }

    #[test]
    fn test_one_hot_replaces_column() {
        let mut f = frame();
        Transformer::OneHot {
            column: "contact".into(),
            categories: vec!["cellular".into(), "telephone".into(), "unknown".into()],
            handle_unknown: HandleUnknown::Ignore,
        }
        .apply(&mut f)
        .unwrap();

        assert!(!f.contains("contact"));
        assert_eq!(f.numeric("contact_cellular").unwrap(), 1.0);
        assert_eq!(f.numeric("contact_telephone").unwrap(), 0.0);
        assert_eq!(f.numeric("contact_unknown").unwrap(), 0.0);
    }

    #[test]
    fn test_one_hot_unknown_category() {
        let step = |handle_unknown| Transformer::OneHot {
            column: "contact".into(),
            categories: vec!["telephone".into()],
            handle_unknown,
        };

        let mut f = frame();
        step(HandleUnknown::Ignore).apply(&mut f).unwrap();
        assert_eq!(f.numeric("contact_telephone").unwrap(), 0.0);

        let mut f = frame();
        assert!(matches!(
            step(HandleUnknown::Error).apply(&mut f),
            Err(InferenceError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_ordinal() {
        let mut f = frame();
        Transformer::Ordinal {
            column: "contact".into(),
            categories: vec!["unknown".into(), "telephone".into(), "cellular".into()],
        }
        .apply(&mut f)
        .unwrap();
        assert_eq!(f.numeric("contact").unwrap(), 2.0);
    }

    #[test]
    fn test_fill_and_drop() {
        let mut f = frame();
        let pipeline = Preprocessor {
            steps: vec![
                Transformer::Fill {
                    column: "pdays".into(),
                    value: -1.0,
                },
                Transformer::Fill {
                    column: "balance".into(),
                    value: 0.0,
                },
                Transformer::Drop {
                    columns: vec!["campaign".into()],
                },
            ],
        };
        f = pipeline.transform(&f).unwrap();

        assert_eq!(f.numeric("pdays").unwrap(), -1.0);
        assert_eq!(f.numeric("balance").unwrap(), 1500.0);
        assert!(!f.contains("campaign"));
    }

    #[test]
    fn test_missing_column_fails() {
        let f = frame();
        let pipeline = Preprocessor {
            steps: vec![Transformer::SignedLog1p {
                columns: vec!["salary".into()],
            }],
        };
        assert!(matches!(
            pipeline.transform(&f),
            Err(InferenceError::MissingColumn(c)) if c == "salary"
        ));
    }

    #[test]
    fn test_deserialize_tagged_step() {
        let step: Transformer = serde_json::from_str(
            r#"{"type": "one_hot", "column": "loan", "categories": ["no", "yes"]}"#,
        )
        .unwrap();
        assert_eq!(step.name(), "one_hot");
        assert!(matches!(
            step,
            Transformer::OneHot {
                handle_unknown: HandleUnknown::Ignore,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let zero_scale = Transformer::StandardScale {
            columns: vec!["age".into()],
            mean: vec![40.0],
            scale: vec![0.0],
        };
        assert!(zero_scale.validate().is_err());

        let duplicate = Transformer::OneHot {
            column: "loan".into(),
            categories: vec!["no".into(), "no".into()],
            handle_unknown: HandleUnknown::Ignore,
        };
        assert!(duplicate.validate().is_err());

        let inverted = Transformer::Clip {
            columns: vec!["age".into()],
            min: Some(10.0),
            max: Some(1.0),
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_names_cover_every_variant() {
        let steps = [
            Transformer::SignedLog1p { columns: vec![] },
            Transformer::Clip {
                columns: vec![],
                min: None,
                max: None,
            },
            Transformer::StandardScale {
                columns: vec![],
                mean: vec![],
                scale: vec![],
            },
            Transformer::OneHot {
                column: String::new(),
                categories: vec![],
                handle_unknown: HandleUnknown::Ignore,
            },
            Transformer::Ordinal {
                column: String::new(),
                categories: vec![],
            },
            Transformer::Fill {
                column: String::new(),
                value: 0.0,
            },
            Transformer::Drop { columns: vec![] },
        ];
        for step in &steps {
            assert!(Transformer::NAMES.contains(&step.name()));
        }
        assert_eq!(steps.len(), Transformer::NAMES.len());
    }

    #[test]
    fn test_output_schema_tracks_columns() {
        let input = BTreeMap::from([
            ("balance".to_string(), ColumnKind::Numeric),
            ("contact".to_string(), ColumnKind::Categorical),
            ("month".to_string(), ColumnKind::Categorical),
        ]);
        let pipeline = Preprocessor {
            steps: vec![
                Transformer::OneHot {
                    column: "contact".into(),
                    categories: vec!["cellular".into(), "unknown".into()],
                    handle_unknown: HandleUnknown::Ignore,
                },
                Transformer::Ordinal {
                    column: "month".into(),
                    categories: vec!["jan".into(), "feb".into()],
                },
                Transformer::Fill {
                    column: "pdays".into(),
                    value: -1.0,
                },
                Transformer::Drop {
                    columns: vec!["balance".into()],
                },
            ],
        };

        let schema = pipeline.output_schema(input).unwrap();
        let names: Vec<&str> = schema.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["contact_cellular", "contact_unknown", "month", "pdays"]
        );
        assert!(schema.values().all(|k| *k == ColumnKind::Numeric));
    }

    #[test]
    fn test_output_schema_rejects_unreachable_input() {
        let input = BTreeMap::from([("contact".to_string(), ColumnKind::Categorical)]);

        let scale_categorical = Preprocessor {
            steps: vec![Transformer::SignedLog1p {
                columns: vec!["contact".into()],
            }],
        };
        assert!(scale_categorical.output_schema(input.clone()).is_err());

        let encode_dropped = Preprocessor {
            steps: vec![
                Transformer::Drop {
                    columns: vec!["contact".into()],
                },
                Transformer::Ordinal {
                    column: "contact".into(),
                    categories: vec!["cellular".into()],
                },
            ],
        };
        assert!(matches!(
            encode_dropped.output_schema(input),
            Err(ArtifactError::Invalid(_))
        ));
    }
}
