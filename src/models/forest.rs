//! Random forest classifier in scikit-learn's flat tree layout

use crate::error::{ArtifactError, InferenceError};
use crate::models::estimator::Estimator;
use serde::{Deserialize, Serialize};

/// Tree node. Splits send a sample left when `x[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// One fitted decision tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Check structure and normalise leaf weights into probabilities.
    ///
    /// Children must come after their parent, which rules out cycles and
    /// bounds every traversal by the node count.
    fn prepare(
        mut self,
        n_features: usize,
        n_classes: usize,
        index: usize,
    ) -> Result<Self, ArtifactError> {
        let invalid = |node: usize, msg: String| {
            ArtifactError::Invalid(format!("tree {} node {}: {}", index, node, msg))
        };

        if self.nodes.is_empty() {
            return Err(ArtifactError::Invalid(format!("tree {} has no nodes", index)));
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        let msg = format!("feature index {} out of range", feature);
                        return Err(invalid(i, msg));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(i, "threshold is not finite".into()));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= len {
                            let msg = format!("child {} out of order or range", child);
                            return Err(invalid(i, msg));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(invalid(
                            i,
                            format!("{} leaf values for {} classes", value.len(), n_classes),
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        let msg = "leaf values must be finite and non-negative";
                        return Err(invalid(i, msg.into()));
                    }
                    let total: f64 = value.iter().sum();
                    if total <= 0.0 {
                        return Err(invalid(i, "leaf values sum to zero".into()));
                    }
                    value.iter_mut().for_each(|v| *v /= total);
                }
            }
        }
        Ok(self)
    }

    /// Walk from the root to a leaf and return its class probabilities
    pub fn leaf(&self, features: &[f32]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if (features[*feature] as f64) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}

/// Averaging ensemble of decision trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    features: Vec<String>,
    trees: Vec<Tree>,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(
        features: Vec<String>,
        trees: Vec<Tree>,
        n_classes: usize,
    ) -> Result<Self, ArtifactError> {
        if trees.is_empty() {
            return Err(ArtifactError::Invalid("random_forest has no trees".into()));
        }
        if features.is_empty() {
            return Err(ArtifactError::Invalid("random_forest has no features".into()));
        }
        let n_features = features.len();
        let trees = trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| tree.prepare(n_features, n_classes, i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            features,
            trees,
            n_classes,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Estimator for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.features.len() {
            return Err(InferenceError::OutputShape {
                found: features.len(),
                expected: self.features.len(),
            });
        }

        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.leaf(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n);
        Ok(probs)
    }
}
