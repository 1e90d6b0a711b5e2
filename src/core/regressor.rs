use crate::domain::ports::Regressor;
use crate::utils::error::InferenceError;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Flat decision-tree node. A node without `feature` is a leaf.
///
/// Rows go left when `x[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default)]
    pub value: f64,
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: None,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
        }
    }

    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            feature: Some(feature),
            threshold,
            left,
            right,
            value: 0.0,
        }
    }
}

/// Fitted model as stored in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    DecisionTree {
        n_features: usize,
        nodes: Vec<TreeNode>,
    },
    /// Weighted average of member predictions. Equal weights when `weights` is absent.
    Voting {
        estimators: Vec<Model>,
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
}

impl Model {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Model::Linear { .. } => "linear",
            Model::DecisionTree { .. } => "decision_tree",
            Model::Voting { .. } => "voting",
        }
    }

    /// 檢查模型結構，載入時呼叫一次
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Model::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.is_empty() {
                    return Err("linear model has no coefficients".to_string());
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("linear model has non-finite parameters".to_string());
                }
            }
            Model::DecisionTree { n_features, nodes } => {
                if nodes.is_empty() {
                    return Err("decision tree has no nodes".to_string());
                }
                for (index, node) in nodes.iter().enumerate() {
                    if let Some(feature) = node.feature {
                        if feature >= *n_features {
                            return Err(format!(
                                "tree node {} splits on feature {} of {}",
                                index, feature, n_features
                            ));
                        }
                        // 子節點必須排在父節點之後，保證走訪會結束
                        for child in [node.left, node.right] {
                            if child <= index || child >= nodes.len() {
                                return Err(format!(
                                    "tree node {} has invalid child {}",
                                    index, child
                                ));
                            }
                        }
                    }
                }
            }
            Model::Voting {
                estimators,
                weights,
            } => {
                let first = estimators
                    .first()
                    .ok_or_else(|| "voting model has no estimators".to_string())?;
                for estimator in estimators {
                    estimator.validate()?;
                    if estimator.feature_count() != first.feature_count() {
                        return Err("voting estimators disagree on feature count".to_string());
                    }
                }
                if let Some(weights) = weights {
                    if weights.len() != estimators.len() {
                        return Err(format!(
                            "voting model has {} weights for {} estimators",
                            weights.len(),
                            estimators.len()
                        ));
                    }
                    let total: f64 = weights.iter().sum();
                    if !total.is_finite() || total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
                        return Err("voting weights must be non-negative with a positive sum".to_string());
                    }
                }
            }
        }
        Ok(())
    }

    fn feature_count(&self) -> usize {
        match self {
            Model::Linear { coefficients, .. } => coefficients.len(),
            Model::DecisionTree { n_features, .. } => *n_features,
            Model::Voting { estimators, .. } => {
                estimators.first().map(Model::feature_count).unwrap_or(0)
            }
        }
    }

    fn predict_rows(&self, features: &Array2<f64>) -> Vec<f64> {
        match self {
            Model::Linear {
                coefficients,
                intercept,
            } => {
                let coefficients = ArrayView1::from(coefficients.as_slice());
                features
                    .rows()
                    .into_iter()
                    .map(|row| row.dot(&coefficients) + intercept)
                    .collect()
            }
            Model::DecisionTree { nodes, .. } => features
                .rows()
                .into_iter()
                .map(|row| {
                    let mut index = 0;
                    loop {
                        let node = &nodes[index];
                        match node.feature {
                            Some(feature) if row[feature] <= node.threshold => index = node.left,
                            Some(_) => index = node.right,
                            None => break node.value,
                        }
                    }
                })
                .collect(),
            Model::Voting {
                estimators,
                weights,
            } => {
                let equal = vec![1.0; estimators.len()];
                let weights = weights.as_deref().unwrap_or(&equal);
                let total: f64 = weights.iter().sum();

                let mut blended = vec![0.0; features.nrows()];
                for (estimator, weight) in estimators.iter().zip(weights) {
                    for (acc, value) in blended.iter_mut().zip(estimator.predict_rows(features)) {
                        *acc += weight * value;
                    }
                }
                blended.into_iter().map(|v| v / total).collect()
            }
        }
    }
}

impl Regressor for Model {
    fn n_features(&self) -> usize {
        self.feature_count()
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, InferenceError> {
        let expected = self.feature_count();
        if features.ncols() != expected {
            return Err(InferenceError::ShapeMismatch {
                expected,
                actual: features.ncols(),
            });
        }
        Ok(self.predict_rows(features))
    }

    fn describe(&self) -> String {
        match self {
            Model::Voting { estimators, .. } => {
                let members: Vec<&str> = estimators.iter().map(Model::kind_name).collect();
                format!("voting[{}]", members.join(", "))
            }
            other => other.kind_name().to_string(),
        }
    }
}
