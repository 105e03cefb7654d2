//! XGBoost JSON model format and tree ensemble evaluation.
//!
//! Reads the document written by `Booster.save_model("*.json")`. Only the
//! parts needed for inference are deserialized: the tree arrays, the base
//! score, the objective and the `best_iteration` attribute left behind by
//! early stopping.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::{Classifier, ModelError};

// ============================================================================
// On-disk format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: LearnerFile,
}

#[derive(Debug, Deserialize)]
struct LearnerFile {
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: BoosterFile,
    learner_model_param: LearnerParamFile,
    objective: ObjectiveFile,
}

#[derive(Debug, Deserialize)]
struct BoosterFile {
    name: String,
    #[serde(default)]
    model: Option<GbTreeFile>,
}

#[derive(Debug, Deserialize)]
struct GbTreeFile {
    #[serde(default)]
    gbtree_model_param: Option<GbTreeParamFile>,
    trees: Vec<TreeFile>,
}

#[derive(Debug, Deserialize)]
struct GbTreeParamFile {
    #[serde(default)]
    num_parallel_tree: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeFile {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<i64>,
}

/// Older writers emit `default_left` as 0/1, newer ones as booleans.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LearnerParamFile {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveFile {
    name: String,
}

// ============================================================================
// Trees
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_file(index: usize, raw: TreeFile) -> Result<Self, ModelError> {
        let n = raw.left_children.len();
        if n == 0 {
            return Err(ModelError::malformed(index, "tree has no nodes"));
        }

        let lengths = [
            raw.right_children.len(),
            raw.split_indices.len(),
            raw.split_conditions.len(),
            raw.default_left.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(ModelError::malformed(index, "node arrays differ in length"));
        }
        if raw.split_type.iter().any(|&t| t != 0) {
            return Err(ModelError::Unsupported("categorical splits".into()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            if raw.left_children[i] == -1 {
                nodes.push(Node::Leaf(raw.split_conditions[i]));
                continue;
            }

            // Children are always allocated after their parent, which also
            // guarantees traversal terminates.
            let child = |c: i64| -> Result<usize, ModelError> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| ModelError::malformed(index, format!("node {i} has invalid child {c}")))
            };
            let feature = usize::try_from(raw.split_indices[i])
                .map_err(|_| ModelError::malformed(index, format!("node {i} has negative split index")))?;

            nodes.push(Node::Split {
                feature,
                threshold: raw.split_conditions[i],
                left: child(raw.left_children[i])?,
                right: child(raw.right_children[i])?,
                default_left: raw.default_left[i].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    /// Walks from the root to a leaf. NaN follows the split's default branch.
    fn leaf_value(&self, row: &[f64]) -> Result<f32, ModelError> {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return Ok(value),
                Node::Split { feature, threshold, left, right, default_left } => {
                    let value = *row
                        .get(feature)
                        .ok_or(ModelError::FeatureMismatch { index: feature, len: row.len() })?;
                    idx = if value.is_nan() {
                        if default_left { left } else { right }
                    } else if (value as f32) < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// Objectives whose output is a positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `binary:logistic`
    BinaryLogistic,
    /// `reg:logistic`
    RegLogistic,
}

impl Objective {
    fn parse(name: &str) -> Result<Self, ModelError> {
        match name {
            "binary:logistic" => Ok(Self::BinaryLogistic),
            "reg:logistic" => Ok(Self::RegLogistic),
            other => Err(ModelError::Unsupported(format!("objective '{other}'"))),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BinaryLogistic => "binary:logistic",
            Self::RegLogistic => "reg:logistic",
        };
        write!(f, "{}", s)
    }
}

/// Gradient-boosted tree ensemble loaded from an XGBoost JSON model.
#[derive(Debug, Clone)]
pub struct XgbModel {
    trees: Vec<Tree>,
    base_margin: f32,
    objective: Objective,
    num_features: Option<usize>,
    feature_names: Vec<String>,
}

impl XgbModel {
    /// Loads a model from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ModelError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parses a model from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(json)?;
        let learner = file.learner;

        let booster = learner.gradient_booster;
        if booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!("booster '{}'", booster.name)));
        }
        let gbtree = booster
            .model
            .ok_or_else(|| ModelError::Unsupported("gbtree without model section".into()))?;

        let params = learner.learner_model_param;
        let num_class = parse_count("num_class", params.num_class.as_deref())?.unwrap_or(0);
        if num_class > 1 {
            return Err(ModelError::Unsupported(format!("{num_class}-class model")));
        }

        let objective = Objective::parse(&learner.objective.name)?;
        let base_score = parse_base_score(&params.base_score)?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(ModelError::InvalidParam {
                name: "base_score",
                value: params.base_score,
            });
        }

        let mut trees = gbtree
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_file(i, raw))
            .collect::<Result<Vec<_>, _>>()?;

        // Early stopping leaves extra rounds in the file; prediction uses the
        // best round only.
        if let Some(best) = learner.attributes.get("best_iteration").and_then(|s| s.parse::<usize>().ok()) {
            let per_round = gbtree
                .gbtree_model_param
                .and_then(|p| p.num_parallel_tree)
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            let limit = (best + 1).saturating_mul(per_round);
            if limit < trees.len() {
                debug!("Truncating {} trees to best iteration {} ({} trees)", trees.len(), best, limit);
                trees.truncate(limit);
            }
        }

        let num_features = parse_count("num_feature", params.num_feature.as_deref())?.filter(|&n| n > 0);

        Ok(Self {
            trees,
            base_margin: (base_score / (1.0 - base_score)).ln(),
            objective,
            num_features,
            feature_names: learner.feature_names,
        })
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw score before the logistic link.
    pub fn margin(&self, row: &[f64]) -> Result<f32, ModelError> {
        self.trees
            .iter()
            .try_fold(self.base_margin, |acc, tree| -> Result<f32, ModelError> {
                Ok(acc + tree.leaf_value(row)?)
            })
    }
}

impl Classifier for XgbModel {
    fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
        let margin = self.margin(row)?;
        Ok(f64::from(sigmoid(margin)))
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn describe(&self) -> String {
        format!("xgboost {} ({} trees)", self.objective, self.trees.len())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Accepts both `"5E-1"` and the vector form `"[5E-1]"`.
fn parse_base_score(raw: &str) -> Result<f32, ModelError> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .map_err(|_| ModelError::InvalidParam {
            name: "base_score",
            value: raw.to_string(),
        })
}

fn parse_count(name: &'static str, raw: Option<&str>) -> Result<Option<usize>, ModelError> {
    raw.map(|s| {
        s.trim().parse().map_err(|_| ModelError::InvalidParam {
            name,
            value: s.to_string(),
        })
    })
    .transpose()
}
