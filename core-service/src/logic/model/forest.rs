//! Isolation Forest - random partitioning ensemble
//!
//! Anomalies are few and different, so random axis-aligned splits isolate
//! them in fewer steps than normal points. Each tree is grown on a random
//! subsample; the raw score of a point is
//!
//! ```text
//! score(x) = -2 ^ ( -E[h(x)] / c(psi) )
//! ```
//!
//! where `h(x)` is the depth at which `x` lands in a leaf (plus the expected
//! remaining depth for the leaf's size) and `c(psi)` is the average path
//! length of an unsuccessful BST search over `psi` samples. Scores fall in
//! `[-1, 0)`; lower means more anomalous.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::logic::error::{ArtifactError, ConfigError, ScoringError};

/// Euler–Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Decision offset used before a contamination percentile is known
pub const DEFAULT_OFFSET: f64 = -0.5;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Ensemble hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Expected fraction of anomalies, sets the decision offset
    pub contamination: f64,
    /// Seed for subsampling and split selection
    pub random_seed: u64,
    /// Subsample size per tree (capped at the number of rows)
    pub max_samples: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.1,
            random_seed: 42,
            max_samples: 256,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_estimators == 0 {
            return Err(ConfigError::ZeroCount("n_estimators"));
        }
        if self.max_samples == 0 {
            return Err(ConfigError::ZeroCount("max_samples"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ConfigError::ContaminationOutOfRange(self.contamination));
        }
        Ok(())
    }
}

/// Per-row classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomalous,
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree, nodes stored in pre-order (root at index 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &Array2<f64>, rows: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(data, rows, 0, max_depth, rng);
        tree
    }

    fn build(
        &mut self,
        data: &Array2<f64>,
        rows: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= max_depth || rows.len() <= 1 {
            return index;
        }

        // Random feature among those that still vary within this node
        let mut features: Vec<usize> = (0..data.ncols()).collect();
        features.shuffle(rng);
        let candidate = features.into_iter().find_map(|feature| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, feature]];
                (lo.min(v), hi.max(v))
            });
            (hi > lo).then_some((feature, lo, hi))
        });

        let Some((feature, lo, hi)) = candidate else {
            return index;
        };
        let threshold = rng.gen_range(lo..hi);

        let mut mid = 0;
        for i in 0..rows.len() {
            if data[[rows[i], feature]] < threshold {
                rows.swap(i, mid);
                mid += 1;
            }
        }

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.build(data, left_rows, depth + 1, max_depth, rng);
        let right = self.build(data, right_rows, depth + 1, max_depth, rng);
        self.nodes[index] = Node::Split { feature, threshold, left, right };
        index
    }

    /// Depth of the leaf reached by `row`, adjusted for the leaf size
    fn path_length(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        let mut depth = 0usize;
        loop {
            match &self.nodes[node] {
                Node::Split { feature, threshold, left, right } => {
                    node = if row[*feature] < *threshold { *left } else { *right };
                    depth += 1;
                }
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split { feature, threshold, left, right } = node {
                if *feature >= n_features {
                    return Err(format!("node {} splits on feature {} of {}", i, feature, n_features));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {} has a non-finite threshold", i));
                }
                // Pre-order arena: children always come after their parent
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {} has out-of-order child {}", i, child));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

/// Fitted isolation forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    pub params: ForestParams,
    pub n_features: usize,
    /// Rows each tree was grown on
    pub sample_size: usize,
    /// Scores below this are labelled anomalous
    pub offset: f64,
    trees: Vec<IsolationTree>,
}

impl IsolationForest {
    /// Fit on `data` and calibrate the offset to the contamination rate
    pub fn fit(data: &Array2<f64>, params: &ForestParams) -> Result<Self, ScoringError> {
        if data.nrows() == 0 {
            return Err(ScoringError::EmptyBatch);
        }
        Ok(Self::grow_ensemble(data, params))
    }

    /// Fresh model that has seen no data.
    ///
    /// The ensemble is grown on a seeded standard-normal reference sample,
    /// which is what z-scaled features look like, so the result depends only
    /// on `params` and scores are reproducible.
    pub fn initialize(params: &ForestParams, n_features: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(params.random_seed);
        let rows = params.max_samples.max(2);
        let reference = Array2::from_shape_fn((rows, n_features), |_| standard_normal(&mut rng));
        Self::grow_ensemble(&reference, params)
    }

    fn grow_ensemble(data: &Array2<f64>, params: &ForestParams) -> Self {
        let n_rows = data.nrows();
        let sample_size = params.max_samples.clamp(1, n_rows);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(params.random_seed);
        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen::<u64>());
                let mut rows = rand::seq::index::sample(&mut tree_rng, n_rows, sample_size).into_vec();
                IsolationTree::grow(data, &mut rows, max_depth, &mut tree_rng)
            })
            .collect();

        let mut forest = Self {
            params: params.clone(),
            n_features: data.ncols(),
            sample_size,
            offset: DEFAULT_OFFSET,
            trees,
        };

        let training_scores: Vec<f64> = data.rows().into_iter().map(|row| forest.score_row(row)).collect();
        forest.offset = percentile(&training_scores, params.contamination * 100.0);
        forest
    }

    fn score_row(&self, row: ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.path_length(row)).sum();
        let mean_depth = total / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        let norm = if norm > 0.0 { norm } else { 1.0 };
        -(2f64.powf(-mean_depth / norm))
    }

    fn check_shape(&self, data: &Array2<f64>) -> Result<(), ScoringError> {
        if data.nrows() == 0 {
            return Err(ScoringError::EmptyBatch);
        }
        if data.ncols() != self.n_features {
            return Err(ScoringError::DimensionMismatch {
                expected: self.n_features,
                actual: data.ncols(),
            });
        }
        Ok(())
    }

    /// Raw outlier score per row; lower = more anomalous
    pub fn score_samples(&self, data: &Array2<f64>) -> Result<Vec<f64>, ScoringError> {
        self.check_shape(data)?;
        Ok(data.rows().into_iter().map(|row| self.score_row(row)).collect())
    }

    /// Label for an already computed raw score
    pub fn label(&self, score: f64) -> Label {
        if score < self.offset {
            Label::Anomalous
        } else {
            Label::Normal
        }
    }

    /// Normal/anomalous classification per row
    pub fn predict(&self, data: &Array2<f64>) -> Result<Vec<Label>, ScoringError> {
        Ok(self.score_samples(data)?.into_iter().map(|s| self.label(s)).collect())
    }

    /// Scores and labels in one pass over the ensemble
    pub fn evaluate(&self, data: &Array2<f64>) -> Result<Vec<(Label, f64)>, ScoringError> {
        Ok(self.score_samples(data)?.into_iter().map(|s| (self.label(s), s)).collect())
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Structural checks for a deserialized forest
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".to_string()));
        }
        if self.sample_size == 0 {
            return Err(ArtifactError::Invalid("sample_size is zero".to_string()));
        }
        if !self.offset.is_finite() {
            return Err(ArtifactError::Invalid("offset is not finite".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| ArtifactError::Invalid(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }
}

/// Linear-interpolated percentile, `q` in [0, 100]
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return DEFAULT_OFFSET;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Box–Muller draw from N(0, 1)
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = 1.0 - rng.gen::<f64>(); // (0, 1], keeps ln finite
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
