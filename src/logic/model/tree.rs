//! Decision tree classifier (Gini impurity)

use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{check_fit_input, check_predict_input, Classifier};
use crate::error::{DetectError, DetectResult};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the class distribution of its samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node; `x[feature] <= threshold` goes left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random per split (all when `None`)
    pub max_features: Option<usize>,
    /// Seed for feature sampling
    pub random_state: u64,
    n_features: usize,
    n_classes: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
            n_classes: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set max features per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit on the rows listed in `samples` (duplicates allowed, as in a bootstrap)
    pub fn fit_samples(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize, samples: &[usize]) -> DetectResult<()> {
        check_fit_input(x, y, n_classes)?;
        if samples.is_empty() {
            return Err(DetectError::Model("cannot grow a tree from zero samples".to_string()));
        }

        self.n_features = x.ncols();
        self.n_classes = n_classes;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut builder = TreeBuilder { tree: self, x, y, rng: &mut rng };
        let root = builder.build(samples.to_vec(), 0);
        self.root = Some(root);
        Ok(())
    }

    /// Number of leaves
    pub fn n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map(count).unwrap_or(0)
    }

    /// Distribution of the leaf `row` falls into
    pub(crate) fn leaf_distribution(&self, row: ArrayView1<f64>) -> DetectResult<&[f64]> {
        let mut node = self.root.as_ref().ok_or(DetectError::NotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split { feature_idx, threshold, left, right } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
        let samples: Vec<usize> = (0..x.nrows()).collect();
        self.fit_samples(x, y, n_classes, &samples)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        check_predict_input(x, self.n_features)?;

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            for (j, &p) in self.leaf_distribution(row)?.iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        Ok(proba)
    }
}

// ============================================================================
// GROWING
// ============================================================================

struct TreeBuilder<'a> {
    tree: &'a DecisionTree,
    x: &'a Array2<f64>,
    y: &'a [usize],
    rng: &'a mut ChaCha8Rng,
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeBuilder<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> TreeNode {
        let counts = self.class_counts(&samples);
        let n_samples = samples.len();

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let should_stop = n_samples < self.tree.min_samples_split
            || n_samples < 2 * self.tree.min_samples_leaf
            || self.tree.max_depth.map_or(false, |d| depth >= d)
            || is_pure;

        if should_stop {
            return leaf(&counts, n_samples);
        }

        let parent_impurity = gini(&counts, n_samples);
        let best = match self.find_best_split(&samples) {
            Some(best) if best.impurity < parent_impurity - 1e-12 => best,
            _ => return leaf(&counts, n_samples),
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, best.feature_idx]] <= best.threshold);

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.tree.max_features {
            Some(k) if k < n_features => index::sample(&mut *self.rng, n_features, k.max(1)).into_vec(),
            _ => (0..n_features).collect(),
        }
    }

    /// Lowest weighted Gini over the sampled features
    fn find_best_split(&mut self, samples: &[usize]) -> Option<BestSplit> {
        let n_classes = self.tree.n_classes;
        let min_leaf = self.tree.min_samples_leaf;
        let total = self.class_counts(samples);
        let n = samples.len();

        let mut best: Option<BestSplit> = None;

        for feature_idx in self.candidate_features() {
            let mut column: Vec<(f64, usize)> = samples
                .iter()
                .map(|&i| (self.x[[i, feature_idx]], self.y[i]))
                .collect();
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left = vec![0usize; n_classes];
            for pos in 0..n - 1 {
                left[column[pos].1] += 1;

                let (value, next) = (column[pos].0, column[pos + 1].0);
                if !(value < next) {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(BestSplit {
                        feature_idx,
                        threshold: value + (next - value) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.tree.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }
}

fn leaf(counts: &[usize], n_samples: usize) -> TreeNode {
    let total = n_samples.max(1) as f64;
    TreeNode::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        n_samples,
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}
