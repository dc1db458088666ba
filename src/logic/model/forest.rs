//! Random forest classifier
//!
//! Bagged Gini trees with `sqrt(n_features)` candidates per split. Tree `i` draws its
//! bootstrap and its feature samples from `random_state + i`, so a fit is reproducible
//! whatever order rayon schedules the trees in.

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use super::{check_fit_input, check_predict_input, Classifier};
use crate::error::{DetectError, DetectResult};

/// Random forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: Option<usize>,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
    /// Base seed
    pub random_state: u64,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            bootstrap: true,
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

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn fit_tree(&self, idx: usize, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<DecisionTree> {
        let seed = self.random_state.wrapping_add(idx as u64);
        let n_samples = x.nrows();
        let max_features = ((x.ncols() as f64).sqrt() as usize).max(1);

        let samples: Vec<usize> = if self.bootstrap {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
        } else {
            (0..n_samples).collect()
        };

        let mut tree = DecisionTree::new()
            .with_max_features(max_features)
            .with_random_state(seed);
        tree.max_depth = self.max_depth;
        tree.fit_samples(x, y, n_classes, &samples)?;
        Ok(tree)
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
        check_fit_input(x, y, n_classes)?;
        if self.n_estimators == 0 {
            return Err(DetectError::Model("random forest needs at least one tree".to_string()));
        }

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|idx| self.fit_tree(idx, x, y, n_classes))
            .collect::<DetectResult<Vec<_>>>()?;

        self.trees = trees;
        self.n_features = x.ncols();
        self.n_classes = n_classes;
        Ok(())
    }

    /// Mean of the per-tree leaf distributions
    fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(DetectError::NotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            for tree in &self.trees {
                for (j, &p) in tree.leaf_distribution(row)?.iter().enumerate() {
                    proba[[i, j]] += p;
                }
            }
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }
}
