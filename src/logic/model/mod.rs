//! Model Module - Classifiers behind one trait
//!
//! Every estimator learns on class indices `0..n_classes`; [`TrainedModel`] owns the
//! mapping between indices and the original string labels.

pub mod forest;
pub mod metrics;
pub mod mlp;
pub mod naive_bayes;
pub mod qda;
pub mod tree;

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_N_ESTIMATORS, DEFAULT_QDA_REG_PARAM, DEFAULT_SEED};
use crate::error::{DetectError, DetectResult};

pub use forest::RandomForest;
pub use metrics::{accuracy, ClassificationReport};
pub use mlp::{MlpClassifier, MlpConfig};
pub use naive_bayes::GaussianNaiveBayes;
pub use qda::QuadraticDiscriminant;
pub use tree::DecisionTree;

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Fit/predict contract shared by all estimators
pub trait Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()>;

    /// Row-wise class probabilities, shape `(n_samples, n_classes)`
    fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>>;

    /// Most probable class index per row
    fn predict(&self, x: &Array2<f64>) -> DetectResult<Vec<usize>> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }
}

/// Index of the largest value in each row; ties resolve to the lowest index
pub fn argmax_rows(proba: &Array2<f64>) -> Vec<usize> {
    proba
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
                .0
        })
        .collect()
}

pub(crate) fn check_fit_input(x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
    if x.nrows() != y.len() {
        return Err(DetectError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(DetectError::Model("cannot fit on an empty training set".to_string()));
    }
    if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
        return Err(DetectError::Model(format!("class index {} out of range ({} classes)", bad, n_classes)));
    }
    Ok(())
}

pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> DetectResult<()> {
    if x.ncols() != n_features {
        return Err(DetectError::ShapeMismatch {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

// ============================================================================
// MODEL KINDS
// ============================================================================

/// Selectable classifier families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    NaiveBayes,
    Qda,
    Mlp,
}

impl ModelKind {
    /// Models evaluated by the comparison run
    pub const COMPARISON: [ModelKind; 3] = [ModelKind::NaiveBayes, ModelKind::Qda, ModelKind::Mlp];

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "Random Forest",
            ModelKind::NaiveBayes => "Naive Bayes",
            ModelKind::Qda => "QDA",
            ModelKind::Mlp => "MLP Classifier",
        }
    }

    pub fn build(&self, config: &ModelConfig) -> Estimator {
        match self {
            ModelKind::RandomForest => {
                let mut forest = RandomForest::new(config.n_estimators).with_random_state(config.seed);
                if let Some(depth) = config.max_depth {
                    forest = forest.with_max_depth(depth);
                }
                Estimator::RandomForest(forest)
            }
            ModelKind::NaiveBayes => Estimator::NaiveBayes(GaussianNaiveBayes::new()),
            ModelKind::Qda => Estimator::Qda(QuadraticDiscriminant::new().with_reg_param(config.reg_param)),
            ModelKind::Mlp => Estimator::Mlp(MlpClassifier::new(MlpConfig {
                random_state: config.seed,
                ..MlpConfig::default()
            })),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Hyperparameters exposed on the command line
#[derive(Debug, Clone, Copy)]
pub struct ModelConfig {
    pub seed: u64,
    pub n_estimators: usize,
    /// Depth limit for forest trees; `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// QDA covariance shrinkage in `[0, 1]`
    pub reg_param: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: None,
            reg_param: DEFAULT_QDA_REG_PARAM,
        }
    }
}

// ============================================================================
// ESTIMATOR
// ============================================================================

/// Serializable union of the fitted estimators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    RandomForest(RandomForest),
    NaiveBayes(GaussianNaiveBayes),
    Qda(QuadraticDiscriminant),
    Mlp(MlpClassifier),
}

impl Estimator {
    fn inner(&self) -> &dyn Classifier {
        match self {
            Estimator::RandomForest(m) => m,
            Estimator::NaiveBayes(m) => m,
            Estimator::Qda(m) => m,
            Estimator::Mlp(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Estimator::RandomForest(m) => m,
            Estimator::NaiveBayes(m) => m,
            Estimator::Qda(m) => m,
            Estimator::Mlp(m) => m,
        }
    }
}

impl Classifier for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
        self.inner_mut().fit(x, y, n_classes)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        self.inner().predict_proba(x)
    }

    fn predict(&self, x: &Array2<f64>) -> DetectResult<Vec<usize>> {
        self.inner().predict(x)
    }
}

// ============================================================================
// TRAINED MODEL
// ============================================================================

/// Fitted estimator plus its ordered class labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub kind: ModelKind,
    pub classes: Vec<String>,
    estimator: Estimator,
}

impl TrainedModel {
    /// Fit `kind` on string labels; classes are the sorted distinct labels
    pub fn fit(kind: ModelKind, config: &ModelConfig, x: &Array2<f64>, labels: &[String]) -> DetectResult<Self> {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        let y = labels
            .iter()
            .map(|label| {
                classes
                    .binary_search(label)
                    .map_err(|_| DetectError::Model(format!("label '{}' missing from classes", label)))
            })
            .collect::<DetectResult<Vec<usize>>>()?;

        let mut estimator = kind.build(config);
        estimator.fit(x, &y, classes.len())?;

        Ok(Self { kind, classes, estimator })
    }

    /// Predicted labels
    pub fn predict(&self, x: &Array2<f64>) -> DetectResult<Vec<String>> {
        self.estimator
            .predict(x)?
            .into_iter()
            .map(|idx| {
                self.classes
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| DetectError::Model(format!("class index {} out of range", idx)))
            })
            .collect()
    }

    /// Class probabilities, columns ordered like [`TrainedModel::classes`]
    pub fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        self.estimator.predict_proba(x)
    }
}
