//! Multi-layer perceptron classifier
//!
//! ReLU hidden layers, softmax output, cross-entropy loss with L2 penalty, trained with
//! Adam on shuffled mini-batches. Training stops after `max_iter` epochs or once the
//! epoch loss has not improved by `tol` for `n_iter_no_change` epochs.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_fit_input, check_predict_input, Classifier};
use crate::error::{DetectError, DetectResult};

const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// MLP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
    /// Adam step size
    pub learning_rate: f64,
    /// Maximum number of epochs
    pub max_iter: usize,
    /// Mini-batch size (capped at the number of samples)
    pub batch_size: usize,
    /// L2 penalty
    pub alpha: f64,
    /// Minimum loss improvement that resets the patience counter
    pub tol: f64,
    /// Patience, in epochs
    pub n_iter_no_change: usize,
    /// Seed for initialization and shuffling
    pub random_state: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![100],
            learning_rate: 0.001,
            max_iter: 300,
            batch_size: 200,
            alpha: 0.0001,
            tol: 1e-4,
            n_iter_no_change: 10,
            random_state: 42,
        }
    }
}

/// Multi-layer perceptron classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    config: MlpConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    n_classes: usize,
    /// Epochs run by the last fit
    n_iter: usize,
    /// Final epoch loss
    loss: f64,
}

impl MlpClassifier {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            n_classes: 0,
            n_iter: 0,
            loss: f64::INFINITY,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn loss(&self) -> f64 {
        self.loss
    }

    /// Glorot uniform weights, zero biases
    fn initialize(&mut self, rng: &mut ChaCha8Rng) {
        let mut sizes = vec![self.n_features];
        sizes.extend(&self.config.hidden_layers);
        sizes.push(self.n_classes);

        self.weights.clear();
        self.biases.clear();
        for pair in sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            let bound = (6.0 / (n_in + n_out) as f64).sqrt();
            self.weights
                .push(Array2::from_shape_fn((n_in, n_out), |_| rng.gen_range(-bound..bound)));
            self.biases.push(Array1::zeros(n_out));
        }
    }

    /// Activations of every layer, input first, softmax output last
    fn forward(&self, x: &Array2<f64>) -> Vec<Array2<f64>> {
        let n_layers = self.weights.len();
        let mut activations = Vec::with_capacity(n_layers + 1);
        activations.push(x.clone());

        for (i, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i + 1 < n_layers { z.mapv(|v| v.max(0.0)) } else { softmax(z) };
            activations.push(a);
        }
        activations
    }

    /// Cross-entropy plus L2 penalty, and the gradients for every layer
    fn loss_and_gradients(
        &self,
        x: &Array2<f64>,
        y: &Array2<f64>,
    ) -> (f64, Vec<Array2<f64>>, Vec<Array1<f64>>) {
        let n = x.nrows() as f64;
        let activations = self.forward(x);
        let output = &activations[activations.len() - 1];

        let data_loss = -(y * &output.mapv(|p| p.max(1e-15).ln())).sum() / n;
        let penalty = 0.5 * self.config.alpha * self.weights.iter().map(|w| w.mapv(|v| v * v).sum()).sum::<f64>() / n;

        let n_layers = self.weights.len();
        let mut grad_w = vec![Array2::zeros((0, 0)); n_layers];
        let mut grad_b = vec![Array1::zeros(0); n_layers];

        let mut delta = (output - y) / n;
        for i in (0..n_layers).rev() {
            grad_w[i] = activations[i].t().dot(&delta) + &(&self.weights[i] * (self.config.alpha / n));
            grad_b[i] = delta.sum_axis(Axis(0));

            if i > 0 {
                let relu_grad = activations[i].mapv(|a| if a > 0.0 { 1.0 } else { 0.0 });
                delta = delta.dot(&self.weights[i].t()) * relu_grad;
            }
        }

        (data_loss + penalty, grad_w, grad_b)
    }
}

fn softmax(mut z: Array2<f64>) -> Array2<f64> {
    for mut row in z.rows_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    z
}

fn one_hot(y: &[usize], n_classes: usize) -> Array2<f64> {
    let mut encoded = Array2::zeros((y.len(), n_classes));
    for (i, &class) in y.iter().enumerate() {
        encoded[[i, class]] = 1.0;
    }
    encoded
}

/// First and second moment estimates for one parameter tensor
struct AdamState<D: ndarray::Dimension> {
    m: ndarray::Array<f64, D>,
    v: ndarray::Array<f64, D>,
}

impl<D: ndarray::Dimension> AdamState<D> {
    fn new(shape: D) -> Self {
        Self {
            m: ndarray::Array::zeros(shape.clone()),
            v: ndarray::Array::zeros(shape),
        }
    }

    fn step(&mut self, param: &mut ndarray::Array<f64, D>, grad: &ndarray::Array<f64, D>, lr_t: f64) {
        self.m.zip_mut_with(grad, |m, &g| *m = BETA_1 * *m + (1.0 - BETA_1) * g);
        self.v.zip_mut_with(grad, |v, &g| *v = BETA_2 * *v + (1.0 - BETA_2) * g * g);
        ndarray::Zip::from(param)
            .and(&self.m)
            .and(&self.v)
            .for_each(|p, &m, &v| *p -= lr_t * m / (v.sqrt() + ADAM_EPSILON));
    }
}

impl Classifier for MlpClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
        check_fit_input(x, y, n_classes)?;
        if self.config.hidden_layers.iter().any(|&h| h == 0) {
            return Err(DetectError::Model("hidden layers must have at least one unit".to_string()));
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.n_classes = n_classes;

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        self.initialize(&mut rng);

        let targets = one_hot(y, n_classes);
        let batch_size = self.config.batch_size.clamp(1, n_samples);

        let mut w_state: Vec<_> = self.weights.iter().map(|w| AdamState::new(w.raw_dim())).collect();
        let mut b_state: Vec<_> = self.biases.iter().map(|b| AdamState::new(b.raw_dim())).collect();

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0;
        let mut t = 0i32;

        self.n_iter = 0;
        for epoch in 0..self.config.max_iter {
            indices.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in indices.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = targets.select(Axis(0), batch);
                let (batch_loss, grad_w, grad_b) = self.loss_and_gradients(&xb, &yb);
                epoch_loss += batch_loss * batch.len() as f64;

                t += 1;
                let lr_t = self.config.learning_rate * (1.0 - BETA_2.powi(t)).sqrt() / (1.0 - BETA_1.powi(t));
                for i in 0..self.weights.len() {
                    w_state[i].step(&mut self.weights[i], &grad_w[i], lr_t);
                    b_state[i].step(&mut self.biases[i], &grad_b[i], lr_t);
                }
            }

            epoch_loss /= n_samples as f64;
            self.loss = epoch_loss;
            self.n_iter = epoch + 1;

            if !epoch_loss.is_finite() {
                return Err(DetectError::Model("MLP loss diverged".to_string()));
            }

            if epoch_loss > best_loss - self.config.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(epoch_loss);

            if no_improvement > self.config.n_iter_no_change {
                debug!(epoch = self.n_iter, loss = epoch_loss, "MLP converged");
                break;
            }
        }

        if self.n_iter == self.config.max_iter {
            debug!(max_iter = self.config.max_iter, loss = self.loss, "MLP reached max_iter");
        }
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        if self.weights.is_empty() {
            return Err(DetectError::NotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut activations = self.forward(x);
        activations.pop().ok_or(DetectError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_config() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![16],
            learning_rate: 0.05,
            max_iter: 400,
            batch_size: 4,
            ..MlpConfig::default()
        }
    }

    fn blobs() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [-1.0, -1.0],
            [-1.2, -0.8],
            [-0.9, -1.1],
            [-1.1, -1.2],
            [1.0, 1.0],
            [1.2, 0.9],
            [0.8, 1.1],
            [1.1, 1.2],
            [-1.0, 1.0],
            [-0.9, 1.2],
            [-1.1, 0.9],
            [-1.2, 1.1],
        ];
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2])
    }

    #[test]
    fn test_mlp_learns_three_blobs() {
        let (x, y) = blobs();
        let mut mlp = MlpClassifier::new(small_config());
        mlp.fit(&x, &y, 3).unwrap();

        assert_eq!(mlp.predict(&x).unwrap(), y);
        let proba = mlp.predict_proba(&x).unwrap();
        assert_eq!(proba.shape(), &[12, 3]);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert!(mlp.n_iter() <= 400);
    }

    #[test]
    fn test_mlp_is_reproducible() {
        let (x, y) = blobs();
        let mut a = MlpClassifier::new(small_config());
        let mut b = MlpClassifier::new(small_config());
        a.fit(&x, &y, 3).unwrap();
        b.fit(&x, &y, 3).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let p = softmax(array![[1.0, 2.0, 3.0], [1000.0, 1000.0, 1000.0]]);
        for row in p.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
        assert!((p[[1, 0]] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_layer_is_rejected() {
        let (x, y) = blobs();
        let mut mlp = MlpClassifier::new(MlpConfig {
            hidden_layers: vec![0],
            ..MlpConfig::default()
        });
        assert!(mlp.fit(&x, &y, 3).is_err());
    }

    #[test]
    fn test_unfitted() {
        let mlp = MlpClassifier::new(MlpConfig::default());
        assert!(matches!(mlp.predict_proba(&array![[1.0, 2.0]]), Err(DetectError::NotFitted)));
    }
}
