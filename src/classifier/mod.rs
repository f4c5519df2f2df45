//! Margin classification over sparse feature vectors
//!
//! A multi-class kernelized SVM trained one-vs-rest with the kernelized
//! Pegasos subgradient scheme. Training is deterministic (seeded) so cached
//! models reproduce across runs. Also provides k-fold cross-validation and
//! a coarse-then-fine (C, gamma) grid search as an offline tuning aid.

pub mod cache;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::errors::SentiStreamError;
use crate::models::LabeledExample;
use crate::models::SparseVector;
use crate::Result;

const TRAINING_SEED: u64 = 0x5EED;

/// Squared Euclidean distance between two sparse vectors.
fn squared_distance(a: &SparseVector, b: &SparseVector) -> f64 {
    let mut sum = 0.0;
    for (index, va) in a {
        let vb = b.get(index).copied().unwrap_or(0.0);
        sum += (va - vb) * (va - vb);
    }
    for (index, vb) in b {
        if !a.contains_key(index) {
            sum += vb * vb;
        }
    }
    sum
}

/// RBF kernel: `exp(-gamma * ||a - b||^2)`.
fn rbf_kernel(a: &SparseVector, b: &SparseVector, gamma: f64) -> f64 {
    (-gamma * squared_distance(a, b)).exp()
}

/// One-vs-rest binary machine: per-support-vector coefficients
/// (`alpha_i * y_i`, already scaled), aligned with the model's support set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BinaryMachine {
    coefficients: Vec<f64>,
}

/// Trained multi-class margin classifier. Opaque to callers; produced by
/// [`KernelSvm::train`], consumed by [`KernelSvm::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmModel {
    classes: usize,
    gamma: f64,
    support: Vec<SparseVector>,
    machines: Vec<BinaryMachine>,
}

impl SvmModel {
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Raw one-vs-rest decision value for one class.
    fn decision(&self, machine: usize, features: &SparseVector) -> f64 {
        self.machines[machine]
            .coefficients
            .iter()
            .zip(&self.support)
            .filter(|(c, _)| **c != 0.0)
            .map(|(c, sv)| c * rbf_kernel(sv, features, self.gamma))
            .sum()
    }
}

/// Trainer for the multi-class kernel SVM.
#[derive(Debug, Clone, Copy)]
pub struct KernelSvm {
    c: f64,
    gamma: f64,
    epochs: usize,
}

impl KernelSvm {
    pub fn new(c: f64, gamma: f64) -> Self {
        Self {
            c,
            gamma,
            epochs: 20,
        }
    }

    /// Number of passes (in expectation) over the training set.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs.max(1);
        self
    }

    /// Train a model over the labeled examples.
    ///
    /// Class labels come from the score discretizer upstream; an empty
    /// training set is fatal and reported synchronously.
    pub fn train(&self, examples: &[LabeledExample]) -> Result<SvmModel> {
        if examples.is_empty() {
            return Err(SentiStreamError::EmptyTrainingSet);
        }

        let n = examples.len();
        let classes = examples.iter().map(|e| e.class).max().unwrap_or(0) + 1;
        info!(
            "Training kernel SVM: {} examples, {} classes, C={}, gamma={}",
            n, classes, self.c, self.gamma
        );

        // The Gram matrix is shared by every one-vs-rest machine.
        let gram = self.gram_matrix(examples);
        let lambda = 1.0 / (self.c * n as f64);
        let iterations = self.epochs * n;
        let mut rng = StdRng::seed_from_u64(TRAINING_SEED);

        let machines = (0..classes)
            .map(|class| {
                let targets: Vec<f64> = examples
                    .iter()
                    .map(|e| if e.class == class { 1.0 } else { -1.0 })
                    .collect();
                self.train_binary(&gram, &targets, lambda, iterations, &mut rng)
            })
            .collect();

        Ok(SvmModel {
            classes,
            gamma: self.gamma,
            support: examples.iter().map(|e| e.features.clone()).collect(),
            machines,
        })
    }

    fn gram_matrix(&self, examples: &[LabeledExample]) -> Vec<Vec<f64>> {
        let n = examples.len();
        let mut gram = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let k = rbf_kernel(&examples[i].features, &examples[j].features, self.gamma);
                gram[i][j] = k;
                gram[j][i] = k;
            }
        }
        gram
    }

    /// Kernelized Pegasos: counts margin violations per support vector.
    fn train_binary(
        &self,
        gram: &[Vec<f64>],
        targets: &[f64],
        lambda: f64,
        iterations: usize,
        rng: &mut StdRng,
    ) -> BinaryMachine {
        let n = targets.len();
        let mut alpha = vec![0.0_f64; n];

        for t in 1..=iterations {
            let i = rng.gen_range(0..n);
            let scale = 1.0 / (lambda * t as f64);
            let mut decision = 0.0;
            for j in 0..n {
                if alpha[j] != 0.0 {
                    decision += alpha[j] * targets[j] * gram[j][i];
                }
            }
            if targets[i] * decision * scale < 1.0 {
                alpha[i] += 1.0;
            }
        }

        let scale = 1.0 / (lambda * iterations as f64);
        let coefficients = alpha
            .iter()
            .zip(targets)
            .map(|(a, y)| a * y * scale)
            .collect();
        BinaryMachine { coefficients }
    }

    /// Probability estimate per class: softmax over the one-vs-rest
    /// decision values.
    pub fn probabilities(&self, model: &SvmModel, features: &SparseVector) -> Vec<f64> {
        let decisions: Vec<f64> = (0..model.classes)
            .map(|k| model.decision(k, features))
            .collect();
        let max = decisions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = decisions.iter().map(|d| (d - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }

    /// Return the single most probable class for an example.
    pub fn evaluate(&self, model: &SvmModel, features: &SparseVector) -> usize {
        let probabilities = self.probabilities(model, features);
        probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(class, _)| class)
            .unwrap_or(0)
    }

    /// Mean k-fold cross-validation accuracy.
    pub fn cross_validate(&self, examples: &[LabeledExample], folds: usize) -> Result<f64> {
        if examples.is_empty() {
            return Err(SentiStreamError::EmptyTrainingSet);
        }
        let folds = folds.clamp(2, examples.len().max(2));

        let mut indices: Vec<usize> = (0..examples.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(TRAINING_SEED));

        let mut correct = 0usize;
        let mut total = 0usize;
        for fold in 0..folds {
            let held_out: Vec<usize> = indices
                .iter()
                .copied()
                .skip(fold)
                .step_by(folds)
                .collect();
            if held_out.is_empty() || held_out.len() == examples.len() {
                continue;
            }
            let training: Vec<LabeledExample> = indices
                .iter()
                .filter(|i| !held_out.contains(*i))
                .map(|&i| examples[i].clone())
                .collect();
            let model = self.train(&training)?;
            for &i in &held_out {
                if self.evaluate(&model, &examples[i].features) == examples[i].class {
                    correct += 1;
                }
                total += 1;
            }
        }

        if total == 0 {
            return Err(SentiStreamError::Training(
                "not enough examples for cross-validation".to_string(),
            ));
        }
        Ok(correct as f64 / total as f64)
    }
}

/// Result of a (C, gamma) grid search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSearchResult {
    pub c: f64,
    pub gamma: f64,
    pub accuracy: f64,
}

/// Coarse-then-fine grid search over (C, gamma), scored by k-fold
/// cross-validation accuracy. Offline tuning aid, not used at serving time.
pub fn grid_search(examples: &[LabeledExample], folds: usize) -> Result<GridSearchResult> {
    const COARSE_C: [f64; 5] = [0.25, 1.0, 4.0, 16.0, 64.0];
    const COARSE_GAMMA: [f64; 4] = [0.01, 0.05, 0.25, 1.25];

    let mut best = GridSearchResult {
        c: COARSE_C[0],
        gamma: COARSE_GAMMA[0],
        accuracy: f64::NEG_INFINITY,
    };

    for &c in &COARSE_C {
        for &gamma in &COARSE_GAMMA {
            let accuracy = KernelSvm::new(c, gamma).cross_validate(examples, folds)?;
            debug!("grid point C={} gamma={}: accuracy {:.4}", c, gamma, accuracy);
            if accuracy > best.accuracy {
                best = GridSearchResult { c, gamma, accuracy };
            }
        }
    }

    // Refine around the winning coarse point.
    let coarse = best;
    let fine_c = [coarse.c / 2.0, coarse.c, coarse.c * 2.0];
    let fine_gamma = [coarse.gamma / 2.0, coarse.gamma, coarse.gamma * 2.0];
    for &c in &fine_c {
        for &gamma in &fine_gamma {
            if c == coarse.c && gamma == coarse.gamma {
                continue;
            }
            let accuracy = KernelSvm::new(c, gamma).cross_validate(examples, folds)?;
            debug!("fine grid point C={} gamma={}: accuracy {:.4}", c, gamma, accuracy);
            if accuracy > best.accuracy {
                best = GridSearchResult { c, gamma, accuracy };
            }
        }
    }

    info!(
        "Grid search winner: C={} gamma={} accuracy {:.4}",
        best.c, best.gamma, best.accuracy
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(values: &[(u32, f64)], class: usize) -> LabeledExample {
        let features: SparseVector = values.iter().copied().collect();
        LabeledExample::new(features, class as f64, class)
    }

    /// Two well-separated clusters in feature space.
    fn separable_examples() -> Vec<LabeledExample> {
        let mut examples = Vec::new();
        for i in 0..8 {
            let wiggle = f64::from(i) * 0.05;
            examples.push(example(&[(0, 1.0 + wiggle), (1, 1.0)], 0));
            examples.push(example(&[(0, 5.0 + wiggle), (1, 5.0)], 1));
        }
        examples
    }

    #[test]
    fn test_empty_training_set_is_fatal() {
        let svm = KernelSvm::new(1.0, 0.5);
        assert!(matches!(
            svm.train(&[]),
            Err(SentiStreamError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_separable_training() {
        let svm = KernelSvm::new(4.0, 0.5);
        let examples = separable_examples();
        let model = svm.train(&examples).unwrap();
        assert_eq!(model.classes(), 2);

        for example in &examples {
            assert_eq!(svm.evaluate(&model, &example.features), example.class);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let svm = KernelSvm::new(4.0, 0.5);
        let examples = separable_examples();
        let model = svm.train(&examples).unwrap();

        let probabilities = svm.probabilities(&model, &examples[0].features);
        assert_eq!(probabilities.len(), 2);
        let total: f64 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(probabilities[0] > probabilities[1]);
    }

    #[test]
    fn test_training_is_deterministic() {
        let svm = KernelSvm::new(4.0, 0.5);
        let examples = separable_examples();
        let first = svm.train(&examples).unwrap();
        let second = svm.train(&examples).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_kernel_is_one_at_zero_distance() {
        let a: SparseVector = [(0, 1.0), (3, -2.0)].into_iter().collect();
        assert!((rbf_kernel(&a, &a, 0.7) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sparse_distance_handles_disjoint_keys() {
        let a: SparseVector = [(0, 3.0)].into_iter().collect();
        let b: SparseVector = [(1, 4.0)].into_iter().collect();
        assert!((squared_distance(&a, &b) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_validation_on_separable_data() {
        let svm = KernelSvm::new(4.0, 0.5);
        let examples = separable_examples();
        let accuracy = svm.cross_validate(&examples, 4).unwrap();
        assert!(accuracy > 0.8, "accuracy was {accuracy}");
    }

    #[test]
    fn test_grid_search_returns_a_grid_point() {
        let examples = separable_examples();
        let result = grid_search(&examples, 4).unwrap();
        assert!(result.accuracy > 0.8);
        assert!(result.c > 0.0);
        assert!(result.gamma > 0.0);
    }

    #[test]
    fn test_model_round_trips_through_json() {
        let svm = KernelSvm::new(4.0, 0.5);
        let examples = separable_examples();
        let model = svm.train(&examples).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: SvmModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, restored);
    }
}
