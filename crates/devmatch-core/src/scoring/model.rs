//! Logistic regression over pair features

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Scorer;
use crate::config::TrainingConfig;
use crate::error::{DevmatchError, Result};
use crate::features::{feature_names, FeatureVector, FEATURE_COUNT};

/// Trained logistic regression model
///
/// Weights are stored next to their feature names so a saved model can be
/// checked against the current feature layout when it is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Threshold recommended when the model was trained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl LogisticModel {
    pub fn new(weights: [f64; FEATURE_COUNT], intercept: f64) -> Self {
        Self {
            feature_names: feature_names().iter().map(|n| n.to_string()).collect(),
            weights: weights.to_vec(),
            intercept,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Fit by full-batch gradient descent on the L2-regularized log loss
    ///
    /// The intercept is not regularized. With `balanced` set, each class
    /// carries total weight `n / 2`. The step size halves whenever the loss
    /// goes up.
    pub fn train(
        samples: &[FeatureVector],
        labels: &[bool],
        config: &TrainingConfig,
    ) -> Result<Self> {
        if samples.len() != labels.len() {
            return Err(DevmatchError::Training(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }

        let n = samples.len();
        let positives = labels.iter().filter(|&&l| l).count();
        let negatives = n - positives;
        if positives == 0 || negatives == 0 {
            return Err(DevmatchError::Training(
                "need at least one positive and one negative sample".to_string(),
            ));
        }

        let (positive_weight, negative_weight) = if config.balanced {
            (
                n as f64 / (2.0 * positives as f64),
                n as f64 / (2.0 * negatives as f64),
            )
        } else {
            (1.0, 1.0)
        };
        let sample_weights: Vec<f64> = labels
            .iter()
            .map(|&l| if l { positive_weight } else { negative_weight })
            .collect();
        let total_weight: f64 = sample_weights.iter().sum();
        let penalty = 1.0 / (config.c * total_weight);

        let mut weights = [0.0; FEATURE_COUNT];
        let mut intercept = 0.0;
        let mut learning_rate = config.learning_rate;
        let mut previous: Option<(f64, [f64; FEATURE_COUNT], f64)> = None;
        let mut iterations = 0;

        while iterations < config.max_iter {
            iterations += 1;

            let mut loss = 0.0;
            let mut grad_w = [0.0; FEATURE_COUNT];
            let mut grad_b = 0.0;
            for ((x, &label), &sw) in samples.iter().zip(labels).zip(&sample_weights) {
                let z = linear(&weights, intercept, x);
                let y = if label { 1.0 } else { 0.0 };
                loss += sw * (softplus(z) - y * z);
                let residual = sw * (sigmoid(z) - y);
                for (g, v) in grad_w.iter_mut().zip(x.as_slice()) {
                    *g += residual * v;
                }
                grad_b += residual;
            }
            loss /= total_weight;
            loss += 0.5 * penalty * weights.iter().map(|w| w * w).sum::<f64>();
            for (g, w) in grad_w.iter_mut().zip(&weights) {
                *g = *g / total_weight + penalty * w;
            }
            grad_b /= total_weight;

            if let Some((previous_loss, previous_weights, previous_intercept)) = previous {
                if loss > previous_loss {
                    weights = previous_weights;
                    intercept = previous_intercept;
                    learning_rate *= 0.5;
                    previous = None;
                    continue;
                }
            }

            let largest = grad_w
                .iter()
                .chain(std::iter::once(&grad_b))
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if largest < config.tolerance {
                break;
            }

            previous = Some((loss, weights, intercept));
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= learning_rate * g;
            }
            intercept -= learning_rate * grad_b;
        }

        if iterations >= config.max_iter {
            tracing::warn!(
                "Logistic regression stopped after {} iterations without converging",
                iterations
            );
        } else {
            tracing::debug!("Logistic regression converged after {} iterations", iterations);
        }

        Ok(Self::new(weights, intercept))
    }

    /// Probability that the pair is the same person
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(features.as_slice())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        sigmoid(z)
    }

    /// Check that the model matches the current feature layout
    pub fn validate(&self) -> Result<()> {
        let expected = feature_names();
        if self.feature_names.len() != expected.len()
            || self.feature_names.iter().zip(expected).any(|(a, b)| a != b)
        {
            return Err(DevmatchError::InvalidModel(format!(
                "feature names {:?} do not match {:?}",
                self.feature_names, expected
            )));
        }
        if self.weights.len() != FEATURE_COUNT {
            return Err(DevmatchError::InvalidModel(format!(
                "expected {} weights, found {}",
                FEATURE_COUNT,
                self.weights.len()
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(DevmatchError::InvalidModel("non-finite coefficient".to_string()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        tracing::info!("Saved model to {:?}", path);
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = Self::from_json(&fs::read_to_string(path)?)?;
        tracing::debug!("Loaded model from {:?}", path);
        Ok(model)
    }
}

impl Scorer for LogisticModel {
    fn score(&self, features: &FeatureVector) -> f64 {
        self.predict_proba(features)
    }
}

fn linear(weights: &[f64; FEATURE_COUNT], intercept: f64, x: &FeatureVector) -> f64 {
    intercept
        + weights
            .iter()
            .zip(x.as_slice())
            .map(|(w, v)| w * v)
            .sum::<f64>()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}
