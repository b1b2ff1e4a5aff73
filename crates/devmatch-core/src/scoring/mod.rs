//! Pair scoring: the match-probability model, its training and evaluation

mod metrics;
mod model;
mod training;

pub use metrics::{
    average_precision, precision_recall_curve, roc_auc, BinaryMetrics, PrecisionRecallCurve,
    FALLBACK_THRESHOLD,
};
pub use model::LogisticModel;
pub use training::{stratified_split, train_and_evaluate, Split, TrainingReport};

use crate::features::FeatureVector;

/// Anything that maps a pair feature vector to a match probability
pub trait Scorer {
    /// Probability in [0, 1] that both identities are the same person
    fn score(&self, features: &FeatureVector) -> f64;

    fn score_batch(&self, features: &[FeatureVector]) -> Vec<f64> {
        features.iter().map(|f| self.score(f)).collect()
    }
}
