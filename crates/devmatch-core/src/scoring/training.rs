//! Train/evaluate workflow

use serde::{Deserialize, Serialize};

use super::metrics::{average_precision, precision_recall_curve, roc_auc, BinaryMetrics};
use super::model::LogisticModel;
use crate::config::TrainingConfig;
use crate::error::{DevmatchError, Result};
use crate::features::FeatureVector;

/// Sample indices of a train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Deterministic stratified split
///
/// Within each class, the sample at position `p` goes to the test side when
/// `floor((p + 1) * test_size) > floor(p * test_size)`, which spreads test
/// samples evenly and keeps the class ratio on both sides.
pub fn stratified_split(labels: &[bool], test_size: f64) -> Split {
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };
    let mut seen = [0usize; 2];

    for (i, &label) in labels.iter().enumerate() {
        let class = usize::from(label);
        let p = seen[class] as f64;
        seen[class] += 1;
        if ((p + 1.0) * test_size).floor() > (p * test_size).floor() {
            split.test.push(i);
        } else {
            split.train.push(i);
        }
    }

    split
}

/// Held-out evaluation of a freshly trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    /// `None` when the test split holds a single class
    pub roc_auc: Option<f64>,
    pub average_precision: f64,
    pub at_threshold: BinaryMetrics,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
    /// F1-maximizing threshold (0.5 when no lower threshold exists)
    pub recommended_threshold: f64,
}

/// Split, fit on the train side, and evaluate on the test side
///
/// The returned model carries the recommended threshold.
pub fn train_and_evaluate(
    samples: &[FeatureVector],
    labels: &[bool],
    config: &TrainingConfig,
) -> Result<(LogisticModel, TrainingReport)> {
    if samples.len() != labels.len() {
        return Err(DevmatchError::Training(format!(
            "{} samples but {} labels",
            samples.len(),
            labels.len()
        )));
    }

    let split = stratified_split(labels, config.test_size);
    if split.test.is_empty() {
        return Err(DevmatchError::Training(
            "test split is empty; provide more samples or a larger test_size".to_string(),
        ));
    }

    let pick = |indices: &[usize]| -> (Vec<FeatureVector>, Vec<bool>) {
        indices.iter().map(|&i| (samples[i], labels[i])).unzip()
    };
    let (train_x, train_y) = pick(&split.train);
    let (test_x, test_y) = pick(&split.test);

    tracing::info!(
        "Training on {} samples, evaluating on {}",
        train_x.len(),
        test_x.len()
    );

    let model = LogisticModel::train(&train_x, &train_y, config)?;
    let scores: Vec<f64> = test_x.iter().map(|x| model.predict_proba(x)).collect();

    let at_threshold = BinaryMetrics::at_threshold(&test_y, &scores, config.report_threshold);
    let recommended_threshold =
        precision_recall_curve(&test_y, &scores).recommended_threshold();

    let report = TrainingReport {
        train_size: train_x.len(),
        test_size: test_x.len(),
        roc_auc: roc_auc(&test_y, &scores),
        average_precision: average_precision(&test_y, &scores),
        at_threshold,
        precision: at_threshold.precision(),
        recall: at_threshold.recall(),
        f1: at_threshold.f1(),
        accuracy: at_threshold.accuracy(),
        recommended_threshold,
    };

    match report.roc_auc {
        Some(auc) => tracing::info!("ROC-AUC: {:.3}", auc),
        None => tracing::warn!("ROC-AUC undefined: test split holds a single class"),
    }
    tracing::info!("PR-AUC: {:.3}", report.average_precision);
    tracing::info!(
        "At threshold {:.3}: precision {:.3}, recall {:.3}, f1 {:.3}, accuracy {:.3}",
        config.report_threshold,
        report.precision,
        report.recall,
        report.f1,
        report.accuracy
    );
    tracing::info!(
        "Recommended threshold (based on F1 maximum): {:.3}",
        recommended_threshold
    );

    Ok((model.with_threshold(recommended_threshold), report))
}
