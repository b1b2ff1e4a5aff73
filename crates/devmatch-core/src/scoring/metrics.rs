//! Binary classification metrics over predicted probabilities

use serde::{Deserialize, Serialize};

/// Threshold returned when the F1 maximum has no lower threshold to point at
pub const FALLBACK_THRESHOLD: f64 = 0.5;

/// Precision/recall pairs over every distinct score
///
/// `thresholds` is ascending. `precision` and `recall` carry one extra final
/// entry (1.0 and 0.0) so the curve ends at zero recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl PrecisionRecallCurve {
    /// F1 at every curve point (0.0 where precision and recall are both zero)
    pub fn f1_scores(&self) -> Vec<f64> {
        self.precision
            .iter()
            .zip(&self.recall)
            .map(|(p, r)| 2.0 * p * r / (p + r).max(1e-9))
            .collect()
    }

    /// Threshold that maximizes F1
    ///
    /// With the best point at index `i` this returns `thresholds[i - 1]`; when
    /// `i` is 0 (or out of range) it falls back to [`FALLBACK_THRESHOLD`].
    pub fn recommended_threshold(&self) -> f64 {
        let best = argmax(&self.f1_scores());
        match best.checked_sub(1).and_then(|i| self.thresholds.get(i)) {
            Some(&threshold) => threshold,
            None => FALLBACK_THRESHOLD,
        }
    }
}

/// Index of the first maximum, ignoring NaN
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Cumulative (tp, fp) counts for predicting positive at each distinct score,
/// from the highest score down.
fn cumulative_counts(labels: &[bool], scores: &[f64]) -> Vec<(f64, usize, usize)> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if labels[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            points.push((scores[i], tp, fp));
        }
    }
    points
}

/// Precision/recall curve over the distinct scores
pub fn precision_recall_curve(labels: &[bool], scores: &[f64]) -> PrecisionRecallCurve {
    let positives = labels.iter().filter(|&&l| l).count();
    let points = cumulative_counts(labels, scores);

    let mut precision = Vec::with_capacity(points.len() + 1);
    let mut recall = Vec::with_capacity(points.len() + 1);
    let mut thresholds = Vec::with_capacity(points.len());

    // Ascending threshold order: lowest score (everything predicted positive) first
    for &(score, tp, fp) in points.iter().rev() {
        precision.push(tp as f64 / (tp + fp) as f64);
        recall.push(if positives == 0 {
            0.0
        } else {
            tp as f64 / positives as f64
        });
        thresholds.push(score);
    }
    precision.push(1.0);
    recall.push(0.0);

    PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    }
}

/// Average precision: sum of precision weighted by recall increments
pub fn average_precision(labels: &[bool], scores: &[f64]) -> f64 {
    let curve = precision_recall_curve(labels, scores);
    curve
        .recall
        .windows(2)
        .zip(&curve.precision)
        .map(|(r, p)| (r[0] - r[1]) * p)
        .sum()
}

/// Area under the ROC curve, with tied scores sharing their average rank
///
/// `None` when only one class is present.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1..=end share their mean
        let average = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = average;
        }
        start = end;
    }

    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| **l)
        .map(|(_, r)| r)
        .sum();
    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// Confusion-matrix summary at one decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub threshold: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl BinaryMetrics {
    /// Predict positive when `score >= threshold`
    pub fn at_threshold(labels: &[bool], scores: &[f64], threshold: f64) -> Self {
        let mut metrics = Self {
            threshold,
            true_positives: 0,
            false_positives: 0,
            true_negatives: 0,
            false_negatives: 0,
        };
        for (&label, &score) in labels.iter().zip(scores) {
            match (score >= threshold, label) {
                (true, true) => metrics.true_positives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        metrics
    }

    /// Zero when nothing is predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(
            self.true_positives + self.true_negatives,
            self.true_positives + self.false_positives + self.true_negatives + self.false_negatives,
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
