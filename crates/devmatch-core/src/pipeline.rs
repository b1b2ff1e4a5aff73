//! End-to-end steps: block, build a training set, train, score candidates

use std::collections::HashMap;
use std::path::Path;

use crate::blocking::Blocker;
use crate::config::TrainingConfig;
use crate::error::{DevmatchError, Result};
use crate::features::{compute_features, Feature, FeatureVector};
use crate::io::{
    read_labels, read_records, read_training_set, training_table, write_candidates,
    write_training_set, CandidateTable, LabeledPair, Table,
};
use crate::record::IdentityPair;
use crate::scoring::{train_and_evaluate, LogisticModel, Scorer, TrainingReport};

/// Name of the appended probability column
pub const PROBA_COLUMN: &str = "proba";

/// Which scored rows to keep
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    All,
    /// Rows with `proba >= threshold`
    Threshold(f64),
    /// The k most probable rows
    TopK(usize),
}

impl Selection {
    /// Top-k wins over a threshold when both are given
    pub fn from_options(threshold: Option<f64>, top_k: Option<usize>) -> Self {
        match (top_k, threshold) {
            (Some(k), _) => Selection::TopK(k),
            (None, Some(t)) => Selection::Threshold(t),
            (None, None) => Selection::All,
        }
    }
}

/// Block a records CSV and write the merged candidate pairs
///
/// Returns the number of pairs written.
pub fn generate_candidates(
    records_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    blocker: &Blocker,
) -> Result<usize> {
    let records = read_records(records_path)?;
    let written = write_candidates(out_path.as_ref(), blocker.merge_candidates(&records))?;
    tracing::info!(
        "Wrote {} candidate pairs from {} records to {:?}",
        written,
        records.len(),
        out_path.as_ref()
    );
    Ok(written)
}

fn pair_key(pair: &IdentityPair) -> (&str, &str, &str, &str) {
    (&pair.name_1, &pair.email_1, &pair.name_2, &pair.email_2)
}

/// Left-join labels onto candidates and compute the feature columns
///
/// Each label key must be unique; candidate rows without a label get an
/// empty `label` cell.
pub fn build_dataset(candidates: &CandidateTable, labels: &[LabeledPair]) -> Result<Table> {
    let (samples, joined) = labelled_features(candidates, labels)?;
    Ok(training_table(&samples, &joined))
}

/// File-level [`build_dataset`]
pub fn build_dataset_files(
    candidates_path: impl AsRef<Path>,
    labels_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
) -> Result<usize> {
    let candidates = CandidateTable::read(candidates_path)?;
    let labels = read_labels(labels_path)?;
    let (samples, joined) = labelled_features(&candidates, &labels)?;
    write_training_set(out_path, &samples, &joined)?;
    Ok(samples.len())
}

fn labelled_features(
    candidates: &CandidateTable,
    labels: &[LabeledPair],
) -> Result<(Vec<FeatureVector>, Vec<Option<String>>)> {
    let mut by_key: HashMap<(&str, &str, &str, &str), &str> = HashMap::with_capacity(labels.len());
    for labeled in labels {
        let key = pair_key(&labeled.pair);
        if by_key.insert(key, &labeled.label).is_some() {
            return Err(DevmatchError::DuplicateLabel(format!(
                "{} <{}>, {} <{}>",
                key.0, key.1, key.2, key.3
            )));
        }
    }

    let pairs = candidates.pairs();
    let joined: Vec<Option<String>> = pairs
        .iter()
        .map(|pair| by_key.get(&pair_key(pair)).map(|label| label.to_string()))
        .collect();
    let labelled = joined.iter().filter(|l| l.is_some()).count();

    let samples = compute_features(&pairs);
    tracing::info!(
        "Built {} feature rows, {} labelled",
        samples.len(),
        labelled
    );
    Ok((samples, joined))
}

/// Append the feature columns to every candidate row
pub fn annotate_features(candidates: CandidateTable) -> Table {
    let features = compute_features(&candidates.pairs());
    let mut table = candidates.into_table();
    for feature in Feature::ALL {
        table.push_column(
            feature.name(),
            features.iter().map(|f| f[feature].to_string()).collect(),
        );
    }
    table
}

/// Train on a feature CSV, save the model, and return the held-out report
pub fn train_model_file(
    training_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    let set = read_training_set(training_path)?;
    let (model, report) = train_and_evaluate(&set.samples, &set.labels, config)?;
    model.save(model_path)?;
    Ok(report)
}

/// Score every candidate row, sort by probability and apply the selection
///
/// All input columns are kept and `proba` is appended. Rows with equal
/// probability keep their input order.
pub fn score_candidates<S: Scorer>(
    candidates: CandidateTable,
    scorer: &S,
    selection: Selection,
) -> Table {
    let features = compute_features(&candidates.pairs());
    let scores = scorer.score_batch(&features);

    let mut table = candidates.into_table();
    table.push_column(
        PROBA_COLUMN,
        scores.iter().map(|s| s.to_string()).collect(),
    );

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let keep: Vec<usize> = match selection {
        Selection::All => order,
        Selection::TopK(k) => order.into_iter().take(k).collect(),
        Selection::Threshold(t) => order.into_iter().filter(|&i| scores[i] >= t).collect(),
    };

    let mut rows: Vec<Option<Vec<String>>> = table.rows.into_iter().map(Some).collect();
    table.rows = keep.into_iter().filter_map(|i| rows[i].take()).collect();
    table
}

/// File-level [`score_candidates`] with a saved model
pub fn score_candidates_file(
    candidates_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    selection: Selection,
) -> Result<usize> {
    let model = LogisticModel::load(model_path)?;
    let candidates = CandidateTable::read(candidates_path)?;
    let total = candidates.len();
    let table = score_candidates(candidates, &model, selection);
    table.write(out_path.as_ref())?;
    tracing::info!(
        "Scored {} candidates, wrote {} rows to {:?}",
        total,
        table.len(),
        out_path.as_ref()
    );
    Ok(table.len())
}
