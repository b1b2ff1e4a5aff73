//! CSV input and output for records, candidates, labels and training data

mod table;

use std::path::Path;

pub use table::Table;

use crate::error::{DevmatchError, Result};
use crate::features::{feature_names, FeatureVector, FEATURE_COUNT};
use crate::record::{IdentityPair, Record};

/// Identity columns of a candidate row, in order
pub const PAIR_COLUMNS: [&str; 4] = ["name_1", "email_1", "name_2", "email_2"];

/// Header of the blocking output
pub const CANDIDATE_HEADERS: [&str; 6] = ["id_1", "name_1", "email_1", "id_2", "name_2", "email_2"];

/// Read records from a CSV with `name` and `email` columns
///
/// An `id` column is optional; rows without one are numbered from 1.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    records_from_table(&Table::read(path)?)
}

pub fn records_from_table(table: &Table) -> Result<Vec<Record>> {
    let name = table.require_column("name")?;
    let email = table.require_column("email")?;
    let id = table.column_index("id");

    let records = (0..table.len())
        .map(|row| {
            let id = match id.map(|c| table.cell(row, c)) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => (row + 1).to_string(),
            };
            Record::new(id, table.cell(row, name), table.cell(row, email))
        })
        .collect::<Vec<_>>();

    tracing::debug!("Read {} records", records.len());
    Ok(records)
}

/// Write candidate pairs as `id_1,name_1,email_1,id_2,name_2,email_2`
///
/// Returns the number of pairs written.
pub fn write_candidates<'a, I>(path: impl AsRef<Path>, pairs: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a Record, &'a Record)>,
{
    let table = candidates_table(pairs);
    table.write(path)?;
    Ok(table.len())
}

pub fn candidates_table<'a, I>(pairs: I) -> Table
where
    I: IntoIterator<Item = (&'a Record, &'a Record)>,
{
    let mut table = Table::new(CANDIDATE_HEADERS.iter().map(|h| h.to_string()).collect());
    for (a, b) in pairs {
        table.rows.push(vec![
            a.id.clone(),
            a.name.clone(),
            a.email.clone(),
            b.id.clone(),
            b.name.clone(),
            b.email.clone(),
        ]);
    }
    table
}

/// A candidate CSV whose identity columns have been located
///
/// All other columns are kept so they can be written back out next to the
/// scores.
#[derive(Debug, Clone)]
pub struct CandidateTable {
    table: Table,
    columns: [usize; 4],
}

impl CandidateTable {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_table(Table::read(path)?)
    }

    pub fn from_table(table: Table) -> Result<Self> {
        let mut columns = [0; 4];
        for (slot, name) in columns.iter_mut().zip(PAIR_COLUMNS) {
            *slot = table.require_column(name)?;
        }
        Ok(Self { table, columns })
    }

    pub fn pair(&self, row: usize) -> IdentityPair {
        let [n1, e1, n2, e2] = self.columns;
        IdentityPair::new(
            self.table.cell(row, n1),
            self.table.cell(row, e1),
            self.table.cell(row, n2),
            self.table.cell(row, e2),
        )
    }

    pub fn pairs(&self) -> Vec<IdentityPair> {
        (0..self.table.len()).map(|row| self.pair(row)).collect()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// A candidate pair with its TP/FP label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledPair {
    pub pair: IdentityPair,
    pub label: String,
}

/// Read `name_1,email_1,name_2,email_2,label`
pub fn read_labels(path: impl AsRef<Path>) -> Result<Vec<LabeledPair>> {
    labels_from_table(&Table::read(path)?)
}

pub fn labels_from_table(table: &Table) -> Result<Vec<LabeledPair>> {
    let candidates = CandidateTable::from_table(table.clone())?;
    let label = table.require_column("label")?;
    Ok((0..table.len())
        .map(|row| LabeledPair {
            pair: candidates.pair(row),
            label: table.cell(row, label).to_string(),
        })
        .collect())
}

/// Feature vectors with binary targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub samples: Vec<FeatureVector>,
    pub labels: Vec<bool>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }
}

/// Read feature columns by name plus a `y` (0/1) or `label` (TP/FP) target
///
/// `y` wins when both are present. A `label` other than `TP` (empty
/// included) is a negative; a `y` cell that is not a number is an error.
pub fn read_training_set(path: impl AsRef<Path>) -> Result<TrainingSet> {
    training_set_from_table(&Table::read(path)?)
}

pub fn training_set_from_table(table: &Table) -> Result<TrainingSet> {
    enum Target {
        Numeric(usize),
        Label(usize),
    }

    let target = match (table.column_index("y"), table.column_index("label")) {
        (Some(y), _) => Target::Numeric(y),
        (None, Some(label)) => Target::Label(label),
        (None, None) => return Err(DevmatchError::MissingLabel),
    };

    let mut columns = [0; FEATURE_COUNT];
    for (slot, name) in columns.iter_mut().zip(feature_names()) {
        *slot = table.require_column(name)?;
    }

    let mut set = TrainingSet::default();

    for row in 0..table.len() {
        let label = match target {
            Target::Numeric(c) => {
                let cell = table.cell(row, c).trim();
                match cell.parse::<f64>() {
                    Ok(v) => v as i64 != 0,
                    Err(_) => {
                        return Err(DevmatchError::MalformedRow {
                            row: row + 1,
                            reason: format!("y value {:?} is not a number", cell),
                        })
                    }
                }
            }
            // anything but TP, including an empty cell, is a negative
            Target::Label(c) => table.cell(row, c).trim().eq_ignore_ascii_case("TP"),
        };

        let mut values = [0.0; FEATURE_COUNT];
        for (value, (&column, name)) in values.iter_mut().zip(columns.iter().zip(feature_names())) {
            let cell = table.cell(row, column);
            *value = cell.trim().parse().map_err(|_| DevmatchError::MalformedRow {
                row: row + 1,
                reason: format!("{} value {:?} is not a number", name, cell),
            })?;
        }

        set.samples.push(FeatureVector::from_array(values));
        set.labels.push(label);
    }

    tracing::debug!(
        "Read {} training rows ({} positive)",
        set.len(),
        set.positives()
    );
    Ok(set)
}

/// Feature columns in layout order followed by `label` (empty when unknown)
pub fn training_table(samples: &[FeatureVector], labels: &[Option<String>]) -> Table {
    let mut headers: Vec<String> = feature_names().iter().map(|n| n.to_string()).collect();
    headers.push("label".to_string());

    let mut table = Table::new(headers);
    for (i, sample) in samples.iter().enumerate() {
        let mut row: Vec<String> = sample.as_slice().iter().map(|v| v.to_string()).collect();
        row.push(labels.get(i).cloned().flatten().unwrap_or_default());
        table.rows.push(row);
    }
    table
}

pub fn write_training_set(
    path: impl AsRef<Path>,
    samples: &[FeatureVector],
    labels: &[Option<String>],
) -> Result<()> {
    training_table(samples, labels).write(path)
}
