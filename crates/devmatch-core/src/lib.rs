//! devmatch-core: identity resolution for (name, email) records
//!
//! This library provides:
//! - Name and email normalization
//! - Multi-pass blocking for candidate pair generation
//! - A fixed 15-feature pair encoder (string, phonetic and structural similarity)
//! - Logistic regression scoring with training and evaluation metrics
//! - CSV readers and writers for records, candidates, labels and training data
//!
//! Normalization, blocking and feature encoding are pure and never fail.
//! File, config and model handling report through [`DevmatchError`].

pub mod blocking;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod labels;
pub mod normalization;
pub mod pipeline;
pub mod record;
pub mod scoring;

// Re-export main types for convenience
pub use blocking::{
    bucket_key, dedup_key, make_candidates, merge_candidates, parse_gh_handle, Blocker,
    KeyComponent, KeySchema, SchemaPolicy,
};
pub use config::{BlockingConfig, DevmatchConfig, ScoringConfig, TrainingConfig};
pub use error::{DevmatchError, Result};
pub use features::{build_features, feature_names, Feature, FeatureVector, FEATURE_COUNT};
pub use normalization::{normalize_email, normalize_name, split_name, NameParts, NormalizedEmail};
pub use pipeline::Selection;
pub use record::{IdentityPair, Record};
pub use scoring::{LogisticModel, Scorer, TrainingReport};
