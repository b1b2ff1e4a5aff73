//! Pair feature encoding
//!
//! Turns two (name, email) identities into a fixed-layout vector of 15
//! similarity signals for the scoring model.
//!
//! # Parallel Processing
//!
//! When the `parallel` feature is enabled, [`compute_features`] encodes pairs
//! with rayon. Output order always matches input order.

mod encoder;
mod phonetic;
mod similarity;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::record::IdentityPair;

pub use encoder::{build_features, feature_names, Feature, FeatureVector, FEATURE_COUNT};
pub use phonetic::{metaphone, phonetic_similarity, soundex};
pub use similarity::{jaro_winkler, length_similarity, tfidf_cosine};

/// Encode a batch of identity pairs
pub fn compute_features(pairs: &[IdentityPair]) -> Vec<FeatureVector> {
    #[cfg(feature = "parallel")]
    let vectors = pairs.par_iter().map(IdentityPair::features).collect();

    #[cfg(not(feature = "parallel"))]
    let vectors = pairs.iter().map(IdentityPair::features).collect();

    vectors
}
