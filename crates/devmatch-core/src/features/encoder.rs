//! Pair feature vector
//!
//! The position of every value is a contract with trained models, so the
//! layout is defined once by [`Feature::ALL`] and used both to build vectors
//! and to label table columns.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::phonetic::phonetic_similarity;
use super::similarity::{jaro_winkler, length_similarity, tfidf_cosine};
use crate::normalization::{normalize_email, normalize_name, split_name};

/// Number of features per pair
pub const FEATURE_COUNT: usize = 15;

/// Named pair features, in vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    NameJw,
    NameTfidf,
    PrefixJw,
    FirstJw,
    LastJw,
    PhoneFirst,
    PhoneLast,
    SameDomain,
    FirstnameEqual,
    LastnameEqual,
    InitialsEqual,
    PrefixHasFl,
    PrefixHasFlRev,
    LenSimName,
    LenSimPrefix,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::NameJw,
        Feature::NameTfidf,
        Feature::PrefixJw,
        Feature::FirstJw,
        Feature::LastJw,
        Feature::PhoneFirst,
        Feature::PhoneLast,
        Feature::SameDomain,
        Feature::FirstnameEqual,
        Feature::LastnameEqual,
        Feature::InitialsEqual,
        Feature::PrefixHasFl,
        Feature::PrefixHasFlRev,
        Feature::LenSimName,
        Feature::LenSimPrefix,
    ];

    /// Position in the vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name
    pub fn name(self) -> &'static str {
        match self {
            Feature::NameJw => "name_jw",
            Feature::NameTfidf => "name_tfidf",
            Feature::PrefixJw => "prefix_jw",
            Feature::FirstJw => "first_jw",
            Feature::LastJw => "last_jw",
            Feature::PhoneFirst => "phone_first",
            Feature::PhoneLast => "phone_last",
            Feature::SameDomain => "same_domain",
            Feature::FirstnameEqual => "firstname_equal",
            Feature::LastnameEqual => "lastname_equal",
            Feature::InitialsEqual => "initials_equal",
            Feature::PrefixHasFl => "prefix_has_fl",
            Feature::PrefixHasFlRev => "prefix_has_fl_rev",
            Feature::LenSimName => "len_sim_name",
            Feature::LenSimPrefix => "len_sim_prefix",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Column names in vector order
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    Feature::ALL.map(Feature::name)
}

/// Similarity signals for one candidate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_array(self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// Feature/value pairs in vector order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().zip(self.0.iter().copied())
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.0[feature.index()]
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Compute the feature vector for two (name, email) identities
///
/// First/last name parts come from the raw names; full-name comparisons use
/// the normalized names. Swapping the arguments swaps `prefix_has_fl` and
/// `prefix_has_fl_rev` and leaves the symmetric measures unchanged.
pub fn build_features(left: (&str, &str), right: (&str, &str)) -> FeatureVector {
    let (name1, email1) = left;
    let (name2, email2) = right;

    let n1 = normalize_name(name1);
    let n2 = normalize_name(name2);
    let e1 = normalize_email(email1);
    let e2 = normalize_email(email2);
    let (p1, d1) = (e1.local.as_str(), e1.domain.as_str());
    let (p2, d2) = (e2.local.as_str(), e2.domain.as_str());
    let parts1 = split_name(name1);
    let parts2 = split_name(name2);
    let (f1, l1) = (parts1.first.as_str(), parts1.last.as_str());
    let (f2, l2) = (parts2.first.as_str(), parts2.last.as_str());

    let initials1 = initials(&n1);
    let initials2 = initials(&n2);

    let mut values = [0.0; FEATURE_COUNT];
    for feature in Feature::ALL {
        values[feature.index()] = match feature {
            Feature::NameJw => jaro_winkler(&n1, &n2),
            Feature::NameTfidf => tfidf_cosine(&n1, &n2),
            Feature::PrefixJw => jaro_winkler(p1, p2),
            Feature::FirstJw => jaro_winkler(f1, f2),
            Feature::LastJw => jaro_winkler(l1, l2),
            Feature::PhoneFirst => phonetic_similarity(f1, f2),
            Feature::PhoneLast => phonetic_similarity(l1, l2),
            Feature::SameDomain => flag(d1 == d2 && !d1.is_empty()),
            Feature::FirstnameEqual => flag(f1 == f2 && !f1.is_empty()),
            Feature::LastnameEqual => flag(l1 == l2 && !l1.is_empty()),
            Feature::InitialsEqual => flag(initials1 == initials2 && !initials1.is_empty()),
            Feature::PrefixHasFl => flag(prefix_contains_name(f1, l1, p2)),
            Feature::PrefixHasFlRev => flag(prefix_contains_name(f2, l2, p1)),
            Feature::LenSimName => length_similarity(&n1, &n2),
            Feature::LenSimPrefix => length_similarity(p1, p2),
        };
    }

    FeatureVector(values)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// First character of every token of an already normalized name
fn initials(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .collect()
}

/// Whether an email prefix spells out a first initial and a last name
fn prefix_contains_name(first: &str, last: &str, prefix: &str) -> bool {
    match first.chars().next() {
        Some(first_initial) if !last.is_empty() => {
            prefix.contains(first_initial) && prefix.contains(last)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_contract() {
        assert_eq!(
            feature_names(),
            [
                "name_jw",
                "name_tfidf",
                "prefix_jw",
                "first_jw",
                "last_jw",
                "phone_first",
                "phone_last",
                "same_domain",
                "firstname_equal",
                "lastname_equal",
                "initials_equal",
                "prefix_has_fl",
                "prefix_has_fl_rev",
                "len_sim_name",
                "len_sim_prefix",
            ]
        );
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(Feature::from_name(feature.name()), Some(*feature));
        }
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("alice bob charlie"), "abc");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_prefix_contains_name() {
        assert!(prefix_contains_name("a", "smith", "asmith123"));
        assert!(!prefix_contains_name("a", "smith", "bob"));
        assert!(!prefix_contains_name("", "smith", "asmith"));
        assert!(!prefix_contains_name("a", "", "asmith"));
    }

    #[test]
    fn test_typical_pair_in_range() {
        let features = build_features(
            ("Alice Smith", "alice.smith@example.com"),
            ("Alicia Smith", "alicia.smith@example.com"),
        );
        assert!(features.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(features[Feature::SameDomain], 1.0);
        assert_eq!(features[Feature::LastnameEqual], 1.0);
        assert_eq!(features[Feature::FirstnameEqual], 0.0);
    }

    #[test]
    fn test_same_person_high_similarity() {
        let features = build_features(
            ("Bob Brown", "bob.brown@gmail.com"),
            ("Bob Brown", "bob.brown@gmail.com"),
        );
        assert!((features[0] - 1.0).abs() < 1e-3);
        assert_eq!(features[7], 1.0);
        assert_eq!(features[8], 1.0);
        assert_eq!(features[9], 1.0);
        assert_eq!(features[10], 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        let features = build_features(("", ""), ("", ""));
        assert_eq!(features.as_slice().len(), FEATURE_COUNT);
        assert!(features.as_slice().iter().all(|v| *v >= 0.0));
        assert_eq!(features[Feature::NameTfidf], 0.0);
        assert_eq!(features[Feature::SameDomain], 0.0);
        assert_eq!(features[Feature::LenSimName], 0.0);
        assert_eq!(features[Feature::InitialsEqual], 0.0);
    }

    #[test]
    fn test_prefix_flags_follow_argument_order() {
        let left = ("jane doe", "someone@corp.io");
        let right = ("Jay Dee", "jdoe@corp.io");
        let forward = build_features(left, right);
        let backward = build_features(right, left);
        assert_eq!(forward[Feature::PrefixHasFl], 1.0);
        assert_eq!(forward[Feature::PrefixHasFlRev], 0.0);
        assert_eq!(backward[Feature::PrefixHasFl], 0.0);
        assert_eq!(backward[Feature::PrefixHasFlRev], 1.0);
    }

    #[test]
    fn test_raw_name_parts_are_case_sensitive() {
        let features = build_features(("Jane Doe", "x@a.io"), ("jane doe", "y@b.io"));
        assert_eq!(features[Feature::FirstnameEqual], 0.0);
        assert_eq!(features[Feature::NameJw], 1.0);
    }
}
