//! Pair feature integration tests
//!
//! Covers the feature layout contract and argument-order properties.

use devmatch_core::features::{build_features, feature_names, Feature, FEATURE_COUNT};
use devmatch_core::normalization::normalize_email;
use proptest::prelude::*;

/// Features whose value does not depend on argument order
const SYMMETRIC: [Feature; 7] = [
    Feature::NameJw,
    Feature::NameTfidf,
    Feature::PrefixJw,
    Feature::SameDomain,
    Feature::InitialsEqual,
    Feature::LenSimName,
    Feature::LenSimPrefix,
];

#[test]
fn test_identical_identities() {
    let features = build_features(
        ("Bob Brown", "bob.brown@gmail.com"),
        ("Bob Brown", "bob.brown@gmail.com"),
    );
    assert!((features[Feature::NameJw] - 1.0).abs() < 1e-9);
    assert!((features[Feature::NameTfidf] - 1.0).abs() < 1e-9);
    assert_eq!(features[Feature::SameDomain], 1.0);
    assert_eq!(features[Feature::FirstnameEqual], 1.0);
    assert_eq!(features[Feature::LastnameEqual], 1.0);
    assert_eq!(features[Feature::InitialsEqual], 1.0);
    assert_eq!(features[Feature::PhoneFirst], 1.0);
    assert_eq!(features[Feature::LenSimPrefix], 1.0);
}

#[test]
fn test_gmail_variants_share_prefix_and_domain() {
    let features = build_features(
        ("john doe", "John.Doe+spam@Gmail.COM"),
        ("J. Doe", "johndoe@googlemail.com"),
    );
    assert_eq!(features[Feature::PrefixJw], 1.0);
    assert_eq!(features[Feature::SameDomain], 1.0);
    // raw name parts keep their case
    assert_eq!(features[Feature::LastnameEqual], 0.0);
    assert_eq!(features[Feature::PrefixHasFl], 1.0);
    assert_eq!(features[Feature::PrefixHasFlRev], 0.0);
}

#[test]
fn test_display_name_email() {
    let email = normalize_email("Jane Roe <Jane.Roe@Example.org>");
    assert_eq!(email.full, "jane.roe@example.org");
    let features = build_features(
        ("Jane Roe", "Jane Roe <Jane.Roe@Example.org>"),
        ("Jane Roe", "jane.roe@example.org"),
    );
    assert_eq!(features[Feature::PrefixJw], 1.0);
}

#[test]
fn test_names_are_unique_and_ordered() {
    let names = feature_names();
    assert_eq!(names.len(), FEATURE_COUNT);
    for (i, name) in names.iter().enumerate() {
        assert!(!names[..i].contains(name), "duplicate feature name {}", name);
        assert_eq!(Feature::from_name(name).map(Feature::index), Some(i));
    }
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-zé]{1,8}( [A-Za-z.]{1,8}){0,2}"
}

fn email_strategy() -> impl Strategy<Value = String> {
    "[a-z.+]{1,10}@[a-z]{1,6}\\.(com|io|org)"
}

proptest! {
    #[test]
    fn test_symmetric_features(
        n1 in name_strategy(),
        e1 in email_strategy(),
        n2 in name_strategy(),
        e2 in email_strategy(),
    ) {
        let forward = build_features((n1.as_str(), e1.as_str()), (n2.as_str(), e2.as_str()));
        let backward = build_features((n2.as_str(), e2.as_str()), (n1.as_str(), e1.as_str()));
        for feature in SYMMETRIC {
            prop_assert!(
                (forward[feature] - backward[feature]).abs() < 1e-9,
                "{} differs: {} vs {}",
                feature.name(),
                forward[feature],
                backward[feature]
            );
        }
        prop_assert_eq!(forward[Feature::PrefixHasFl], backward[Feature::PrefixHasFlRev]);
        prop_assert_eq!(forward[Feature::PrefixHasFlRev], backward[Feature::PrefixHasFl]);
    }

    #[test]
    fn test_features_are_unit_interval(
        n1 in name_strategy(),
        e1 in email_strategy(),
        n2 in ".{0,12}",
        e2 in ".{0,12}",
    ) {
        let features = build_features((n1.as_str(), e1.as_str()), (n2.as_str(), e2.as_str()));
        for (feature, value) in features.iter() {
            prop_assert!(
                (0.0..=1.0).contains(&value),
                "{} out of range: {}",
                feature.name(),
                value
            );
        }
    }

    #[test]
    fn test_features_are_deterministic(n in name_strategy(), e in email_strategy()) {
        let a = build_features((n.as_str(), e.as_str()), ("Ann Lee", "ann@x.io"));
        let b = build_features((n.as_str(), e.as_str()), ("Ann Lee", "ann@x.io"));
        prop_assert_eq!(a, b);
    }
}
