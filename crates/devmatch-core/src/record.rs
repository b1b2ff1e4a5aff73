//! Identity records

use serde::{Deserialize, Serialize};

use crate::features::{build_features, FeatureVector};

/// One (name, email) observation of an identity.
///
/// The id is opaque and caller-supplied; the core never creates records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    /// The (name, email) pair the feature encoder consumes
    pub fn identity(&self) -> (&str, &str) {
        (&self.name, &self.email)
    }
}

/// Two identities to compare, as they appear in a candidate row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPair {
    #[serde(default)]
    pub name_1: String,
    #[serde(default)]
    pub email_1: String,
    #[serde(default)]
    pub name_2: String,
    #[serde(default)]
    pub email_2: String,
}

impl IdentityPair {
    pub fn new(
        name_1: impl Into<String>,
        email_1: impl Into<String>,
        name_2: impl Into<String>,
        email_2: impl Into<String>,
    ) -> Self {
        Self {
            name_1: name_1.into(),
            email_1: email_1.into(),
            name_2: name_2.into(),
            email_2: email_2.into(),
        }
    }

    pub fn from_records(a: &Record, b: &Record) -> Self {
        Self::new(&a.name, &a.email, &b.name, &b.email)
    }

    pub fn left(&self) -> (&str, &str) {
        (&self.name_1, &self.email_1)
    }

    pub fn right(&self) -> (&str, &str) {
        (&self.name_2, &self.email_2)
    }

    /// Feature vector for this pair, left side first
    pub fn features(&self) -> FeatureVector {
        build_features(self.left(), self.right())
    }
}
