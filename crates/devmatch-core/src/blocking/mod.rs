//! Blocking: cheap candidate-pair generation
//!
//! Records are grouped into buckets by a key schema and only pairs inside a
//! bucket are proposed. Several complementary schemas are merged, with
//! duplicates across passes suppressed by their email pair.

mod candidates;
mod key;

use std::collections::HashSet;

pub use candidates::{dedup_key, Candidates, DedupKey, MergedCandidates};
pub use key::{
    parse_gh_handle, KeyComponent, KeySchema, SchemaPolicy, DEFAULT_COMMON_DOMAINS,
    GITHUB_NOREPLY_DOMAIN,
};

use crate::config::BlockingConfig;
use crate::error::Result;
use crate::normalization::{normalize_email, normalize_name, split_name};
use crate::record::Record;
use key::{initial, parse_handle_for, Segment};

/// Blocking engine bound to one configuration
#[derive(Debug, Clone)]
pub struct Blocker {
    max_bucket_size: usize,
    ignore_common_domains: bool,
    common_domains: HashSet<String>,
    noreply_domain: String,
    passes: Vec<KeySchema>,
}

impl Default for Blocker {
    fn default() -> Self {
        Self {
            max_bucket_size: 1000,
            ignore_common_domains: true,
            common_domains: DEFAULT_COMMON_DOMAINS.iter().map(|d| d.to_string()).collect(),
            noreply_domain: GITHUB_NOREPLY_DOMAIN.to_string(),
            passes: KeySchema::default_passes(),
        }
    }
}

impl Blocker {
    /// Build a blocker from config, parsing its passes
    pub fn from_config(config: &BlockingConfig) -> Result<Self> {
        Ok(Self {
            max_bucket_size: config.max_bucket_size,
            ignore_common_domains: config.ignore_common_domains,
            common_domains: config
                .common_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            noreply_domain: config.noreply_domain.to_lowercase(),
            passes: config.key_schemas()?,
        })
    }

    pub fn with_max_bucket_size(mut self, max_bucket_size: usize) -> Self {
        self.max_bucket_size = max_bucket_size;
        self
    }

    pub fn with_ignore_common_domains(mut self, ignore: bool) -> Self {
        self.ignore_common_domains = ignore;
        self
    }

    /// Replace the common-provider set (matched case-insensitively)
    pub fn with_common_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.common_domains = domains
            .into_iter()
            .map(|d| d.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_passes(mut self, passes: Vec<KeySchema>) -> Self {
        self.passes = passes;
        self
    }

    pub fn max_bucket_size(&self) -> usize {
        self.max_bucket_size
    }

    pub fn passes(&self) -> &[KeySchema] {
        &self.passes
    }

    pub fn is_common_domain(&self, domain: &str) -> bool {
        self.common_domains.contains(domain)
    }

    /// Compute the `|`-joined bucket key of a record
    pub fn bucket_key(&self, record: &Record, schema: &KeySchema) -> String {
        let email = normalize_email(&record.email);
        let parts = split_name(&normalize_name(&record.name));

        let segments: Vec<String> = schema
            .segments()
            .iter()
            .map(|segment| match segment {
                Segment::Known(KeyComponent::Domain) => {
                    if self.ignore_common_domains && self.is_common_domain(&email.domain) {
                        String::new()
                    } else {
                        email.domain.clone()
                    }
                }
                Segment::Known(KeyComponent::LastnameInitial) => initial(&parts.last),
                Segment::Known(KeyComponent::PrefixInitial) => {
                    let handle = parse_handle_for(&email.local, &email.domain, &self.noreply_domain);
                    if handle.is_empty() {
                        initial(&email.local)
                    } else {
                        initial(handle)
                    }
                }
                Segment::Known(KeyComponent::GhHandle) => {
                    parse_handle_for(&email.local, &email.domain, &self.noreply_domain).to_string()
                }
                Segment::Unrecognized(_) => String::new(),
            })
            .collect();

        segments.join("|")
    }

    /// Candidate pairs for a single key schema
    pub fn make_candidates<'a>(&self, records: &'a [Record], schema: &KeySchema) -> Candidates<'a> {
        Candidates::build(self, records, schema)
    }

    /// Candidate pairs across all configured passes, deduplicated by email pair
    pub fn merge_candidates<'a>(&self, records: &'a [Record]) -> MergedCandidates<'a> {
        MergedCandidates::new(self.clone(), records)
    }
}

/// Bucket key under the default common-domain set and noreply convention
pub fn bucket_key(record: &Record, schema: &KeySchema, ignore_common_domains: bool) -> String {
    Blocker::default()
        .with_ignore_common_domains(ignore_common_domains)
        .bucket_key(record, schema)
}

/// Pairs within each bucket of one key schema
pub fn make_candidates<'a>(
    records: &'a [Record],
    schema: &KeySchema,
    max_bucket_size: usize,
    ignore_common_domains: bool,
) -> Candidates<'a> {
    Blocker::default()
        .with_max_bucket_size(max_bucket_size)
        .with_ignore_common_domains(ignore_common_domains)
        .make_candidates(records, schema)
}

/// Pairs from the four default passes, each email pair at most once
pub fn merge_candidates(
    records: &[Record],
    max_bucket_size: usize,
    ignore_common_domains: bool,
) -> MergedCandidates<'_> {
    MergedCandidates::new(
        Blocker::default()
            .with_max_bucket_size(max_bucket_size)
            .with_ignore_common_domains(ignore_common_domains),
        records,
    )
}
