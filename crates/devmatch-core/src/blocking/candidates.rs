//! Candidate pair iterators

use std::collections::{HashMap, HashSet};

use super::{Blocker, KeySchema};
use crate::record::Record;

/// Lowercased email pair in sorted order
pub type DedupKey = (String, String);

/// Dedup key for a pair: order-independent and case-insensitive on the raw emails
pub fn dedup_key(a: &Record, b: &Record) -> DedupKey {
    let ea = a.email.to_lowercase();
    let eb = b.email.to_lowercase();
    if ea <= eb {
        (ea, eb)
    } else {
        (eb, ea)
    }
}

/// Within-bucket pairs for one key schema.
///
/// Bucketing happens up front; pairs are produced lazily, each unordered
/// index pair of a bucket exactly once. Buckets come out in first-seen order.
#[derive(Debug)]
pub struct Candidates<'a> {
    buckets: std::vec::IntoIter<Vec<&'a Record>>,
    current: Vec<&'a Record>,
    i: usize,
    j: usize,
}

impl<'a> Candidates<'a> {
    pub(crate) fn build(blocker: &Blocker, records: &'a [Record], schema: &KeySchema) -> Self {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<Vec<&'a Record>> = Vec::new();

        for record in records {
            let key = blocker.bucket_key(record, schema);
            let slot = *slots.entry(key).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(record);
        }

        let total = buckets.len();
        let max_bucket_size = blocker.max_bucket_size();
        let mut oversized = 0usize;
        buckets.retain(|bucket| {
            if bucket.len() > max_bucket_size {
                oversized += 1;
                false
            } else {
                bucket.len() >= 2
            }
        });

        tracing::debug!(
            "Schema {}: {} buckets, {} pairable, {} skipped as oversized",
            schema,
            total,
            buckets.len(),
            oversized
        );

        Self {
            buckets: buckets.into_iter(),
            current: Vec::new(),
            i: 0,
            j: 1,
        }
    }
}

impl<'a> Iterator for Candidates<'a> {
    type Item = (&'a Record, &'a Record);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.i < self.current.len() {
                if self.j < self.current.len() {
                    let pair = (self.current[self.i], self.current[self.j]);
                    self.j += 1;
                    return Some(pair);
                }
                self.i += 1;
                self.j = self.i + 1;
                continue;
            }

            self.current = self.buckets.next()?;
            self.i = 0;
            self.j = 1;
        }
    }
}

/// Union of all blocking passes with cross-pass deduplication.
///
/// Passes run in order; a pair is yielded only the first time its
/// [`DedupKey`] is seen, so earlier passes claim shared pairs.
#[derive(Debug)]
pub struct MergedCandidates<'a> {
    blocker: Blocker,
    records: &'a [Record],
    pass: usize,
    current: Option<Candidates<'a>>,
    seen: HashSet<DedupKey>,
    emitted: usize,
}

impl<'a> MergedCandidates<'a> {
    pub(crate) fn new(blocker: Blocker, records: &'a [Record]) -> Self {
        Self {
            blocker,
            records,
            pass: 0,
            current: None,
            seen: HashSet::new(),
            emitted: 0,
        }
    }
}

impl<'a> Iterator for MergedCandidates<'a> {
    type Item = (&'a Record, &'a Record);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                for (a, b) in current.by_ref() {
                    if self.seen.insert(dedup_key(a, b)) {
                        self.emitted += 1;
                        return Some((a, b));
                    }
                }
                tracing::debug!(
                    "Pass {} done, {} unique pairs so far",
                    self.pass,
                    self.emitted
                );
                self.current = None;
                self.pass += 1;
            }

            let schema = self.blocker.passes().get(self.pass)?;
            self.current = Some(Candidates::build(&self.blocker, self.records, schema));
        }
    }
}
