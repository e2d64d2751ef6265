//! Events bucketed by normalized province name
//!
//! This is the join between the event list and the map: a feature named
//! "广西壮族自治区" and events entered as "广西" land in the same bucket.

use perfmap_common::province::normalize;
use perfmap_common::Performance;
use std::collections::BTreeMap;
use tracing::warn;

/// Distinct source names that normalized to one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceMerge {
    pub key: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    events: Vec<Performance>,
    /// Raw spellings seen for this key, first appearance first
    names: Vec<String>,
}

/// Province key → events, in input order within each bucket
#[derive(Debug, Clone, Default)]
pub struct ProvinceIndex {
    buckets: BTreeMap<String, Bucket>,
}

impl ProvinceIndex {
    /// Build the index, logging every merge of distinct spellings
    pub fn build(events: &[Performance]) -> Self {
        let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
        for event in events {
            let bucket = buckets.entry(normalize(&event.province)).or_default();
            if !bucket.names.contains(&event.province) {
                bucket.names.push(event.province.clone());
            }
            bucket.events.push(event.clone());
        }

        let index = Self { buckets };
        for merge in index.merges() {
            warn!(
                "Province names {:?} share the key \"{}\"; their events are combined",
                merge.names, merge.key
            );
        }
        index
    }

    /// Events for a province, looked up by any spelling
    pub fn get(&self, province: &str) -> &[Performance] {
        self.buckets
            .get(&normalize(province))
            .map(|bucket| bucket.events.as_slice())
            .unwrap_or_default()
    }

    pub fn count(&self, province: &str) -> usize {
        self.get(province).len()
    }

    /// Largest bucket size (0 when empty)
    pub fn max_count(&self) -> usize {
        self.buckets
            .values()
            .map(|bucket| bucket.events.len())
            .max()
            .unwrap_or(0)
    }

    /// Whether an artist has any event in the province
    pub fn has_artist(&self, province: &str, artist: &str) -> bool {
        self.get(province).iter().any(|event| event.artist == artist)
    }

    /// Normalized keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Keys that received more than one raw spelling
    pub fn merges(&self) -> Vec<ProvinceMerge> {
        self.buckets
            .iter()
            .filter(|(_, bucket)| bucket.names.len() > 1)
            .map(|(key, bucket)| ProvinceMerge {
                key: key.clone(),
                names: bucket.names.clone(),
            })
            .collect()
    }
}
