//! Running per-bucket counters.
//!
//! All maps are `BTreeMap`s so a snapshot of an unchanged dataset serializes
//! byte-for-byte the same on every run.

pub mod categories;

pub use categories::Categories;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::{GpsCoord, UNMATCHED};

/// Per-bucket sample counts and tag-frequency vectors.
#[derive(Debug, Clone)]
pub struct BucketAggregator {
    width: usize,
    counts: BTreeMap<String, u64>,
    tag_freq: BTreeMap<String, Vec<u64>>,
}

impl BucketAggregator {
    /// Create an aggregator whose frequency vectors have one slot per category.
    pub fn new(category_count: usize) -> Self {
        Self {
            width: category_count,
            counts: BTreeMap::new(),
            tag_freq: BTreeMap::new(),
        }
    }

    /// Count one sample in `bucket`.
    pub fn record(&mut self, bucket: &str) {
        *self.counts.entry(bucket.to_string()).or_insert(0) += 1;
    }

    /// Resolve a sample's labels to category indices.
    ///
    /// Fails on the first label outside the vocabulary. With `distinct`, repeated
    /// categories are dropped, keeping first-occurrence order.
    pub fn category_indices<'a>(
        categories: &Categories,
        sample_id: &str,
        labels: impl IntoIterator<Item = &'a str>,
        distinct: bool,
    ) -> Result<Vec<usize>, PipelineError> {
        let mut indices = Vec::new();
        for label in labels {
            let idx = categories.require(sample_id, label)?;
            if !distinct || !indices.contains(&idx) {
                indices.push(idx);
            }
        }
        Ok(indices)
    }

    /// Add one to `tag_freq[bucket][idx]` for every index given.
    ///
    /// The first reference to a bucket creates its all-zero vector.
    pub fn record_tags(&mut self, bucket: &str, indices: &[usize]) {
        let width = self.width;
        let freq = self
            .tag_freq
            .entry(bucket.to_string())
            .or_insert_with(|| vec![0; width]);
        for &idx in indices {
            freq[idx] += 1;
        }
    }

    /// Sample count for a bucket.
    pub fn count(&self, bucket: &str) -> u64 {
        self.counts.get(bucket).copied().unwrap_or(0)
    }

    /// Frequency vector for a bucket, if any sample has been recorded there.
    pub fn tag_frequencies(&self, bucket: &str) -> Option<&[u64]> {
        self.tag_freq.get(bucket).map(Vec::as_slice)
    }

    /// Consume the aggregator, returning the count map.
    pub fn into_counts(self) -> BTreeMap<String, u64> {
        self.counts
    }

    /// Consume the aggregator, returning the frequency map.
    pub fn into_tag_frequencies(self) -> BTreeMap<String, Vec<u64>> {
        self.tag_freq
    }
}

/// Which region each sample landed in, and which samples each region holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionMembership {
    /// Region name to sample ids, in iteration order
    pub region_to_id: BTreeMap<String, Vec<String>>,
    /// Sample id to its coordinate
    pub id_to_gps: BTreeMap<String, GpsCoord>,
    /// Sample id to its region name (or `na`)
    pub id_to_region: BTreeMap<String, String>,
}

impl RegionMembership {
    /// Record a sample's coordinate and region; `None` lands in the `na` bucket.
    pub fn record(&mut self, sample_id: &str, gps: Option<GpsCoord>, region: Option<&str>) {
        if let Some(coord) = gps {
            self.id_to_gps.insert(sample_id.to_string(), coord);
        }
        let region = region.unwrap_or(UNMATCHED).to_string();
        self.region_to_id
            .entry(region.clone())
            .or_default()
            .push(sample_id.to_string());
        self.id_to_region.insert(sample_id.to_string(), region);
    }

    /// Region for a sample id, `na` when the id was never seen.
    pub fn region_of(&self, sample_id: &str) -> &str {
        self.id_to_region
            .get(sample_id)
            .map(String::as_str)
            .unwrap_or(UNMATCHED)
    }
}
