//! Tag mode: per-country tag frequencies plus features per (tag, subregion).

use std::collections::BTreeMap;

use crate::aggregate::BucketAggregator;
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::features::FeatureCache;
use crate::types::FeatureRecord;

use super::{Measurer, TagSnapshot};

pub(super) fn run(m: &Measurer<'_>, dataset: &dyn Dataset) -> Result<TagSnapshot, PipelineError> {
    let categories = dataset.categories();
    let mut country_tags = BucketAggregator::new(categories.len());

    // Every (category, known subregion) pair appears in the snapshot, even if empty
    let mut cache: FeatureCache<(usize, String)> = FeatureCache::new(m.capacity);
    for idx in 0..categories.len() {
        for subregion in m.countries.subregions() {
            cache.ensure_key((idx, subregion.to_string()));
        }
    }

    let mut skipped = 0usize;
    for sample in dataset.samples() {
        let sample = sample?;
        m.tick();
        let Some(image) = sample.raw_input.as_ref() else {
            skipped += 1;
            continue;
        };

        let indices =
            BucketAggregator::category_indices(categories, &sample.id, sample.labels(), true)?;
        country_tags.record_tags(sample.country_or_unmatched(), &indices);

        let Some(extractor) = m.extractor else {
            continue;
        };
        let subregion = m.subregion_of(sample.country.as_deref());
        let wanted: Vec<(usize, String)> = indices
            .iter()
            .map(|&idx| (idx, subregion.clone()))
            .filter(|key| cache.has_room(key))
            .collect();
        if wanted.is_empty() {
            continue;
        }

        // One extraction serves every tag of the sample
        let feature = extractor.extract(image, &sample.id)?;
        for key in wanted {
            cache.push(
                key,
                FeatureRecord {
                    feature: feature.clone(),
                    sample_id: sample.id.clone(),
                },
            );
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {skipped} samples without an image");
    }

    let mut tag_to_subregion_features: BTreeMap<usize, BTreeMap<String, Vec<FeatureRecord>>> =
        BTreeMap::new();
    for ((idx, subregion), records) in cache.into_inner() {
        tag_to_subregion_features
            .entry(idx)
            .or_default()
            .insert(subregion, records);
    }

    Ok(TagSnapshot {
        country_tags: country_tags.into_tag_frequencies(),
        tag_to_subregion_features,
    })
}
