//! GPS modes: region membership and per-region tag frequencies.

use crate::aggregate::{BucketAggregator, RegionMembership};
use crate::dataset::Dataset;
use crate::error::PipelineError;

use super::{GpsCountSnapshot, GpsTagSnapshot, MeasurementMode, Measurer};

/// Bin every sample's coordinate into a region.
///
/// Samples without a coordinate, or outside every region, land in `na`.
pub(super) fn count(
    m: &Measurer<'_>,
    dataset: &dyn Dataset,
) -> Result<GpsCountSnapshot, PipelineError> {
    let regions = dataset
        .geo_boundaries()
        .ok_or_else(|| PipelineError::MissingBoundaries {
            mode: MeasurementMode::GpsCount.to_string(),
        })?;

    let mut membership = RegionMembership::default();
    let mut unmatched = 0usize;
    for sample in dataset.samples() {
        let sample = sample?;
        m.tick();
        let region = sample.gps.and_then(|p| regions.bin_point(p.lng, p.lat));
        if region.is_none() {
            unmatched += 1;
        }
        membership.record(&sample.id, sample.gps, region);
    }

    if unmatched > 0 {
        tracing::warn!("{unmatched} samples fell outside every region");
    }
    Ok(membership)
}

/// Tally every annotation per region, using the run's gps-count membership.
///
/// When the gps-count snapshot for this run id is missing it is computed and
/// saved first. Samples with no image are skipped.
pub(super) fn tag(m: &Measurer<'_>, dataset: &dyn Dataset) -> Result<GpsTagSnapshot, PipelineError> {
    let membership = load_or_build_membership(m, dataset)?;

    let categories = dataset.categories();
    let mut region_tags = BucketAggregator::new(categories.len());
    for sample in dataset.samples() {
        let sample = sample?;
        m.tick();
        if sample.raw_input.is_none() {
            tracing::debug!("Sample {} has no image, skipping", sample.id);
            continue;
        }
        let region = membership.region_of(&sample.id);
        let indices =
            BucketAggregator::category_indices(categories, &sample.id, sample.labels(), false)?;
        region_tags.record_tags(region, &indices);
    }

    Ok(GpsTagSnapshot {
        region_tags: region_tags.into_tag_frequencies(),
    })
}

fn load_or_build_membership(
    m: &Measurer<'_>,
    dataset: &dyn Dataset,
) -> Result<RegionMembership, PipelineError> {
    if !m.store.exists(&m.run_id, MeasurementMode::GpsCount) {
        tracing::info!("No gps-count snapshot for run {:?}, computing it first", m.run_id);
        let membership = count(&m.quiet(), dataset)?;
        m.store
            .save(&m.run_id, MeasurementMode::GpsCount, &membership)?;
    }
    m.store.load(&m.run_id, MeasurementMode::GpsCount)
}
