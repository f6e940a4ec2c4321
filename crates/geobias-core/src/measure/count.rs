//! Count mode: samples per raw country string.
//!
//! Country strings are used as-is, without ISO3 normalization, so the buckets
//! here can differ from the ones tag and language modes use.

use crate::aggregate::BucketAggregator;
use crate::dataset::Dataset;
use crate::error::PipelineError;

use super::{CountSnapshot, Measurer};

pub(super) fn run(m: &Measurer<'_>, dataset: &dyn Dataset) -> Result<CountSnapshot, PipelineError> {
    let mut counts = BucketAggregator::new(0);
    for sample in dataset.samples() {
        let sample = sample?;
        m.tick();
        counts.record(sample.country_or_unmatched());
    }
    Ok(CountSnapshot {
        counts: counts.into_counts(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{dataset, sample};
    use super::super::{MeasurementMode, Measurer, Snapshot};
    use crate::config::Config;
    use crate::geography::CountryDatabase;
    use crate::store::ResultStore;
    use crate::types::UNMATCHED;

    #[test]
    fn test_counts_raw_country_strings() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = CountryDatabase::default();
        let measurer = Measurer::new(&Config::default(), &db, &store, "r");

        let ds = dataset(
            vec![
                sample("a", Some("South+Korea"), &[]),
                sample("b", Some("South+Korea"), &[]),
                sample("c", Some("Korea"), &[]),
                sample("d", None, &[]),
            ],
            &[],
        );
        let Snapshot::Count(out) = measurer.run(MeasurementMode::Count, &ds).unwrap() else {
            panic!("expected count snapshot");
        };
        assert_eq!(out.counts["South+Korea"], 2);
        assert_eq!(out.counts["Korea"], 1);
        assert_eq!(out.counts[UNMATCHED], 1);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = CountryDatabase::default();
        let measurer = Measurer::new(&Config::default(), &db, &store, "r");
        let ds = dataset(
            vec![
                sample("a", Some("Peru"), &[]),
                sample("b", Some("Chile"), &[]),
                sample("c", Some("Peru"), &[]),
            ],
            &[],
        );

        let first = measurer.run(MeasurementMode::Count, &ds).unwrap();
        let first_bytes = std::fs::read(measurer.save(&first).unwrap()).unwrap();
        let second = measurer.run(MeasurementMode::Count, &ds).unwrap();
        let second_bytes = std::fs::read(measurer.save(&second).unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }
}
