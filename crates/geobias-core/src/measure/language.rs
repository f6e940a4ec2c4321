//! Language mode: dominant tag language per country and locality-split features.

use std::collections::BTreeMap;

use crate::aggregate::BucketAggregator;
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::features::FeatureCache;
use crate::language::LanguageClassifier;
use crate::types::{FeatureRecord, LocalityClass};

use super::{LanguageSnapshot, LocalityFeatures, Measurer};

pub(super) fn run(
    m: &Measurer<'_>,
    dataset: &dyn Dataset,
) -> Result<LanguageSnapshot, PipelineError> {
    let classifier = LanguageClassifier::new(m.detector, m.countries, &m.language);

    let mut lang_counts = BucketAggregator::new(0);
    let mut country_with_langs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut cache: FeatureCache<(String, LocalityClass)> = FeatureCache::new(m.capacity);
    let mut unknown = 0usize;

    for sample in dataset.samples() {
        let sample = sample?;
        m.tick();
        let Some(image) = sample.raw_input.as_ref() else {
            continue;
        };
        let Some(vote) = classifier.vote(sample.labels()) else {
            tracing::debug!("Sample {} has no tag long enough to vote", sample.id);
            continue;
        };

        let country = sample.country_or_unmatched().to_string();
        lang_counts.record(&vote.dominant_language);
        country_with_langs
            .entry(country.clone())
            .or_default()
            .push(vote.dominant_language.clone());

        let locality = classifier.locality(&sample.id, sample.country.as_deref(), &vote)?;
        cache.ensure_key((country.clone(), LocalityClass::Tourist));
        cache.ensure_key((country.clone(), LocalityClass::Local));
        if locality == LocalityClass::Unknown {
            unknown += 1;
            continue;
        }

        if let Some(extractor) = m.extractor {
            cache.try_insert((country, locality), || {
                extractor
                    .extract(image, &sample.id)
                    .map(|feature| FeatureRecord {
                        feature,
                        sample_id: sample.id.clone(),
                    })
            })?;
        }
    }

    if unknown > 0 {
        tracing::info!("{unknown} samples had an unknown locality and were not cached");
    }

    let mut country_with_imgs: BTreeMap<String, LocalityFeatures> = BTreeMap::new();
    for ((country, locality), records) in cache.into_inner() {
        let entry = country_with_imgs.entry(country).or_default();
        match locality {
            LocalityClass::Tourist => entry.tourist = records,
            LocalityClass::Local => entry.local = records,
            LocalityClass::Unknown => {}
        }
    }

    Ok(LanguageSnapshot {
        lang_counts: lang_counts.into_counts(),
        country_with_langs,
        country_with_imgs,
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{dataset, sample};
    use super::super::{LanguageSnapshot, MeasurementMode, Measurer, Snapshot};
    use crate::config::{Config, LanguageModel};
    use crate::error::PipelineError;
    use crate::features::tests::CountingExtractor;
    use crate::geography::country::tests::sample_database;
    use crate::geography::CountryDatabase;
    use crate::language::classifier::tests::TableDetector;
    use crate::store::ResultStore;
    use crate::types::UNMATCHED;

    fn detector() -> TableDetector {
        TableDetector::new(&[
            ("plage", "fr", 0.9),
            ("soleil", "fr", 0.8),
            ("strand", "de", 0.9),
            ("bahnhof", "de", 0.4),
        ])
    }

    fn run_language(measurer: &Measurer<'_>, ds: &dyn crate::dataset::Dataset) -> LanguageSnapshot {
        match measurer.run(MeasurementMode::Language, ds).unwrap() {
            Snapshot::Language(out) => out,
            other => panic!("expected language snapshot, got {:?}", other.mode()),
        }
    }

    fn measurer<'a>(
        config: &Config,
        db: &'a CountryDatabase,
        store: &'a ResultStore,
        detector: &'a TableDetector,
        extractor: &'a CountingExtractor,
    ) -> Measurer<'a> {
        Measurer::new(config, db, store, "r")
            .with_detector(detector)
            .with_extractor(extractor)
    }

    #[test]
    fn test_dominant_language_per_country() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let detector = detector();
        let extractor = CountingExtractor::default();
        let m = measurer(&Config::default(), &db, &store, &detector, &extractor);

        let ds = dataset(
            vec![
                // English majority, but a confident French runner-up
                sample("a", Some("France"), &["beach", "sunset", "plage"]),
                // English majority, German runner-up not confident enough
                sample("b", Some("Germany"), &["beach", "sunset", "bahnhof"]),
                sample("c", Some("Germany"), &["strand"]),
                // Nothing long enough to vote
                sample("d", Some("France"), &["ok"]),
            ],
            &[],
        );
        let out = run_language(&m, &ds);

        assert_eq!(out.lang_counts["fr"], 1);
        assert_eq!(out.lang_counts["en"], 1);
        assert_eq!(out.lang_counts["de"], 1);
        assert_eq!(out.country_with_langs["France"], vec!["fr".to_string()]);
        assert_eq!(
            out.country_with_langs["Germany"],
            vec!["en".to_string(), "de".to_string()]
        );
    }

    #[test]
    fn test_local_and_tourist_features() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let detector = detector();
        let extractor = CountingExtractor::default();
        let m = measurer(&Config::default(), &db, &store, &detector, &extractor);

        let ds = dataset(
            vec![
                sample("local", Some("France"), &["plage", "soleil"]),
                sample("visitor", Some("France"), &["beach", "sunset"]),
                sample("travel", Some("France"), &["plage", "travel"]),
            ],
            &[],
        );
        let out = run_language(&m, &ds);

        let france = &out.country_with_imgs["France"];
        let local: Vec<&str> = france.local.iter().map(|r| r.sample_id.as_str()).collect();
        let tourist: Vec<&str> = france.tourist.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(local, vec!["local"]);
        assert_eq!(tourist, vec!["visitor", "travel"]);
        assert_eq!(extractor.calls.get(), 3);
    }

    #[test]
    fn test_capacity_per_country_and_locality() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let detector = detector();
        let extractor = CountingExtractor::default();
        let mut config = Config::default();
        config.features.capacity = 1;
        let m = measurer(&config, &db, &store, &detector, &extractor);

        let ds = dataset(
            vec![
                sample("a", Some("France"), &["plage"]),
                sample("b", Some("France"), &["plage"]),
                sample("c", Some("France"), &["beach"]),
                sample("d", Some("France"), &["beach"]),
            ],
            &[],
        );
        let out = run_language(&m, &ds);

        let france = &out.country_with_imgs["France"];
        assert_eq!(france.local.len(), 1);
        assert_eq!(france.tourist.len(), 1);
        assert_eq!(france.local[0].sample_id, "a");
        assert_eq!(france.tourist[0].sample_id, "c");
        assert_eq!(extractor.calls.get(), 2);
        // Counting is unaffected by the cache
        assert_eq!(out.country_with_langs["France"].len(), 4);
    }

    #[test]
    fn test_unknown_locality_counted_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let detector = detector();
        let extractor = CountingExtractor::default();
        let m = measurer(&Config::default(), &db, &store, &detector, &extractor);

        let ds = dataset(
            vec![
                // Local language, but a tag names the country
                sample("a", Some("France"), &["plage", "France"]),
                // Country has no language entry
                sample("b", Some("Ivory+Coast"), &["beach"]),
                sample("c", None, &["beach"]),
            ],
            &[],
        );
        let out = run_language(&m, &ds);

        assert_eq!(extractor.calls.get(), 0);
        assert_eq!(out.lang_counts.values().sum::<u64>(), 3);
        assert_eq!(out.country_with_langs[UNMATCHED], vec!["en".to_string()]);
        assert!(out.country_with_imgs["France"].local.is_empty());
        assert!(out.country_with_imgs["France"].tourist.is_empty());
        assert!(out.country_with_imgs.contains_key("Ivory+Coast"));
    }

    #[test]
    fn test_samples_without_image_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let detector = detector();
        let extractor = CountingExtractor::default();
        let m = measurer(&Config::default(), &db, &store, &detector, &extractor);

        let mut missing = sample("a", Some("France"), &["plage"]);
        missing.raw_input = None;
        let out = run_language(&m, &dataset(vec![missing], &[]));
        assert!(out.lang_counts.is_empty());
        assert!(out.country_with_imgs.is_empty());
    }

    #[test]
    fn test_unresolved_country_fails_strict_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let detector = detector();
        let extractor = CountingExtractor::default();
        let m = measurer(&Config::default(), &db, &store, &detector, &extractor);

        let ds = dataset(vec![sample("s7", Some("Atlantis"), &["beach"])], &[]);
        let err = m.run(MeasurementMode::Language, &ds).unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedCountry { .. }));
    }

    #[test]
    fn test_configured_model_reads_latin_languages() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let db = sample_database();
        let extractor = CountingExtractor::default();
        let ds = dataset(
            vec![sample(
                "a",
                Some("France"),
                &[
                    "une belle journée à la plage avec toute la famille",
                    "le soleil se couche lentement sur la mer",
                ],
            )],
            &[],
        );

        let config = Config::default();
        let m = Measurer::new(&config, &db, &store, "r").with_extractor(&extractor);
        let out = run_language(&m, &ds);
        assert_eq!(out.lang_counts.keys().collect::<Vec<_>>(), vec!["fr"]);
        assert_eq!(out.country_with_imgs["France"].local.len(), 1);
        assert!(out.country_with_imgs["France"].tourist.is_empty());

        // The script heuristic reads the same tags as English
        let mut config = Config::default();
        config.language.model = LanguageModel::Script;
        let m = Measurer::new(&config, &db, &store, "r").with_extractor(&extractor);
        let out = run_language(&m, &ds);
        assert_eq!(out.lang_counts.keys().collect::<Vec<_>>(), vec!["en"]);
        assert_eq!(out.country_with_imgs["France"].tourist.len(), 1);
    }
}
