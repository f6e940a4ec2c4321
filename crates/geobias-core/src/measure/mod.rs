//! Measurement modes and the orchestrator that runs them.
//!
//! Each mode makes one sequential pass over a dataset and yields one snapshot:
//!
//! ```text
//! count      raw country string -> sample count
//! gps-count  GPS point -> region; region membership lists
//! tag        per-country tag frequencies + per (tag, subregion) features
//! gps-tag    per-region tag frequencies (reuses gps-count membership)
//! language   dominant tag language per country + per (country, locality) features
//! ```
//!
//! The mode is always chosen by the caller. [`MeasurementMode::for_dataset`]
//! is the explicit switch to the GPS variant for datasets with boundaries.

mod count;
mod gps;
mod language;
mod tag;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::RegionMembership;
use crate::config::{Config, LanguageConfig};
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::features::FeatureExtractor;
use crate::geography::CountryDatabase;
use crate::language::{detector_for, LanguageDetector};
use crate::store::ResultStore;
use crate::types::{FeatureRecord, UNMATCHED};

/// The five measurement modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementMode {
    /// Samples per raw country string
    Count,
    /// Samples per GPS region
    GpsCount,
    /// Tag frequencies per country, features per (tag, subregion)
    Tag,
    /// Tag frequencies per GPS region
    GpsTag,
    /// Tag language and locality per country
    Language,
}

impl MeasurementMode {
    /// All modes, in pipeline order.
    pub const ALL: [MeasurementMode; 5] = [
        MeasurementMode::Count,
        MeasurementMode::GpsCount,
        MeasurementMode::Tag,
        MeasurementMode::GpsTag,
        MeasurementMode::Language,
    ];

    /// Name used for snapshot files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            MeasurementMode::Count => "count",
            MeasurementMode::GpsCount => "gps-count",
            MeasurementMode::Tag => "tag",
            MeasurementMode::GpsTag => "gps-tag",
            MeasurementMode::Language => "language",
        }
    }

    /// The mode to run for a dataset that does or does not carry region boundaries.
    ///
    /// Count and tag switch to their GPS variants when boundaries are present;
    /// every other mode is returned unchanged.
    pub fn for_dataset(self, has_boundaries: bool) -> Self {
        match (self, has_boundaries) {
            (MeasurementMode::Count, true) => MeasurementMode::GpsCount,
            (MeasurementMode::Tag, true) => MeasurementMode::GpsTag,
            (mode, _) => mode,
        }
    }

    /// Whether the mode looks at sample images.
    pub fn needs_images(&self) -> bool {
        matches!(
            self,
            MeasurementMode::Tag | MeasurementMode::GpsTag | MeasurementMode::Language
        )
    }

    /// Whether the mode extracts feature vectors.
    pub fn needs_features(&self) -> bool {
        matches!(self, MeasurementMode::Tag | MeasurementMode::Language)
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasurementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasurementMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown measurement mode: {s}"))
    }
}

/// Count mode output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountSnapshot {
    /// Raw country string to sample count
    pub counts: BTreeMap<String, u64>,
}

/// GPS count mode output.
pub type GpsCountSnapshot = RegionMembership;

/// Tag mode output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSnapshot {
    /// Raw country string to per-category counts
    pub country_tags: BTreeMap<String, Vec<u64>>,
    /// Category index to subregion to cached features
    pub tag_to_subregion_features: BTreeMap<usize, BTreeMap<String, Vec<FeatureRecord>>>,
}

/// GPS tag mode output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsTagSnapshot {
    /// Region name to per-category counts
    pub region_tags: BTreeMap<String, Vec<u64>>,
}

/// Cached features for one country, split by locality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalityFeatures {
    /// Features of samples classified as tourist content
    pub tourist: Vec<FeatureRecord>,
    /// Features of samples classified as local content
    pub local: Vec<FeatureRecord>,
}

/// Language mode output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageSnapshot {
    /// Dominant language to number of samples
    pub lang_counts: BTreeMap<String, u64>,
    /// Raw country string to the dominant language of each of its samples
    pub country_with_langs: BTreeMap<String, Vec<String>>,
    /// Raw country string to locality-split features
    pub country_with_imgs: BTreeMap<String, LocalityFeatures>,
}

/// Result of one measurement run.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Count(CountSnapshot),
    GpsCount(GpsCountSnapshot),
    Tag(TagSnapshot),
    GpsTag(GpsTagSnapshot),
    Language(LanguageSnapshot),
}

impl Snapshot {
    /// The mode that produced this snapshot.
    pub fn mode(&self) -> MeasurementMode {
        match self {
            Snapshot::Count(_) => MeasurementMode::Count,
            Snapshot::GpsCount(_) => MeasurementMode::GpsCount,
            Snapshot::Tag(_) => MeasurementMode::Tag,
            Snapshot::GpsTag(_) => MeasurementMode::GpsTag,
            Snapshot::Language(_) => MeasurementMode::Language,
        }
    }
}

/// Drives one measurement pass over a dataset.
///
/// Capabilities are injected: without an extractor, tag and language modes
/// still tally counts but cache no features.
#[derive(Clone)]
pub struct Measurer<'a> {
    countries: &'a CountryDatabase,
    store: &'a ResultStore,
    run_id: String,
    capacity: usize,
    language: LanguageConfig,
    extractor: Option<&'a dyn FeatureExtractor>,
    detector: &'a dyn LanguageDetector,
    progress: Option<&'a dyn Fn()>,
}

impl<'a> Measurer<'a> {
    /// Create a measurer for one run id.
    pub fn new(
        config: &Config,
        countries: &'a CountryDatabase,
        store: &'a ResultStore,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            countries,
            store,
            run_id: run_id.into(),
            capacity: config.features.capacity,
            language: config.language.clone(),
            extractor: None,
            detector: detector_for(config.language.model),
            progress: None,
        }
    }

    /// Use this feature extractor in tag and language modes.
    pub fn with_extractor(mut self, extractor: &'a dyn FeatureExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Use this language detector in language mode instead of the one
    /// `[language] model` selects.
    pub fn with_detector(mut self, detector: &'a dyn LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Call `tick` once per sample consumed by the main pass.
    pub fn with_progress(mut self, tick: &'a dyn Fn()) -> Self {
        self.progress = Some(tick);
        self
    }

    /// Run id snapshots are stored under.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run one mode to completion.
    pub fn run(&self, mode: MeasurementMode, dataset: &dyn Dataset) -> Result<Snapshot, PipelineError> {
        tracing::info!("Starting {} run {:?}", mode, self.run_id);
        let snapshot = match mode {
            MeasurementMode::Count => Snapshot::Count(count::run(self, dataset)?),
            MeasurementMode::GpsCount => Snapshot::GpsCount(gps::count(self, dataset)?),
            MeasurementMode::Tag => Snapshot::Tag(tag::run(self, dataset)?),
            MeasurementMode::GpsTag => Snapshot::GpsTag(gps::tag(self, dataset)?),
            MeasurementMode::Language => Snapshot::Language(language::run(self, dataset)?),
        };
        tracing::info!("Finished {} run {:?}", mode, self.run_id);
        Ok(snapshot)
    }

    /// Run one mode and persist its snapshot. Returns the snapshot path.
    pub fn run_and_save(
        &self,
        mode: MeasurementMode,
        dataset: &dyn Dataset,
    ) -> Result<std::path::PathBuf, PipelineError> {
        let snapshot = self.run(mode, dataset)?;
        self.save(&snapshot)
    }

    /// Persist a snapshot under this run id.
    pub fn save(&self, snapshot: &Snapshot) -> Result<std::path::PathBuf, PipelineError> {
        let mode = snapshot.mode();
        match snapshot {
            Snapshot::Count(s) => self.store.save(&self.run_id, mode, s),
            Snapshot::GpsCount(s) => self.store.save(&self.run_id, mode, s),
            Snapshot::Tag(s) => self.store.save(&self.run_id, mode, s),
            Snapshot::GpsTag(s) => self.store.save(&self.run_id, mode, s),
            Snapshot::Language(s) => self.store.save(&self.run_id, mode, s),
        }
    }

    fn tick(&self) {
        if let Some(tick) = self.progress {
            tick();
        }
    }

    /// Same configuration without the progress callback.
    fn quiet(&self) -> Self {
        Self {
            progress: None,
            ..self.clone()
        }
    }

    /// Subregion bucket for a raw country string, `na` on any lookup miss.
    fn subregion_of(&self, country: Option<&str>) -> String {
        country
            .and_then(|c| self.countries.country_to_iso3(c))
            .and_then(|iso3| self.countries.subregion(&iso3).map(str::to_string))
            .unwrap_or_else(|| UNMATCHED.to_string())
    }
}
