//! GeoBias Core - geographic and linguistic bias measurement for image-tag datasets.
//!
//! GeoBias makes one sequential pass over a dataset of tagged images and
//! aggregates where the images come from, what they are tagged with, and which
//! language the tags are written in. Each pass produces a JSON snapshot that
//! downstream analysis loads back by run id.
//!
//! # Architecture
//!
//! ```text
//! Dataset → Sample → (country/region lookup, tag vote, features) → Aggregate → Snapshot
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use geobias_core::{Config, CountryDatabase, ManifestDataset, MeasurementMode, Measurer, ResultStore};
//!
//! let config = Config::load()?;
//! let countries = CountryDatabase::load(&config.lookup_dir())?;
//! let store = ResultStore::new(config.results_dir(), config.output.pretty);
//! let dataset = ManifestDataset::open("./dataset".as_ref(), &config.dataset.region_name_property)?;
//!
//! let measurer = Measurer::new(&config, &countries, &store, "run1");
//! let path = measurer.run_and_save(MeasurementMode::Count, &dataset)?;
//! println!("Wrote {:?}", path);
//! ```

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod geography;
pub mod language;
pub mod measure;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use aggregate::{BucketAggregator, Categories, RegionMembership};
pub use config::Config;
pub use dataset::{Dataset, ManifestDataset, MemoryDataset};
pub use error::{ConfigError, GeoBiasError, PipelineError, PipelineResult, Result};
pub use features::{BackboneEngine, FeatureCache, FeatureExtractor};
pub use geography::{CountryDatabase, RegionSet};
pub use language::{LanguageClassifier, LanguageDetector, ScriptDetector};
pub use measure::{MeasurementMode, Measurer, Snapshot};
pub use store::ResultStore;
pub use types::{FeatureRecord, GpsCoord, LocalityClass, Sample, UNMATCHED};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
