//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where backbone models are stored
    pub model_dir: PathBuf,

    /// Directory holding the country lookup tables
    /// (`countries.json`, `iso3_to_subregion.json`, `iso3_to_lang.json`)
    pub lookup_dir: PathBuf,

    /// Root directory for persisted snapshots (`{results_dir}/{run_id}/{mode}.json`)
    pub results_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.geobias/models"),
            lookup_dir: PathBuf::from("~/.geobias/lookups"),
            results_dir: PathBuf::from("results"),
        }
    }
}

/// Feature extraction and bounded cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Whether feature vectors are extracted at all in tag and language modes
    pub enabled: bool,

    /// Maximum feature vectors kept per cache key
    pub capacity: usize,

    /// Backbone model directory name under `general.model_dir`
    pub model: String,

    /// Square input size fed to the backbone
    pub image_size: u32,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 500,
            model: "alexnet".to_string(),
            image_size: 224,
        }
    }
}

/// Which language identifier tags are run through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageModel {
    /// Trigram language profiles (`whatlang`), 69 languages
    #[default]
    Whatlang,
    /// Unicode-script heuristic; plain Latin text always reads as English
    Script,
}

/// Language classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language identifier used for the tag vote
    pub model: LanguageModel,

    /// Tags shorter than this (in characters) do not vote
    pub min_tag_chars: usize,

    /// Confidence a runner-up prediction must exceed to displace English
    pub secondary_confidence: f32,

    /// Tag that marks a sample as tourist content regardless of language
    pub travel_tag: String,

    /// Separator used inside raw country strings (`South+Korea`)
    pub name_separator: char,

    /// Fail the run when a sample's country has no ISO3 code.
    /// When false, such samples degrade to an unknown locality.
    pub strict_country_resolution: bool,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            model: LanguageModel::Whatlang,
            min_tag_chars: 3,
            secondary_confidence: 0.5,
            travel_tag: "travel".to_string(),
            name_separator: '+',
            strict_country_resolution: true,
        }
    }
}

/// Dataset loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// GeoJSON feature property holding the region name
    pub region_name_property: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            region_name_property: "name_1".to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON snapshots
    pub pretty: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
