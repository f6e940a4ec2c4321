//! Core data types shared by the measurement modes.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel bucket for samples that resolve to no country or region.
pub const UNMATCHED: &str = "na";

/// A GPS coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoord {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// One annotation record attached to a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// The tag text (e.g. "beach", "plage", "travel")
    pub label: String,
}

impl Annotation {
    /// Create an annotation with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A single dataset sample, consumed once per iteration step.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Unique sample id (typically the source filename)
    pub id: String,

    /// Raw country string as supplied by the dataset (`South+Korea`)
    pub country: Option<String>,

    /// Capture coordinate, if known
    pub gps: Option<GpsCoord>,

    /// Annotation tags in dataset order
    pub annotations: Vec<Annotation>,

    /// Decoded image; `None` when the input is missing or unreadable
    pub raw_input: Option<DynamicImage>,
}

impl Sample {
    /// Tag labels in annotation order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|a| a.label.as_str())
    }

    /// The raw country string, or the unmatched sentinel.
    pub fn country_or_unmatched(&self) -> &str {
        self.country.as_deref().unwrap_or(UNMATCHED)
    }
}

/// Whether a sample's tags look like they were written by a resident or a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalityClass {
    /// Tagged in a local language without naming the country or "travel"
    Local,
    /// Tagged in a non-local language, or tagged "travel"
    Tourist,
    /// Local languages unknown, or the rules disagree
    Unknown,
}

impl LocalityClass {
    /// Lowercase name used in snapshots and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalityClass::Local => "local",
            LocalityClass::Tourist => "tourist",
            LocalityClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LocalityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached feature vector together with the sample it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Backbone output for the sample's image
    pub feature: Vec<f32>,
    /// Id of the contributing sample
    pub sample_id: String,
}
