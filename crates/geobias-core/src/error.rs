//! Error types for the geobias measurement pipeline.
//!
//! Resolution misses (unknown country, point outside every region) are not
//! errors: they land in the `na` bucket. The variants here are the failures
//! that either stop a run or need to be reported with the sample that caused them.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for geobias operations.
#[derive(Error, Debug)]
pub enum GeoBiasError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Measurement errors, organized by the lookup or stage that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A sample carries a tag that is not part of the category vocabulary
    #[error("Sample {sample_id}: tag {label:?} is not in the category vocabulary")]
    VocabularyMiss { sample_id: String, label: String },

    /// Neither the country database nor the override table knows this country
    #[error("Sample {sample_id}: country {country:?} could not be resolved to an ISO3 code")]
    UnresolvedCountry { sample_id: String, country: String },

    /// A GPS mode was requested for a dataset without region geometries
    #[error("Mode {mode} requires region geometries but the dataset has none")]
    MissingBoundaries { mode: String },

    /// The dataset collaborator failed to produce a sample
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// A static lookup table could not be read or parsed
    #[error("Lookup table {path}: {message}")]
    Lookup { path: PathBuf, message: String },

    /// Region geometry could not be converted to polygons
    #[error("Geometry error: {message}")]
    Geometry { message: String },

    /// Feature extraction failed for a sample
    #[error("Feature extraction failed for sample {sample_id}: {message}")]
    Extraction { sample_id: String, message: String },

    /// The feature backbone could not be loaded or run
    #[error("Model error for {path}: {message}")]
    Model { path: PathBuf, message: String },

    /// A persisted snapshot could not be written or read back
    #[error("Snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

/// Convenience type alias for geobias results.
pub type Result<T> = std::result::Result<T, GeoBiasError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
