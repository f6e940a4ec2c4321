//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "features.capacity must be > 0".into(),
            ));
        }
        if self.features.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "features.image_size must be > 0".into(),
            ));
        }
        if self.language.min_tag_chars == 0 {
            return Err(ConfigError::ValidationError(
                "language.min_tag_chars must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.language.secondary_confidence) {
            return Err(ConfigError::ValidationError(
                "language.secondary_confidence must be between 0.0 and 1.0".into(),
            ));
        }
        if self.language.travel_tag.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "language.travel_tag must not be empty".into(),
            ));
        }
        if self.dataset.region_name_property.is_empty() {
            return Err(ConfigError::ValidationError(
                "dataset.region_name_property must not be empty".into(),
            ));
        }
        Ok(())
    }
}
