//! Dominant-language vote and local/tourist classification for one sample.
//!
//! A sample's qualifying tags each get a language prediction. The most frequent
//! language wins, except that English gives way to the runner-up language when
//! any runner-up prediction is confident enough. The dominant language is then
//! compared against the languages spoken in the sample's country.

use crate::config::LanguageConfig;
use crate::error::PipelineError;
use crate::geography::CountryDatabase;
use crate::types::LocalityClass;

use super::detector::{LanguageDetector, Prediction};

const ENGLISH: &str = "en";

/// Outcome of the language vote for a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageVote {
    /// Winning language code
    pub dominant_language: String,
    /// Tags that took part in the vote
    pub tags: Vec<String>,
}

/// Full classification for a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Winning language code
    pub dominant_language: String,
    /// Local, tourist or unknown relative to the sample's country
    pub locality: LocalityClass,
}

/// Classifies samples by the language of their tags.
pub struct LanguageClassifier<'a> {
    detector: &'a dyn LanguageDetector,
    countries: &'a CountryDatabase,
    config: &'a LanguageConfig,
}

impl<'a> LanguageClassifier<'a> {
    /// Create a classifier over the given detector and country tables.
    pub fn new(
        detector: &'a dyn LanguageDetector,
        countries: &'a CountryDatabase,
        config: &'a LanguageConfig,
    ) -> Self {
        Self {
            detector,
            countries,
            config,
        }
    }

    /// Run the language vote over a sample's tags.
    ///
    /// Returns `None` when no tag is long enough to vote.
    pub fn vote<'t>(&self, labels: impl IntoIterator<Item = &'t str>) -> Option<LanguageVote> {
        let tags: Vec<String> = labels
            .into_iter()
            .filter(|label| label.chars().count() >= self.config.min_tag_chars)
            .map(str::to_string)
            .collect();
        if tags.is_empty() {
            return None;
        }

        let predictions: Vec<Prediction> = tags.iter().map(|t| self.detector.detect(t)).collect();
        let dominant_language =
            dominant_language(&predictions, self.config.secondary_confidence)?;

        Some(LanguageVote {
            dominant_language,
            tags,
        })
    }

    /// Classify a voted sample as local, tourist or unknown for its country.
    ///
    /// A present country string with no ISO3 code is an error under strict
    /// resolution and an unknown locality otherwise. A missing country string,
    /// or a country with no language entry, is always unknown.
    pub fn locality(
        &self,
        sample_id: &str,
        country: Option<&str>,
        vote: &LanguageVote,
    ) -> Result<LocalityClass, PipelineError> {
        let Some(country) = country else {
            tracing::debug!("Sample {sample_id} has no country, locality unknown");
            return Ok(LocalityClass::Unknown);
        };

        let Some(iso3) = self.countries.country_to_iso3(country) else {
            if self.config.strict_country_resolution {
                return Err(PipelineError::UnresolvedCountry {
                    sample_id: sample_id.to_string(),
                    country: country.to_string(),
                });
            }
            tracing::warn!("Sample {sample_id}: no ISO3 code for {country:?}, locality unknown");
            return Ok(LocalityClass::Unknown);
        };

        let Some(local_languages) = self.countries.local_languages(&iso3) else {
            tracing::warn!("No local languages known for {iso3}, locality unknown");
            return Ok(LocalityClass::Unknown);
        };

        let name_variants = self
            .countries
            .name_variants(country, self.config.name_separator);

        Ok(locality(
            &vote.dominant_language,
            &vote.tags,
            local_languages,
            &name_variants,
            &self.config.travel_tag,
        ))
    }

    /// Vote and classify in one step. `None` when the sample has no qualifying tags.
    pub fn classify<'t>(
        &self,
        sample_id: &str,
        country: Option<&str>,
        labels: impl IntoIterator<Item = &'t str>,
    ) -> Result<Option<Classification>, PipelineError> {
        let Some(vote) = self.vote(labels) else {
            return Ok(None);
        };
        let locality = self.locality(sample_id, country, &vote)?;
        Ok(Some(Classification {
            dominant_language: vote.dominant_language,
            locality,
        }))
    }
}

/// Majority language over `predictions`, with English deprioritized.
///
/// Ties in frequency go to the language seen first. When English wins and
/// another language was predicted, the second most frequent language takes
/// over if any of its predictions has confidence above `secondary_confidence`.
/// Languages ranked third or lower are never considered.
pub fn dominant_language(predictions: &[Prediction], secondary_confidence: f32) -> Option<String> {
    let mut ranked: Vec<(&str, usize)> = Vec::new();
    for p in predictions {
        match ranked.iter_mut().find(|(lang, _)| *lang == p.language) {
            Some((_, count)) => *count += 1,
            None => ranked.push((p.language.as_str(), 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let (first, _) = *ranked.first()?;
    if first == ENGLISH {
        if let Some(&(second, _)) = ranked.get(1) {
            let confident = predictions
                .iter()
                .any(|p| p.language == second && p.confidence > secondary_confidence);
            if confident {
                return Some(second.to_string());
            }
        }
    }
    Some(first.to_string())
}

/// Local/tourist decision for a known set of local languages.
///
/// - local: local language, no tag names the country, no travel tag
/// - tourist: non-local language, or a travel tag
/// - unknown: local language but a tag names the country
pub fn locality(
    dominant_language: &str,
    tags: &[String],
    local_languages: &[String],
    name_variants: &[String],
    travel_tag: &str,
) -> LocalityClass {
    let is_local_language = local_languages.iter().any(|l| l == dominant_language);
    let names_country = tags.iter().any(|t| name_variants.contains(t));
    let has_travel = tags.iter().any(|t| t == travel_tag);

    if is_local_language && !names_country && !has_travel {
        LocalityClass::Local
    } else if !is_local_language || has_travel {
        LocalityClass::Tourist
    } else {
        LocalityClass::Unknown
    }
}
