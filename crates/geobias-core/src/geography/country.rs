//! Country-name normalization and country metadata lookups.
//!
//! Raw country strings come from the dataset in URL-ish form (`South+Korea`,
//! `C%C3%B4te+d%C2%B4Ivoire`). They are resolved to ISO3 codes by fuzzy search
//! over the country table first, then through a fixed override table for names
//! the table does not know.

use std::collections::HashMap;
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize};

use crate::error::PipelineError;

/// Raw strings that fuzzy search misses, keyed exactly as the dataset spells them.
const ISO3_OVERRIDES: &[(&str, &str)] = &[
    ("South+Korea", "KOR"),
    ("North+Korea", "PRK"),
    ("Laos", "LAO"),
    ("Caribbean+Netherlands", "BES"),
    ("St.+Lucia", "LCA"),
    ("East+Timor", "TLS"),
    ("Democratic+Republic+of+Congo", "COD"),
    ("Swaziland", "SWZ"),
    ("Cape+Verde", "CPV"),
    ("C%C3%B4te+d%C2%B4Ivoire", "CIV"),
    ("Ivory+Coast", "CIV"),
    ("Channel+Islands", "GBR"),
];

const COUNTRIES_FILE: &str = "countries.json";
const SUBREGIONS_FILE: &str = "iso3_to_subregion.json";
const LANGUAGES_FILE: &str = "iso3_to_lang.json";

/// One row of the country table.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    /// ISO 3166-1 alpha-3 code
    pub alpha3: String,
    /// Short English name ("France")
    pub name: String,
    /// Official name ("French Republic")
    #[serde(default)]
    pub official_name: Option<String>,
    /// Common name, when it differs from `name`
    #[serde(default)]
    pub common_name: Option<String>,
    /// Names in the country's own languages
    #[serde(default)]
    pub native_names: Vec<String>,
}

impl CountryRecord {
    fn searchable_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.official_name.as_deref())
            .chain(self.common_name.as_deref())
    }
}

/// Country table plus the ISO3-keyed subregion and language tables.
#[derive(Debug, Default)]
pub struct CountryDatabase {
    countries: Vec<CountryRecord>,
    subregions: HashMap<String, String>,
    languages: HashMap<String, Vec<String>>,
}

impl CountryDatabase {
    /// Build a database from in-memory tables.
    pub fn new(
        countries: Vec<CountryRecord>,
        subregions: HashMap<String, String>,
        languages: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            countries,
            subregions,
            languages,
        }
    }

    /// Load the lookup tables from `lookup_dir`.
    ///
    /// A missing file leaves its table empty, so every lookup against it misses
    /// and callers fall back to their sentinel values.
    pub fn load(lookup_dir: &Path) -> Result<Self, PipelineError> {
        let countries: Vec<CountryRecord> = read_table(&lookup_dir.join(COUNTRIES_FILE))?;
        let subregions: HashMap<String, String> = read_table(&lookup_dir.join(SUBREGIONS_FILE))?;
        let languages: HashMap<String, Vec<String>> =
            read_table(&lookup_dir.join(LANGUAGES_FILE))?;

        tracing::info!(
            "Loaded country tables: {} countries, {} subregions, {} language sets",
            countries.len(),
            subregions.len(),
            languages.len(),
        );

        Ok(Self::new(countries, subregions, languages))
    }

    /// Fuzzy-search the country table.
    ///
    /// `+` is read as a space and matching is case-insensitive. An exact match
    /// on any name wins; otherwise the first country (in table order) with a
    /// name containing the query is returned.
    pub fn search_fuzzy(&self, query: &str) -> Option<&CountryRecord> {
        let needle = normalize(query);
        if needle.is_empty() {
            return None;
        }

        self.countries
            .iter()
            .find(|c| {
                c.alpha3.eq_ignore_ascii_case(&needle)
                    || c.searchable_names().any(|n| normalize(n) == needle)
            })
            .or_else(|| {
                self.countries
                    .iter()
                    .find(|c| c.searchable_names().any(|n| normalize(n).contains(&needle)))
            })
    }

    /// Resolve a raw country string to an ISO3 code.
    ///
    /// Never fails: `None` means neither fuzzy search nor the override table
    /// recognised the string.
    pub fn country_to_iso3(&self, country: &str) -> Option<String> {
        if let Some(record) = self.search_fuzzy(country) {
            return Some(record.alpha3.clone());
        }
        ISO3_OVERRIDES
            .iter()
            .find(|(raw, _)| *raw == country)
            .map(|(_, iso3)| iso3.to_string())
    }

    /// Subregion ("Western Europe") for an ISO3 code.
    pub fn subregion(&self, iso3: &str) -> Option<&str> {
        self.subregions.get(iso3).map(String::as_str)
    }

    /// Distinct subregions named in the subregion table, sorted.
    pub fn subregions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.subregions.values().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Locally spoken language codes for an ISO3 code.
    pub fn local_languages(&self, iso3: &str) -> Option<&[String]> {
        self.languages.get(iso3).map(Vec::as_slice)
    }

    /// Every way a tag might name this country.
    ///
    /// The pieces of the raw string split on `separator`, followed by the
    /// table's name, official, common and native names when the country is known.
    pub fn name_variants(&self, country: &str, separator: char) -> Vec<String> {
        let mut variants: Vec<String> = country
            .split(separator)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if let Some(record) = self.search_fuzzy(country) {
            variants.extend(record.searchable_names().map(str::to_string));
            variants.extend(record.native_names.iter().cloned());
        }
        variants
    }
}

fn normalize(name: &str) -> String {
    name.replace('+', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn read_table<T: DeserializeOwned + Default>(path: &Path) -> Result<T, PipelineError> {
    if !path.exists() {
        tracing::warn!("Lookup table {:?} not found, using an empty table", path);
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Lookup {
        path: path.to_path_buf(),
        message: format!("Failed to read: {e}"),
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::Lookup {
        path: path.to_path_buf(),
        message: format!("Failed to parse: {e}"),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn record(alpha3: &str, name: &str, official: Option<&str>, native: &[&str]) -> CountryRecord {
        CountryRecord {
            alpha3: alpha3.to_string(),
            name: name.to_string(),
            official_name: official.map(str::to_string),
            common_name: None,
            native_names: native.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Small country table shared by tests across the crate.
    pub(crate) fn sample_database() -> CountryDatabase {
        let countries = vec![
            record("FRA", "France", Some("French Republic"), &["France"]),
            record("DEU", "Germany", Some("Federal Republic of Germany"), &["Deutschland"]),
            record("KOR", "Korea, Republic of", None, &["대한민국"]),
            record("CIV", "Côte d'Ivoire", Some("Republic of Côte d'Ivoire"), &[]),
            record("USA", "United States", Some("United States of America"), &[]),
            record("JPN", "Japan", None, &["日本"]),
        ];
        let subregions = [
            ("FRA", "Western Europe"),
            ("DEU", "Western Europe"),
            ("KOR", "Eastern Asia"),
            ("JPN", "Eastern Asia"),
            ("USA", "Northern America"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let languages = [
            ("FRA", vec!["fr"]),
            ("DEU", vec!["de"]),
            ("KOR", vec!["ko"]),
            ("JPN", vec!["ja"]),
            ("USA", vec!["en", "es"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(str::to_string).collect()))
        .collect();
        CountryDatabase::new(countries, subregions, languages)
    }

    #[test]
    fn test_exact_name_match() {
        let db = sample_database();
        assert_eq!(db.country_to_iso3("France").as_deref(), Some("FRA"));
        assert_eq!(db.country_to_iso3("united+states").as_deref(), Some("USA"));
    }

    #[test]
    fn test_substring_match() {
        let db = sample_database();
        assert_eq!(db.country_to_iso3("Korea").as_deref(), Some("KOR"));
        assert_eq!(db.country_to_iso3("Federal+Republic").as_deref(), Some("DEU"));
    }

    #[test]
    fn test_override_table_when_fuzzy_search_fails() {
        let db = sample_database();
        assert_eq!(db.country_to_iso3("Ivory+Coast").as_deref(), Some("CIV"));
        assert_eq!(
            db.country_to_iso3("C%C3%B4te+d%C2%B4Ivoire").as_deref(),
            Some("CIV")
        );
        assert_eq!(db.country_to_iso3("South+Korea").as_deref(), Some("KOR"));
        assert_eq!(db.country_to_iso3("Channel+Islands").as_deref(), Some("GBR"));
    }

    #[test]
    fn test_overrides_with_empty_table() {
        let db = CountryDatabase::default();
        assert_eq!(db.country_to_iso3("Laos").as_deref(), Some("LAO"));
        assert_eq!(db.country_to_iso3("Cape+Verde").as_deref(), Some("CPV"));
        assert_eq!(db.country_to_iso3("France"), None);
    }

    #[test]
    fn test_unknown_country_is_none() {
        let db = sample_database();
        assert_eq!(db.country_to_iso3("Atlantis"), None);
        assert_eq!(db.country_to_iso3(""), None);
    }

    #[test]
    fn test_name_variants_include_whole_names() {
        let db = sample_database();
        let variants = db.name_variants("France", '+');
        assert!(variants.contains(&"France".to_string()));
        assert!(variants.contains(&"French Republic".to_string()));

        let variants = db.name_variants("Germany", '+');
        assert!(variants.contains(&"Deutschland".to_string()));
    }

    #[test]
    fn test_name_variants_split_raw_string() {
        let db = sample_database();
        let variants = db.name_variants("South+Korea", '+');
        assert_eq!(&variants[..2], &["South".to_string(), "Korea".to_string()]);
    }

    #[test]
    fn test_subregions_sorted_and_distinct() {
        let db = sample_database();
        assert_eq!(
            db.subregions(),
            vec!["Eastern Asia", "Northern America", "Western Europe"]
        );
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(COUNTRIES_FILE),
            r#"[{"alpha3": "FRA", "name": "France", "native_names": ["France"]}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(LANGUAGES_FILE), r#"{"FRA": ["fr"]}"#).unwrap();

        let db = CountryDatabase::load(dir.path()).unwrap();
        assert_eq!(db.country_to_iso3("France").as_deref(), Some("FRA"));
        assert_eq!(db.local_languages("FRA"), Some(&["fr".to_string()][..]));
        assert_eq!(db.subregion("FRA"), None);
    }

    #[test]
    fn test_load_rejects_malformed_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SUBREGIONS_FILE), "not json").unwrap();
        let err = CountryDatabase::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(SUBREGIONS_FILE));
    }
}
