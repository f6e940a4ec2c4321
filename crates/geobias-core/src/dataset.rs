//! Dataset collaborators that feed samples to the measurement modes.
//!
//! A [`Dataset`] can be iterated more than once; the GPS tagging mode relies on
//! this when it has to build region membership before tallying tags.
//!
//! On disk, a [`ManifestDataset`] is a directory with:
//!
//! ```text
//! categories.txt       one category label per line
//! samples.jsonl        {"id", "country"?, "gps"?: {"lat","lng"}, "annotations": [{"label"}], "image"?}
//! boundaries.geojson   optional FeatureCollection of named regions
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::Deserialize;

use crate::aggregate::Categories;
use crate::error::PipelineError;
use crate::geography::RegionSet;
use crate::types::{Annotation, GpsCoord, Sample};

const CATEGORIES_FILE: &str = "categories.txt";
const SAMPLES_FILE: &str = "samples.jsonl";
const BOUNDARIES_FILE: &str = "boundaries.geojson";

/// Boxed iterator of samples borrowed from a dataset.
pub type SampleIter<'a> = Box<dyn Iterator<Item = Result<Sample, PipelineError>> + 'a>;

/// A source of samples plus the dataset-level metadata the modes need.
pub trait Dataset {
    /// Region geometries, when the dataset carries GPS boundaries.
    fn geo_boundaries(&self) -> Option<&RegionSet>;

    /// The category vocabulary tags are indexed by.
    fn categories(&self) -> &Categories;

    /// Whether samples carry a country string.
    fn with_country(&self) -> bool;

    /// Iterate samples in dataset order.
    fn samples(&self) -> SampleIter<'_>;

    /// Number of samples, if known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// A manifest line in `samples.jsonl`.
#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    id: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    gps: Option<GpsCoord>,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    image: Option<PathBuf>,
}

/// Dataset read from a manifest directory.
pub struct ManifestDataset {
    root: PathBuf,
    entries: Vec<ManifestEntry>,
    categories: Categories,
    boundaries: Option<RegionSet>,
    load_images: bool,
}

impl ManifestDataset {
    /// Open a manifest directory.
    ///
    /// `boundaries.geojson` is optional; region names are read from `region_name_property`.
    pub fn open(root: &Path, region_name_property: &str) -> Result<Self, PipelineError> {
        let categories = Categories::load(&root.join(CATEGORIES_FILE))?;
        let entries = read_manifest(&root.join(SAMPLES_FILE))?;

        let boundaries_path = root.join(BOUNDARIES_FILE);
        let boundaries = if boundaries_path.exists() {
            Some(RegionSet::load(&boundaries_path, region_name_property)?)
        } else {
            None
        };

        tracing::info!(
            "Opened dataset {:?}: {} samples, {} categories, boundaries: {}",
            root,
            entries.len(),
            categories.len(),
            boundaries.is_some(),
        );

        Ok(Self {
            root: root.to_path_buf(),
            entries,
            categories,
            boundaries,
            load_images: true,
        })
    }

    /// Whether images are decoded while iterating.
    ///
    /// Count modes never look at the image, so they can skip decoding.
    pub fn with_images(mut self, load_images: bool) -> Self {
        self.load_images = load_images;
        self
    }

    fn decode(&self, entry: &ManifestEntry) -> Option<DynamicImage> {
        let rel = entry.image.as_ref()?;
        let path = self.root.join(rel);
        match image::open(&path) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!("Sample {}: cannot decode {:?}: {}", entry.id, path, e);
                None
            }
        }
    }
}

impl Dataset for ManifestDataset {
    fn geo_boundaries(&self) -> Option<&RegionSet> {
        self.boundaries.as_ref()
    }

    fn categories(&self) -> &Categories {
        &self.categories
    }

    fn with_country(&self) -> bool {
        self.entries.iter().any(|e| e.country.is_some())
    }

    fn samples(&self) -> SampleIter<'_> {
        Box::new(self.entries.iter().map(move |entry| {
            let raw_input = if self.load_images {
                self.decode(entry)
            } else {
                None
            };
            Ok(Sample {
                id: entry.id.clone(),
                country: entry.country.clone(),
                gps: entry.gps,
                annotations: entry.annotations.clone(),
                raw_input,
            })
        }))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Dataset {
        message: format!("Failed to open {:?}: {}", path, e),
    })?;

    let mut entries = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| PipelineError::Dataset {
            message: format!("Failed to read {:?}: {}", path, e),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ManifestEntry =
            serde_json::from_str(&line).map_err(|e| PipelineError::Dataset {
                message: format!("{:?} line {}: {}", path, line_no + 1, e),
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Dataset held entirely in memory.
pub struct MemoryDataset {
    samples: Vec<Sample>,
    categories: Categories,
    boundaries: Option<RegionSet>,
}

impl MemoryDataset {
    /// Create a dataset from samples and a category vocabulary.
    pub fn new(samples: Vec<Sample>, categories: Categories) -> Self {
        Self {
            samples,
            categories,
            boundaries: None,
        }
    }

    /// Attach region geometries.
    pub fn with_boundaries(mut self, boundaries: RegionSet) -> Self {
        self.boundaries = Some(boundaries);
        self
    }
}

impl Dataset for MemoryDataset {
    fn geo_boundaries(&self) -> Option<&RegionSet> {
        self.boundaries.as_ref()
    }

    fn categories(&self) -> &Categories {
        &self.categories
    }

    fn with_country(&self) -> bool {
        self.samples.iter().any(|s| s.country.is_some())
    }

    fn samples(&self) -> SampleIter<'_> {
        Box::new(self.samples.iter().cloned().map(Ok))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_dataset(dir: &Path, samples: &str) {
        std::fs::write(dir.join(CATEGORIES_FILE), "beach\ndog\n").unwrap();
        std::fs::write(dir.join(SAMPLES_FILE), samples).unwrap();
    }

    #[test]
    fn test_open_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            concat!(
                r#"{"id": "a", "country": "France", "annotations": [{"label": "beach"}]}"#,
                "\n\n",
                r#"{"id": "b", "gps": {"lat": 1.5, "lng": 2.5}}"#,
                "\n",
            ),
        );

        let ds = ManifestDataset::open(dir.path(), "name_1").unwrap();
        assert!(ds.geo_boundaries().is_none());
        assert!(ds.with_country());
        assert_eq!(ds.len_hint(), Some(2));
        assert_eq!(ds.categories().len(), 2);

        let samples: Vec<Sample> = ds.samples().collect::<Result<_, _>>().unwrap();
        assert_eq!(samples[0].country.as_deref(), Some("France"));
        assert_eq!(samples[0].annotations, vec![Annotation::new("beach")]);
        assert_eq!(samples[1].gps, Some(GpsCoord { lat: 1.5, lng: 2.5 }));
        assert!(samples[1].raw_input.is_none());
    }

    #[test]
    fn test_manifest_decodes_images() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        write_dataset(
            dir.path(),
            concat!(
                r#"{"id": "a", "image": "a.png"}"#,
                "\n",
                r#"{"id": "b", "image": "missing.png"}"#,
                "\n",
            ),
        );

        let ds = ManifestDataset::open(dir.path(), "name_1").unwrap();
        let samples: Vec<Sample> = ds.samples().collect::<Result<_, _>>().unwrap();
        assert!(samples[0].raw_input.is_some());
        assert!(samples[1].raw_input.is_none());

        let ds = ds.with_images(false);
        let samples: Vec<Sample> = ds.samples().collect::<Result<_, _>>().unwrap();
        assert!(samples[0].raw_input.is_none());
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "{\"id\": \"a\"}\n{oops}\n");
        let err = ManifestDataset::open(dir.path(), "name_1").err().unwrap();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_boundaries_loaded_when_present() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "");
        std::fs::write(
            dir.path().join(BOUNDARIES_FILE),
            r#"{"type": "FeatureCollection", "features": [{"type": "Feature",
                "properties": {"borough": "Bronx"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}]}"#,
        )
        .unwrap();

        let ds = ManifestDataset::open(dir.path(), "borough").unwrap();
        let regions = ds.geo_boundaries().unwrap();
        assert_eq!(regions.bin_point(0.5, 0.5), Some("Bronx"));
        assert!(!ds.with_country());
    }
}
