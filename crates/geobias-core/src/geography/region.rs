//! Political region geometries and point binning.
//!
//! Regions are scanned in the order they were supplied; when polygons overlap
//! the first one containing the point wins. Points on a region boundary are not
//! contained by it.

use std::path::Path;

use geo::{Contains, MultiPolygon, Point};
use geojson::GeoJson;

use crate::error::PipelineError;

/// A named polygon (or multipolygon) region.
#[derive(Debug, Clone)]
pub struct Region {
    /// Region name, e.g. "Manhattan"
    pub name: String,
    /// Region shape in (lng, lat) coordinates
    pub shape: MultiPolygon<f64>,
}

/// The fixed set of regions for one dataset.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    /// Build a region set, preserving the given order.
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Load a GeoJSON `FeatureCollection` from disk.
    pub fn load(path: &Path, name_property: &str) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Geometry {
            message: format!("Failed to read {:?}: {}", path, e),
        })?;
        let set = Self::from_geojson_str(&content, name_property)?;
        tracing::info!("Loaded {} regions from {:?}", set.len(), path);
        Ok(set)
    }

    /// Parse a GeoJSON `FeatureCollection`.
    ///
    /// Each feature's name is read from `name_property`. Features with no name
    /// or with a non-polygonal geometry are skipped.
    pub fn from_geojson_str(content: &str, name_property: &str) -> Result<Self, PipelineError> {
        let geojson: GeoJson = content.parse().map_err(|e| PipelineError::Geometry {
            message: format!("Invalid GeoJSON: {e}"),
        })?;

        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(PipelineError::Geometry {
                message: "Expected a FeatureCollection".to_string(),
            });
        };

        let mut regions = Vec::with_capacity(collection.features.len());
        for (idx, feature) in collection.features.into_iter().enumerate() {
            let Some(name) = feature
                .property(name_property)
                .and_then(|v| v.as_str())
                .map(str::to_string)
            else {
                tracing::warn!("Feature #{idx} has no {name_property:?} property, skipping");
                continue;
            };
            let Some(geometry) = feature.geometry else {
                tracing::warn!("Region {name:?} has no geometry, skipping");
                continue;
            };

            let geometry: geo::Geometry<f64> =
                geometry.value.try_into().map_err(|e: geojson::Error| {
                    PipelineError::Geometry {
                        message: format!("Region {name:?}: {e}"),
                    }
                })?;

            let shape = match geometry {
                geo::Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
                geo::Geometry::MultiPolygon(multi) => multi,
                _ => {
                    tracing::warn!("Region {name:?} is not polygonal, skipping");
                    continue;
                }
            };
            regions.push(Region { name, shape });
        }

        Ok(Self { regions })
    }

    /// Name of the first region containing the point, if any.
    pub fn bin_point(&self, lng: f64, lat: f64) -> Option<&str> {
        bin_point(lng, lat, &self.regions)
    }

    /// Regions in scan order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the set has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Scan `regions` in order and return the name of the first one containing
/// the point `(lng, lat)`.
pub fn bin_point(lng: f64, lat: f64, regions: &[Region]) -> Option<&str> {
    let point = Point::new(lng, lat);
    regions
        .iter()
        .find(|region| region.shape.contains(&point))
        .map(|region| region.name.as_str())
}
