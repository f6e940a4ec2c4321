//! Geographic resolution: country strings to ISO3 codes, GPS points to regions.

pub mod country;
pub mod region;

pub use country::{CountryDatabase, CountryRecord};
pub use region::{bin_point, Region, RegionSet};
