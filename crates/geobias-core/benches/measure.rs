//! Benchmarks for the per-sample hot paths of a measurement run.
//!
//! Run with: cargo bench -p geobias-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geobias_core::language::{dominant_language, LanguageDetector, Prediction, ScriptDetector};
use geobias_core::RegionSet;

/// A 10x10 grid of unit-square regions as a GeoJSON FeatureCollection.
fn grid_geojson() -> String {
    let mut features = Vec::new();
    for x in 0..10 {
        for y in 0..10 {
            let (x0, y0, x1, y1) = (x as f64, y as f64, (x + 1) as f64, (y + 1) as f64);
            features.push(format!(
                r#"{{"type":"Feature","properties":{{"name_1":"cell_{x}_{y}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}"#
            ));
        }
    }
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

fn benchmark_bin_point(c: &mut Criterion) {
    let regions = match RegionSet::from_geojson_str(&grid_geojson(), "name_1") {
        Ok(regions) => regions,
        Err(e) => {
            eprintln!("Skipping bin_point benchmark: {e}");
            return;
        }
    };

    c.bench_function("bin_point_last_cell", |b| {
        b.iter(|| regions.bin_point(black_box(9.5), black_box(9.5)))
    });
    c.bench_function("bin_point_outside", |b| {
        b.iter(|| regions.bin_point(black_box(-5.0), black_box(-5.0)))
    });
}

fn benchmark_detect(c: &mut Criterion) {
    let detector = ScriptDetector;
    let tags = ["beach", "plage", "Straßenbahn", "서울역", "東京タワー", "praia"];

    c.bench_function("script_detect_tags", |b| {
        b.iter(|| {
            for tag in tags {
                black_box(detector.detect(black_box(tag)));
            }
        })
    });
}

fn benchmark_dominant_language(c: &mut Criterion) {
    let predictions: Vec<Prediction> = ["en", "en", "fr", "de", "en", "fr", "es", "en"]
        .iter()
        .zip([0.9, 0.8, 0.7, 0.3, 0.95, 0.6, 0.2, 0.9])
        .map(|(lang, conf)| Prediction::new(*lang, conf))
        .collect();

    c.bench_function("dominant_language", |b| {
        b.iter(|| dominant_language(black_box(&predictions), 0.5))
    });
}

criterion_group!(
    benches,
    benchmark_bin_point,
    benchmark_detect,
    benchmark_dominant_language,
);
criterion_main!(benches);
