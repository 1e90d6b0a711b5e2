#![allow(dead_code)]

use bigmac_engine::config::settings::EngineSettings;
use bigmac_engine::core::artifact::{MANIFEST_ENTRY, MODEL_ENTRY, PREPROCESSOR_ENTRY};
use bigmac_engine::core::encoder::VocabularyPolicy;
use bigmac_engine::core::ArtifactLoader;
use bigmac_engine::{Analytics, BundleLoader, LocalStorage};
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

/// Training order of the one-hot block, deliberately unsorted.
pub const COUNTRIES: [(&str, f64); 10] = [
    ("United States", 2.0),
    ("Brazil", 0.5),
    ("Switzerland", 4.0),
    ("Japan", -0.5),
    ("India", -1.25),
    ("Denmark", 1.5),
    ("Sweden", 1.5),
    ("Euro area", 1.0),
    ("China", -0.75),
    ("Argentina", 0.25),
];

// All parameters are exact binary fractions so prices compare exactly.
pub const YEAR_COEF: f64 = 0.125;
pub const MONTH_COEF: f64 = 0.0625;
pub const INTERCEPT: f64 = -247.0;

pub fn expected_price(country: &str, year: i32, month: u32) -> f64 {
    let level = COUNTRIES
        .iter()
        .find(|(c, _)| *c == country)
        .map(|(_, l)| *l)
        .unwrap();
    level + YEAR_COEF * f64::from(year) + MONTH_COEF * f64::from(month) + INTERCEPT
}

pub fn model_json() -> serde_json::Value {
    let mut coefficients: Vec<f64> = COUNTRIES.iter().map(|(_, l)| *l).collect();
    coefficients.push(YEAR_COEF);
    coefficients.push(MONTH_COEF);
    serde_json::json!({
        "kind": "linear",
        "coefficients": coefficients,
        "intercept": INTERCEPT
    })
}

pub fn preprocessor_json(vocabulary_name: &str) -> serde_json::Value {
    let categories: Vec<&str> = COUNTRIES.iter().map(|(c, _)| *c).collect();
    serde_json::json!({
        "transformers": [
            {"kind": "one_hot", "name": vocabulary_name, "column": "name", "categories": categories},
            {"kind": "passthrough", "name": "num", "columns": ["year", "month"]}
        ]
    })
}

pub fn artifact_json(format_version: u32) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "format_version": format_version,
        "model": model_json(),
        "preprocessor": preprocessor_json("cat")
    }))
    .unwrap()
}

pub fn artifact_zip(format_version: u32) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let entries = [
        (
            MANIFEST_ENTRY,
            serde_json::json!({"format_version": format_version}),
        ),
        (MODEL_ENTRY, model_json()),
        (PREPROCESSOR_ENTRY, preprocessor_json("cat")),
    ];
    for (name, value) in entries {
        zip.start_file::<_, ()>(name, FileOptions::default()).unwrap();
        zip.write_all(&serde_json::to_vec(&value).unwrap()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn write_artifact(dir: &TempDir, name: &str, bytes: &[u8]) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path.to_str().unwrap().to_string()
}

pub fn local_loader(location: &str) -> BundleLoader<LocalStorage> {
    BundleLoader::new(
        LocalStorage::default(),
        location,
        "cat",
        VocabularyPolicy::default(),
    )
}

/// Analytics over the fixture artifact, loaded from a temp file.
pub fn fixture_analytics() -> Analytics {
    let dir = TempDir::new().unwrap();
    let location = write_artifact(&dir, "bigmac_model.json", &artifact_json(1));
    let artifact = tokio_test::block_on(local_loader(&location).load()).unwrap();
    Analytics::new(Arc::new(artifact), EngineSettings::default())
}
