//! Tests for loading analysis configuration files from disk.

use std::fs;
use std::path::Path;

use hep_region::config::{AnalysisConfig, VariationConfig};
use hep_region::sweep::Sweep;
use hep_region::{Error, Expression};

const MAIN: &str = r#"
[[variation]]
name = "sf_up"
kind = "weight_scaled"
factor = "sf_up"

[[variation]]
name = "tight"
kind = "selection_tightened"
cut = "met > 50"

[[region]]
name = "signal"
weight = "w"
selection = "n_jets >= 2"
label = "Signal"
blinded = true
"#;

const UNNAMED_REGION: &str = r#"
[[region]]
label = "no name"
"#;

const LOCAL: &str = r#"
[[variation]]
name = "alt_gen"
kind = "weight_replaced"
weight = "alt_weight"
"#;

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let loaded = AnalysisConfig::load(path).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn missing_main_file_ignores_local_override() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "analysis.local.toml", MAIN);
    let path = dir.path().join("analysis.toml");
    let loaded = AnalysisConfig::load(path).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn loads_without_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "analysis.toml", MAIN);
    let config = AnalysisConfig::load(&path).unwrap().unwrap();
    assert_eq!(config.variations.len(), 2);
    assert_eq!(config.regions.len(), 1);
    assert_eq!(config.regions[0].name, "signal");
}

#[test]
fn local_override_replaces_top_level_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "analysis.toml", MAIN);
    write(dir.path(), "analysis.local.toml", LOCAL);

    let config = AnalysisConfig::load(&path).unwrap().unwrap();

    // `variation` was replaced wholesale, `region` kept from the main file
    assert_eq!(config.variations.len(), 1);
    assert_eq!(
        config.variations[0],
        VariationConfig::WeightReplaced {
            name: "alt_gen".into(),
            weight: Expression::new("alt_weight"),
        }
    );
    assert_eq!(config.regions.len(), 1);
}

#[test]
fn invalid_toml_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "broken.toml", "[[region]\nname = ");
    match AnalysisConfig::load(&file).unwrap_err() {
        Error::Toml { path, .. } => assert_eq!(path, file),
        other => panic!("expected a TOML error, got {other}"),
    }
}

#[test]
fn schema_mismatch_is_toml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "analysis.toml", UNNAMED_REGION);
    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Toml { .. }), "{err}");
}

#[test]
fn loaded_config_drives_a_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "analysis.toml", MAIN);
    let config = AnalysisConfig::load(&path).unwrap().unwrap();
    let analysis = config.build().unwrap();

    let entries = Sweep::of_analysis(&analysis).evaluate().unwrap();
    let expressions: Vec<_> = entries.iter().map(|e| e.expression.as_str()).collect();
    assert_eq!(
        expressions,
        [
            "((w) * (n_jets >= 2))",
            "((((w) * (sf_up))) * (n_jets >= 2))",
            "((w) * (((n_jets >= 2) && (met > 50))))",
        ]
    );
    assert!(entries.iter().all(|e| e.blinded));
}
