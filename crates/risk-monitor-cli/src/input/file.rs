use risk_monitor_core::ScoringConfig;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Load and validate the scoring configuration.
///
/// `.yaml`/`.yml` files are read as YAML, anything else as JSON. Without a
/// path the built-in defaults are used.
pub fn load_config(path: Option<&str>) -> Result<ScoringConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ScoringConfig::default());
    };
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let config: ScoringConfig = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    config.validate()?;

    debug!(path = %canonical.display(), "configuration loaded");
    Ok(config)
}

/// Resolve a relative path against the working directory and require it to
/// name an existing regular file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), ScoringConfig::default());
    }

    #[test]
    fn test_partial_yaml_config_is_merged_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "scoring.yaml",
            "tiers:\n  medium: \"25\"\nwindow_days: 30\n",
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.tiers.medium, Decimal::from(25));
        assert_eq!(config.tiers.high, Decimal::from(60));
        assert_eq!(config.window_days, 30);
    }

    #[test]
    fn test_json_config_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "scoring.json",
            r#"{"combiner": {"credit": "0.5", "aml": "0.5"}}"#,
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.combiner.credit, Decimal::new(5, 1));
        assert_eq!(config.combiner.aml, Decimal::new(5, 1));
    }

    #[test]
    fn test_invalid_weights_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "scoring.yml",
            "combiner:\n  credit: \"0.9\"\n  aml: \"0.9\"\n",
        );
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("combiner"), "{err}");
    }

    #[test]
    fn test_unparseable_and_missing_files_are_errors() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "scoring.json", "{not json");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"), "{err}");

        let missing = dir.path().join("absent.yaml");
        let err = load_config(Some(&missing.to_string_lossy())).unwrap_err();
        assert!(err.to_string().starts_with("File not found"), "{err}");
    }
}
