//! Reads config files. Format is picked by extension (RON/TOML/JSON).

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::resolve::ResolvedConfig;
use crate::schema::ConfigData;

/// Base name of the config file looked up by [`load_config_dir`].
pub const CONFIG_BASE_NAME: &str = "lunar";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value parsed but cannot be used.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Find `{base_name}.ron|toml|json` in `dir`. At most one may exist.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

pub fn parse_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, format, path)
}

/// Read and resolve a single config file.
pub fn load_config(path: &Path) -> Result<ResolvedConfig, DataLoadError> {
    let data: ConfigData = deserialize_file(path)?;
    let resolved = ResolvedConfig::resolve(&data)?;
    log::debug!("loaded config from {}", path.display());
    Ok(resolved)
}

/// Load `lunar.*` from `dir`, falling back to defaults when absent.
pub fn load_config_dir(dir: &Path) -> Result<ResolvedConfig, DataLoadError> {
    match find_data_file(dir, CONFIG_BASE_NAME)? {
        Some(path) => load_config(&path),
        None => {
            log::info!("no {CONFIG_BASE_NAME} config in {}, using defaults", dir.display());
            ResolvedConfig::resolve(&ConfigData::default())
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detect_formats() {
        assert_eq!(detect_format(Path::new("lunar.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("lunar.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("lunar.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("lunar.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("lunar")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn load_ron_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lunar.ron");
        fs::write(&path, "(wire_transfer_limit: 100, seal_check_interval: 5)").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.network.wire_transfer_limit, 100);
        assert_eq!(config.sealer.seal_check_interval, 5);
        assert_eq!(config.network.heavy_wire_transfer_limit, 480);
    }

    #[test]
    fn load_dir_picks_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lunar.toml"), "sealing_power = 300\n").unwrap();
        let config = load_config_dir(dir.path()).unwrap();
        assert_eq!(config.solver.max_blocks, 300);
    }

    #[test]
    fn load_dir_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_dir(dir.path()).unwrap();
        assert_eq!(config, ResolvedConfig::resolve(&ConfigData::default()).unwrap());
    }

    #[test]
    fn conflicting_formats_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lunar.ron"), "()").unwrap();
        fs::write(dir.path().join("lunar.json"), "{}").unwrap();
        assert!(matches!(
            load_config_dir(dir.path()),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
    }

    #[test]
    fn parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lunar.json");
        fs::write(&path, "{ not json").unwrap();
        match load_config(&path) {
            Err(DataLoadError::Parse { file, .. }) => assert_eq!(file, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(&dir.path().join("lunar.ron")),
            Err(DataLoadError::Io(_))
        ));
    }

    #[test]
    fn invalid_value_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lunar.json");
        fs::write(&path, r#"{ "seal_check_interval": 0 }"#).unwrap();
        assert!(matches!(
            load_config(&path),
            Err(DataLoadError::InvalidValue {
                field: "seal_check_interval",
                ..
            })
        ));
    }
}
