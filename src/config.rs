use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Runtime settings for a [`crate::MapReader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Root for geometry overrides, template dirs and relative image keys
    pub data_dir: PathBuf,
    /// Template directories, relative to `data_dir` unless absolute.
    /// Later directories override earlier ones on name collision.
    pub template_dirs: Vec<PathBuf>,
    pub reduced_edge: u32,
    pub contrast_factor: f32,
    pub circle_threshold: f64,
    pub diamond_threshold: f64,
    /// Bar for the shifted search over decision icons
    pub shift_threshold: f64,
    /// Upper bound on in-flight batch tasks
    pub concurrency: usize,
    pub original_capacity: usize,
    pub scaled_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            template_dirs: vec![PathBuf::from("iconsER")],
            reduced_edge: map_vision::REDUCED_EDGE,
            contrast_factor: map_vision::CONTRAST_FACTOR,
            circle_threshold: map_vision::CIRCLE_THRESHOLD,
            diamond_threshold: map_vision::DIAMOND_THRESHOLD,
            shift_threshold: map_vision::CIRCLE_THRESHOLD,
            concurrency: 8,
            original_capacity: 6,
            scaled_capacity: 6,
        }
    }
}

impl ReaderConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ReaderConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!("Loaded reader config from {}", path.display());
        Ok(config)
    }

    /// Template directories resolved against `data_dir`
    pub fn resolved_template_dirs(&self) -> Vec<PathBuf> {
        self.template_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    self.data_dir.join(dir)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ReaderConfig::load(Path::new("/nonexistent/reader.json")).unwrap();
        assert_eq!(config, ReaderConfig::default());
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.reduced_edge, 118);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.json");
        std::fs::write(
            &path,
            r#"{ "diamond_threshold": 0.8, "template_dirs": ["a", "/abs/b"] }"#,
        )
        .unwrap();

        let config = ReaderConfig::load(&path).unwrap();
        assert_eq!(config.diamond_threshold, 0.8);
        assert_eq!(config.circle_threshold, 0.85);
        assert_eq!(config.shift_threshold, 0.85);
        assert_eq!(
            config.resolved_template_dirs(),
            vec![PathBuf::from("data/a"), PathBuf::from("/abs/b")]
        );
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ReaderConfig::load(&path).is_err());
    }
}
