//! Reverb configuration files
//!
//! [`read_config`] is strict and reports why a file could not be used.
//! [`load_config`] never fails: a missing file gives the defaults, and an
//! unreadable or malformed one gives the defaults plus a warning.

use std::path::Path;

use anyhow::{Context, Result};

use super::ReverbConfig;
use crate::error::ConfigError;

/// Parse a reverb configuration from YAML
///
/// Only the file format is checked here; call [`ReverbConfig::validate`]
/// once the sample rate is final.
pub fn read_config(path: &Path) -> Result<ReverbConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: ReverbConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    log::info!(
        "read_config: {:?}: {} Hz, block {}, {} side, {} overrides",
        path,
        config.sample_rate,
        config.block_size,
        config.side.name(),
        config.parameters.len()
    );
    Ok(config)
}

/// Load a reverb configuration, falling back to the defaults
pub fn load_config(path: &Path) -> ReverbConfig {
    if !path.exists() {
        log::info!("load_config: {:?} doesn't exist, using defaults", path);
        return ReverbConfig::default();
    }
    read_config(path).unwrap_or_else(|e| {
        log::warn!("load_config: {}, using defaults", e);
        ReverbConfig::default()
    })
}

/// Write a reverb configuration as YAML, creating parent directories
///
/// Invalid configurations are refused so a saved file always loads cleanly.
pub fn save_config(config: &ReverbConfig, path: &Path) -> Result<()> {
    config.validate().context("Refusing to save an invalid reverb config")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize reverb config")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write {:?}", path))?;

    log::debug!("save_config: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelSide;

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = Path::new("/nonexistent/path/hall.yaml");
        assert_eq!(load_config(path), ReverbConfig::default());
        assert!(matches!(read_config(path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "block_size: [not, a, number]").unwrap();

        match read_config(&path) {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert_eq!(load_config(&path), ReverbConfig::default());
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets").join("hall.yaml");

        let mut config = ReverbConfig {
            block_size: 32,
            side: ChannelSide::Right,
            phase_seed: 7,
            ..Default::default()
        };
        config.parameters.insert("line_decay".to_string(), 0.75);
        config.parameters.insert("main_out".to_string(), 0.5);

        save_config(&config, &path).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test]
    fn test_save_refuses_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");

        let mut config = ReverbConfig::default();
        config.parameters.insert("line_decay".to_string(), 3.0);

        assert!(save_config(&config, &path).is_err());
        assert!(!path.exists());
    }
}
