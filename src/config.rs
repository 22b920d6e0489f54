use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub limits: Limits,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    /// Missing config file is not an error, everything has a default.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Database {
    #[serde(default)]
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

/// Upload size limits, in megabytes
#[derive(Debug, Deserialize)]
pub struct Limits {
    #[serde(default = "default_audio_mb")]
    pub audio_mb: u64,
    #[serde(default = "default_image_mb")]
    pub image_mb: u64,
}

fn default_audio_mb() -> u64 {
    10
}

fn default_image_mb() -> u64 {
    1
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            audio_mb: default_audio_mb(),
            image_mb: default_image_mb(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
[database]
in_memory = false
path = "/tmp/tracklocker.db"

[limits]
audio_mb = 20
image_mb = 2
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert!(!cfg.database.in_memory);
        assert_eq!(
            cfg.database.path,
            Some(PathBuf::from("/tmp/tracklocker.db"))
        );
        assert_eq!(cfg.limits.audio_mb, 20);
        assert_eq!(cfg.limits.image_mb, 2);

        Ok(())
    }

    #[test]
    fn test_empty_config_uses_defaults() -> anyhow::Result<()> {
        let cfg: Config = toml::from_str("")?;

        assert!(!cfg.database.in_memory);
        assert_eq!(cfg.database.path, None);
        assert_eq!(cfg.limits.audio_mb, 10);
        assert_eq!(cfg.limits.image_mb, 1);

        Ok(())
    }

    #[test]
    fn test_partial_limits_keep_other_default() -> anyhow::Result<()> {
        let toml_str = r#"
[limits]
audio_mb = 50
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.limits.audio_mb, 50);
        assert_eq!(cfg.limits.image_mb, 1);

        Ok(())
    }
}
