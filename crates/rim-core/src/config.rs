use crate::lock::DEFAULT_LOCK_TTL_SECS;
use crate::validate::PathShape;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/rim/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RimConfig {
    /// Site/tenant that owns every imported mapping.
    pub site_id: i64,
    /// Override for the redirect database location (None = XDG state dir).
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Import lock lifetime in seconds; an older lock file is treated as
    /// released.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
    /// Path shape enforced on old_path/new_path: "strict" (default) or "loose".
    #[serde(default)]
    pub path_shape: PathShape,
}

fn default_lock_ttl_secs() -> u64 {
    DEFAULT_LOCK_TTL_SECS
}

impl Default for RimConfig {
    fn default() -> Self {
        Self {
            site_id: 1,
            database_path: None,
            lock_ttl_secs: DEFAULT_LOCK_TTL_SECS,
            path_shape: PathShape::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rim")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RimConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RimConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RimConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = RimConfig::default();
        assert_eq!(cfg.site_id, 1);
        assert!(cfg.database_path.is_none());
        assert_eq!(cfg.lock_ttl_secs, 600);
        assert_eq!(cfg.path_shape, PathShape::Strict);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = RimConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RimConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.site_id, cfg.site_id);
        assert_eq!(parsed.lock_ttl_secs, cfg.lock_ttl_secs);
        assert_eq!(parsed.path_shape, cfg.path_shape);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            site_id = 7
            database_path = "/var/lib/rim/redirects.db"
            lock_ttl_secs = 120
            path_shape = "loose"
        "#;
        let cfg: RimConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.site_id, 7);
        assert_eq!(
            cfg.database_path.as_deref(),
            Some(std::path::Path::new("/var/lib/rim/redirects.db"))
        );
        assert_eq!(cfg.lock_ttl_secs, 120);
        assert_eq!(cfg.path_shape, PathShape::Loose);
    }

    #[test]
    fn config_toml_defaults_for_missing_keys() {
        let cfg: RimConfig = toml::from_str("site_id = 3\n").unwrap();
        assert_eq!(cfg.site_id, 3);
        assert_eq!(cfg.lock_ttl_secs, 600);
        assert_eq!(cfg.path_shape, PathShape::Strict);
    }
}
