//! Initialize the configuration directory: create ~/.replier and a default config.json.
//!
//! The default config is bundled from `crates/lib/config/config.json` and carries sample FAQ and news tables.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

static DEFAULT_CONFIG: &str = include_str!("../config/config.json");

/// Create the config directory and write the bundled default config if the file does not exist.
/// Returns the config directory. An existing config file is left untouched.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ResponderKind};

    #[test]
    fn bundled_config_parses() {
        let config: Config = serde_json::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config
            .responders
            .faq
            .iter()
            .any(|e| e.question == "你好" && e.answer == "您好！有什麼可以幫您？"));
        assert_eq!(config.responders.order.last(), Some(&ResponderKind::Generative));
        assert_eq!(config.gateway.bind, "0.0.0.0");
    }

    #[test]
    fn init_writes_once() {
        let dir = std::env::temp_dir().join(format!("replier-init-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");
        let out = init_config_dir(&path).unwrap();
        assert_eq!(out, dir);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        std::fs::write(&path, "{}").unwrap();
        init_config_dir(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
