use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::store::StoreOptions;

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub ui: UiConfig,
    pub storage: StorageConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
}

/// Relative paths are resolved against the working root.
#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub data_file: PathBuf,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig {
                color: true,
                max_table_rows: 50,
            },
            storage: StorageConfig {
                data_file: PathBuf::from("data/reports.json"),
                export_dir: PathBuf::from("reports"),
                log_dir: PathBuf::from("logs"),
            },
            config_path: None,
        }
    }
}

impl StorageConfig {
    pub fn store_options(&self, root: &Path) -> StoreOptions {
        StoreOptions {
            data_file: root.join(&self.data_file),
            export_dir: root.join(&self.export_dir),
        }
    }

    pub fn log_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.log_dir)
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ui: Option<RawUiConfig>,
    storage: Option<RawStorageConfig>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
    max_table_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawStorageConfig {
    data_file: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/faultdesk/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: Option<&Path>) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .or_else(|| home_dir.map(default_config_path));

    if let Some(path) = path.filter(|p| p.exists()) {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s).context("failed to parse config file (TOML)")?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
        if let Some(max_table_rows) = ui.max_table_rows {
            cfg.ui.max_table_rows = max_table_rows;
        }
    }

    if let Some(storage) = raw.storage {
        if let Some(data_file) = storage.data_file {
            cfg.storage.data_file = data_file;
        }
        if let Some(export_dir) = storage.export_dir {
            cfg.storage.export_dir = export_dir;
        }
        if let Some(log_dir) = storage.log_dir {
            cfg.storage.log_dir = log_dir;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("FAULTDESK_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "FAULTDESK_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("FAULTDESK_UI_MAX_TABLE_ROWS") {
        cfg.ui.max_table_rows = v
            .trim()
            .parse::<usize>()
            .with_context(|| "FAULTDESK_UI_MAX_TABLE_ROWS")?;
    }
    for (key, slot) in [
        ("FAULTDESK_DATA_FILE", &mut cfg.storage.data_file),
        ("FAULTDESK_EXPORT_DIR", &mut cfg.storage.export_dir),
        ("FAULTDESK_LOG_DIR", &mut cfg.storage.log_dir),
    ] {
        if let Ok(v) = std::env::var(key) {
            let v = v.trim();
            if !v.is_empty() {
                *slot = PathBuf::from(v);
            }
        }
    }

    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (use true|false|1|0|yes|no|on|off)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_overrides_only_given_keys() {
        let mut cfg = EffectiveConfig::default();
        let raw: RawConfig = toml::from_str(
            r#"
[storage]
export_dir = "out/exports"
"#,
        )
        .unwrap();
        apply_raw_config(&mut cfg, raw);
        assert_eq!(cfg.storage.export_dir, PathBuf::from("out/exports"));
        assert_eq!(cfg.storage.data_file, PathBuf::from("data/reports.json"));
        assert!(cfg.ui.color);
    }

    #[test]
    fn store_options_resolve_against_root() {
        let cfg = EffectiveConfig::default();
        let opts = cfg.storage.store_options(Path::new("/srv/desk"));
        assert_eq!(opts.data_file, PathBuf::from("/srv/desk/data/reports.json"));
        assert_eq!(opts.export_dir, PathBuf::from("/srv/desk/reports"));
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool(" ON ").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
