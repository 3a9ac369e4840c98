//! Configuration loaded from `~/.config/kakurx/config.ini`.
//!
//! ```text
//! ~/.config/kakurx/
//!   config.ini          — User configuration
//!   traces/             — Scanned for recorded pulse traces to replay
//! ```
//!
//! Missing or malformed keys fall back to defaults; a missing file is written
//! out as a commented template.

use anyhow::{Context, Result};
use configparser::ini::Ini;
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // [receiver]
    /// Consecutive identical frames required before a command is dispatched
    pub min_repeats: u16,

    // [traces]
    /// Directory scanned for recorded pulse traces when no files are named
    pub trace_directory: PathBuf,
}

impl Config {
    /// Build the default config, using the given config_dir as the base.
    fn default_for(config_dir: &Path) -> Self {
        Self {
            min_repeats: 2,
            trace_directory: config_dir.join("traces"),
        }
    }

    /// Load config from an INI file, falling back to defaults for missing keys.
    fn load_from_ini(path: &Path, config_dir: &Path) -> Result<Self> {
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let defaults = Config::default_for(config_dir);

        let min_repeats = ini
            .getuint("receiver", "min_repeats")
            .ok()
            .flatten()
            .map(|v| v as u16)
            .unwrap_or(defaults.min_repeats);

        let trace_directory = ini
            .get("traces", "trace_directory")
            .map(|s| expand_tilde(&s))
            .unwrap_or(defaults.trace_directory);

        Ok(Self {
            min_repeats,
            trace_directory,
        })
    }

    /// Save config to an INI-style file with comments explaining each field.
    fn save_to_ini(&self, path: &Path) -> Result<()> {
        let trace_str = self.trace_directory.to_string_lossy();

        let content = format!(
            r#"; kakurx — New Kaku (KlikAanKlikUit) receiver configuration
; Location: {path}
;
; Edit this file to change default settings.
; Lines starting with ; or # are comments.

[receiver]
; Number of consecutive identical frames required before a decoded
; command is reported. Remotes repeat automatically while a button is
; held; 2 filters single corrupted receptions without adding noticeable
; latency.
min_repeats = {min_repeats}

[traces]
; Directory scanned for recorded pulse traces (*.json) when the replay
; tool is run without file arguments.
; Supports ~ for home directory.
trace_directory = {trace_dir}
"#,
            path = path.display(),
            min_repeats = self.min_repeats,
            trace_dir = trace_str,
        );

        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Load the configuration.
    ///
    /// 1. Resolves the config directory (`~/.config/kakurx`).
    /// 2. Creates it if missing.
    /// 3. Loads `config.ini` if it exists, otherwise writes a default one.
    /// 4. Creates the trace directory if missing.
    pub fn load() -> Result<Self> {
        let config_dir = resolve_config_dir()
            .context("Could not determine home directory (is $HOME set?)")?;

        let config_path = config_dir.join("config.ini");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config dir: {:?}", config_dir))?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }

        let config = if config_path.exists() {
            tracing::info!("Loading config from {:?}", config_path);
            match Config::load_from_ini(&config_path, &config_dir) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to parse config.ini, using defaults: {}", e);
                    Config::default_for(&config_dir)
                }
            }
        } else {
            tracing::info!("No config.ini found — creating default at {:?}", config_path);
            let config = Config::default_for(&config_dir);
            if let Err(e) = config.save_to_ini(&config_path) {
                tracing::warn!("Could not write default config.ini: {}", e);
            }
            config
        };

        if !config.trace_directory.exists() {
            fs::create_dir_all(&config.trace_directory).with_context(|| {
                format!("Failed to create trace dir: {:?}", config.trace_directory)
            })?;
            tracing::info!("Created trace directory: {:?}", config.trace_directory);
        }

        tracing::info!("Config dir: {:?}", config_dir);
        tracing::info!("Trace dir: {:?}", config.trace_directory);

        Ok(config)
    }

    /// Save the current configuration back to `config.ini`.
    pub fn save(&self) -> Result<()> {
        let config_dir = resolve_config_dir()
            .context("Could not determine home directory (is $HOME set?)")?;
        let config_path = config_dir.join("config.ini");
        self.save_to_ini(&config_path)?;
        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }
}

/// Fallback Default (without touching the filesystem).
impl Default for Config {
    fn default() -> Self {
        let fallback =
            resolve_config_dir().unwrap_or_else(|| PathBuf::from(".").join("kakurx"));
        Config::default_for(&fallback)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(s: &str) -> PathBuf {
    if s.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&s[2..]);
        }
    }
    PathBuf::from(s)
}

/// Resolve the config directory to `~/.config/kakurx/` regardless of OS.
pub fn resolve_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("kakurx"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let dir = PathBuf::from("/tmp/kakurx-test");
        let config = Config::default_for(&dir);
        assert_eq!(config.min_repeats, 2);
        assert_eq!(config.trace_directory, dir.join("traces"));
    }

    #[test]
    fn test_ini_round_trip() {
        let dir = std::env::temp_dir().join("kakurx_config_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ini");

        let mut config = Config::default_for(&dir);
        config.min_repeats = 4;
        config.save_to_ini(&path).unwrap();

        let loaded = Config::load_from_ini(&path, &dir).unwrap();
        fs::remove_dir_all(&dir).ok();
        assert_eq!(loaded.min_repeats, 4);
        assert_eq!(loaded.trace_directory, dir.join("traces"));
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/traces"), home.join("traces"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
