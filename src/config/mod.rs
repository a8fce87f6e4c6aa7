// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};

use rune_cfg::RuneConfig;

pub mod model;
pub mod parser;

use model::{Settings, TurnoffConfig};
use parser::{ConfigParseError, parse_config, parse_settings};

pub const DEFAULT_CONFIG: &str = include_str!("../../assets/turnoff.rune");

/// A parsed configuration and the file it came from (`None` for the embedded default).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: TurnoffConfig,
}

/// Determine which config file to use.
///
/// An explicit path always wins, even if it does not exist, so the caller gets
/// a clear error instead of silently running with another file.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // 1. Check user config first
    if let Some(mut path) = dirs::home_dir() {
        path.push(".config/turnoff/turnoff.rune");
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Check system config
    let system_path = PathBuf::from("/etc/turnoff/turnoff.rune");
    if system_path.exists() {
        return Some(system_path);
    }

    None
}

fn read_rune(path: Option<&Path>) -> Result<RuneConfig, ConfigParseError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigParseError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )));
            }
            RuneConfig::from_file(path).map_err(|e| {
                ConfigParseError::RuneConfig(format!(
                    "failed to load config from {}: {}",
                    path.display(),
                    e
                ))
            })
        }
        None => RuneConfig::from_str(DEFAULT_CONFIG).map_err(|e| {
            ConfigParseError::RuneConfig(format!("failed to parse internal default config: {}", e))
        }),
    }
}

pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigParseError> {
    let path = resolve_config_path(explicit);
    let rune = read_rune(path.as_deref())?;
    Ok(LoadedConfig {
        config: parse_config(&rune)?,
        path,
    })
}

/// Re-read only the session settings from an already resolved path.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigParseError> {
    let rune = read_rune(path)?;
    parse_settings(&rune)
}
