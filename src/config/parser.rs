// Author: Dustin Pilgrim
// License: MIT

use std::fmt;
use std::io;

use rune_cfg::{RuneConfig, Value};

use crate::config::model::*;

#[derive(Debug)]
pub enum ConfigParseError {
    RuneConfig(String),
    Io(io::Error),
    InvalidValue { key: String, value: String, expected: &'static str },
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigParseError::RuneConfig(msg) => write!(f, "Configuration error: {}", msg),
            ConfigParseError::Io(e) => write!(f, "IO error: {}", e),
            ConfigParseError::InvalidValue { key, value, expected } => {
                write!(f, "Invalid value '{}' for {}: expected {}", value, key, expected)
            }
        }
    }
}

impl std::error::Error for ConfigParseError {}

impl From<io::Error> for ConfigParseError {
    fn from(err: io::Error) -> Self {
        ConfigParseError::Io(err)
    }
}

fn alt(path: &str) -> String {
    path.replace('_', "-")
}

fn get_raw(config: &RuneConfig, path: &str) -> Option<Value> {
    config
        .get_value(path)
        .or_else(|_| config.get_value(&alt(path)))
        .ok()
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Reference(path) => path.join("."),
        other => format!("{:?}", other),
    }
}

fn invalid(path: &str, value: &Value, expected: &'static str) -> ConfigParseError {
    ConfigParseError::InvalidValue {
        key: path.to_string(),
        value: describe(value),
        expected,
    }
}

fn get_string(config: &RuneConfig, path: &str, default: String) -> Result<String, ConfigParseError> {
    match get_raw(config, path) {
        None => Ok(default),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(invalid(path, &other, "a string")),
    }
}

/// Flags are accepted as real booleans or as the strings "true"/"false",
/// which is how the host stores addon settings.
fn get_flag(config: &RuneConfig, path: &str, default: bool) -> Result<bool, ConfigParseError> {
    let expected = "true or false";
    match get_raw(config, path) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(invalid(path, &Value::String(s), expected)),
        },
        Some(other) => Err(invalid(path, &other, expected)),
    }
}

/// Whole, non-negative numbers only. Rune stores every number as `f64`, so
/// fractions and values past `u64::MAX` are rejected here instead of being
/// truncated or saturated.
fn get_number(config: &RuneConfig, path: &str, default: u64) -> Result<u64, ConfigParseError> {
    let expected = "a non-negative integer";
    match get_raw(config, path) {
        None => Ok(default),
        Some(Value::Number(n)) => {
            if n >= 0.0 && n.fract() == 0.0 && n < u64::MAX as f64 {
                Ok(n as u64)
            } else {
                Err(invalid(path, &Value::Number(n), expected))
            }
        }
        Some(Value::String(s)) => match s.trim().parse::<u64>() {
            Ok(n) => Ok(n),
            Err(_) => Err(invalid(path, &Value::String(s), expected)),
        },
        Some(other) => Err(invalid(path, &other, expected)),
    }
}

/// Table indices must also fit a `usize`.
fn get_index(config: &RuneConfig, path: &str) -> Result<usize, ConfigParseError> {
    let n = get_number(config, path, 0)?;
    usize::try_from(n).map_err(|_| ConfigParseError::InvalidValue {
        key: path.to_string(),
        value: n.to_string(),
        expected: "a table index",
    })
}

fn get_port(config: &RuneConfig, path: &str, default: u16) -> Result<u16, ConfigParseError> {
    let n = get_number(config, path, default as u64)?;
    u16::try_from(n).map_err(|_| ConfigParseError::InvalidValue {
        key: path.to_string(),
        value: n.to_string(),
        expected: "a port number",
    })
}

/// Method indices are taken as-is; they are checked against the tables at
/// activation so a bad value only affects the session that uses it.
pub fn parse_settings(config: &RuneConfig) -> Result<Settings, ConfigParseError> {
    Ok(Settings {
        display_method: get_index(config, "turnoff.display_method")?,
        power_method: get_index(config, "turnoff.power_method")?,
        logoff: get_flag(config, "turnoff.logoff", false)?,
        mute: get_flag(config, "turnoff.mute", false)?,
    })
}

fn parse_kodi(config: &RuneConfig) -> Result<KodiConfig, ConfigParseError> {
    let defaults = KodiConfig::default();
    Ok(KodiConfig {
        host: get_string(config, "turnoff.kodi.host", defaults.host)?,
        rpc_port: get_port(config, "turnoff.kodi.rpc_port", defaults.rpc_port)?,
        eventserver_port: get_port(
            config,
            "turnoff.kodi.eventserver_port",
            defaults.eventserver_port,
        )?,
    })
}

fn parse_addon(config: &RuneConfig) -> Result<AddonInfo, ConfigParseError> {
    let defaults = AddonInfo::default();
    Ok(AddonInfo {
        id: get_string(config, "turnoff.addon.id", defaults.id)?,
        name: get_string(config, "turnoff.addon.name", defaults.name)?,
        icon: get_string(config, "turnoff.addon.icon", defaults.icon)?,
        notification_ms: get_number(
            config,
            "turnoff.addon.notification_ms",
            defaults.notification_ms,
        )?,
    })
}

fn parse_logging(config: &RuneConfig) -> Result<LoggingConfig, ConfigParseError> {
    let n = get_number(config, "turnoff.logging.max_level", 3)?;
    Ok(LoggingConfig {
        max_level: n.min(u8::MAX as u64) as u8,
    })
}

pub fn parse_config(config: &RuneConfig) -> Result<TurnoffConfig, ConfigParseError> {
    Ok(TurnoffConfig {
        settings: parse_settings(config)?,
        kodi: parse_kodi(config)?,
        addon: parse_addon(config)?,
        logging: parse_logging(config)?,
    })
}
