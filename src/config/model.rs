// Author: Dustin Pilgrim
// License: MIT

/// The per-session choices, read again at each screensaver activation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub display_method: usize,
    pub power_method: usize,
    pub logoff: bool,
    pub mute: bool,
}

/// Where the host listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KodiConfig {
    pub host: String,
    pub rpc_port: u16,
    pub eventserver_port: u16,
}

impl Default for KodiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            rpc_port: 9090,
            eventserver_port: 9777,
        }
    }
}

/// Identity used for log prefixes and notification defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInfo {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub notification_ms: u64,
}

impl Default for AddonInfo {
    fn default() -> Self {
        Self {
            id: "screensaver.turnoff".to_string(),
            name: "Turn Off".to_string(),
            icon: String::new(),
            notification_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub max_level: u8,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { max_level: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnoffConfig {
    pub settings: Settings,
    pub kodi: KodiConfig,
    pub addon: AddonInfo,
    pub logging: LoggingConfig,
}
