//! Device configuration.
//!
//! Everything the two supervisory loops need at construction time: the
//! station credentials and reconnect bound for the connection manager, and
//! the device identity and topics for the command interpreter.
//!
//! Settings are usually provisioned as a small JSON document:
//!
//! ```rust
//! use stationlink::config::Settings;
//!
//! let json = r#"{
//!     "station": { "ssid": "arena", "passphrase": "hunter22" },
//!     "device": {
//!         "short_id": "7f3a",
//!         "uplink_topic": "game/player/7f3a",
//!         "chat_topic": "game/torget"
//!     }
//! }"#;
//!
//! let settings = Settings::from_json(json).unwrap();
//! assert_eq!(settings.station.max_reconnect_attempts, 100);
//! assert_eq!(settings.device.short_id.as_str(), "7f3a");
//! ```

use heapless::String;
use serde::Deserialize;

/// Longest SSID the radio accepts.
pub const SSID_MAX_LEN: usize = 32;
/// Longest WPA passphrase the radio accepts.
pub const PASSPHRASE_MAX_LEN: usize = 64;
/// Longest device short identifier.
pub const DEVICE_ID_MAX_LEN: usize = 32;
/// Longest MQTT topic name kept in configuration.
pub const TOPIC_MAX_LEN: usize = 128;
/// Reconnect bound used when none is configured.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 100;

/// Errors raised while loading or validating configuration.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse,
    /// A string is longer than its fixed capacity.
    TooLong,
    /// The SSID is empty.
    EmptySsid,
    /// The device short identifier is empty.
    EmptyDeviceId,
    /// A topic is empty.
    EmptyTopic,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::Parse => defmt::write!(f, "Parse"),
            ConfigError::TooLong => defmt::write!(f, "TooLong"),
            ConfigError::EmptySsid => defmt::write!(f, "EmptySsid"),
            ConfigError::EmptyDeviceId => defmt::write!(f, "EmptyDeviceId"),
            ConfigError::EmptyTopic => defmt::write!(f, "EmptyTopic"),
        }
    }
}

fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

/// Station credentials and reconnection bound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StationConfig {
    /// Network name to associate with.
    pub ssid: String<SSID_MAX_LEN>,
    /// WPA passphrase; may be empty for open networks.
    #[serde(default)]
    pub passphrase: String<PASSPHRASE_MAX_LEN>,
    /// Consecutive disconnections tolerated before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl StationConfig {
    /// Build and validate a station configuration with the default bound.
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: String::try_from(ssid).map_err(|_| ConfigError::TooLong)?,
            passphrase: String::try_from(passphrase).map_err(|_| ConfigError::TooLong)?,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the reconnect bound.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Check the invariants the radio relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::EmptySsid);
        }
        Ok(())
    }
}

/// Identity and topics used when publishing console commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Short identifier embedded in chat messages.
    pub short_id: String<DEVICE_ID_MAX_LEN>,
    /// Topic receiving this player's votes.
    pub uplink_topic: String<TOPIC_MAX_LEN>,
    /// Shared chat topic.
    pub chat_topic: String<TOPIC_MAX_LEN>,
}

impl DeviceConfig {
    /// Build and validate a device configuration.
    pub fn new(short_id: &str, uplink_topic: &str, chat_topic: &str) -> Result<Self, ConfigError> {
        let config = Self {
            short_id: String::try_from(short_id).map_err(|_| ConfigError::TooLong)?,
            uplink_topic: String::try_from(uplink_topic).map_err(|_| ConfigError::TooLong)?,
            chat_topic: String::try_from(chat_topic).map_err(|_| ConfigError::TooLong)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that no field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_id.is_empty() {
            return Err(ConfigError::EmptyDeviceId);
        }
        if self.uplink_topic.is_empty() || self.chat_topic.is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        Ok(())
    }
}

/// Complete device settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Wireless station settings.
    pub station: StationConfig,
    /// Console command publishing settings.
    pub device: DeviceConfig,
}

impl Settings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let (settings, _): (Settings, usize) =
            serde_json_core::from_str(json).map_err(|_| ConfigError::Parse)?;
        settings.station.validate()?;
        settings.device.validate()?;
        Ok(settings)
    }
}
