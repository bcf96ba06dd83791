//! # Configuration Management
//!
//! Centralized configuration for the translation bridge.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` or strings via `from_toml()`
//! - Environment variables prefixed `PROTOCOL_BRIDGE_` via `from_env()`
//! - Direct instantiation with defaults and `default_with_overrides()`
//!
//! ## Sections
//! - `bridge`: which generations are bridged, realm address, frame size cap
//! - `frames`: optional per-direction frame header overrides
//! - `timezone`: the realm's distance from UTC
//! - `logging`: subscriber settings

use crate::core::frame::FrameLayout;
use crate::error::{constants, BridgeError, Result};
use crate::protocol::generation::{Direction, Generation};
use crate::time::{Minutes, RealmZone, Timezone};
use crate::time::zone::MAX_OFFSET_MINUTES;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

/// Default cap on a single frame body.
pub const MAX_FRAME_BODY: usize = 256 * 1024;

/// Smallest accepted frame body cap.
pub const MIN_FRAME_BODY: usize = 1024;

/// Largest accepted frame body cap.
pub const MAX_FRAME_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Header length the feedback ciphers transform on received frames.
const FEEDBACK_RECV_HEADER: usize = 4;

/// Header length the feedback ciphers transform on sent frames.
const FEEDBACK_SEND_HEADER: usize = 6;

/// Top-level bridge configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(default)]
    pub frames: FrameConfig,

    #[serde(default)]
    pub timezone: TimezoneConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", constants::ERR_CONFIG_READ)))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", constants::ERR_CONFIG_PARSE)))
    }

    /// Defaults overridden by `PROTOCOL_BRIDGE_*` environment variables.
    ///
    /// Unparseable values are reported rather than ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("PROTOCOL_BRIDGE_LEGACY_GENERATION") {
            config.bridge.legacy_generation = value.parse().map_err(BridgeError::Config)?;
        }

        if let Ok(value) = std::env::var("PROTOCOL_BRIDGE_MODERN_GENERATION") {
            config.bridge.modern_generation = value.parse().map_err(BridgeError::Config)?;
        }

        if let Ok(value) = std::env::var("PROTOCOL_BRIDGE_REALM_ADDRESS") {
            config.bridge.virtual_realm_address = parse_env("PROTOCOL_BRIDGE_REALM_ADDRESS", &value)?;
        }

        if let Ok(value) = std::env::var("PROTOCOL_BRIDGE_MAX_FRAME_BODY") {
            config.bridge.max_frame_body = parse_env("PROTOCOL_BRIDGE_MAX_FRAME_BODY", &value)?;
        }

        if let Ok(value) = std::env::var("PROTOCOL_BRIDGE_TIMEZONE_OFFSET") {
            config.timezone.offset_minutes =
                Some(parse_env("PROTOCOL_BRIDGE_TIMEZONE_OFFSET", &value)?);
        }

        if let Ok(value) = std::env::var("PROTOCOL_BRIDGE_LOG_LEVEL") {
            config.logging.log_level = value
                .parse()
                .map_err(|_| BridgeError::Config(format!("Invalid log level: {value}")))?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            BridgeError::Config(format!("{}: {e}", constants::ERR_CONFIG_SERIALIZE))
        })?;

        std::fs::write(path, content)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", constants::ERR_CONFIG_WRITE)))?;

        Ok(())
    }

    /// Validate the configuration, returning every problem found.
    ///
    /// An empty list means the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.bridge.validate());
        errors.extend(self.frames.validate(&self.bridge));
        errors.extend(self.timezone.validate());
        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| BridgeError::Config(format!("Invalid value for {name}: '{value}'")))
}

/// Which generations are bridged and how large frames may be
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Generation spoken by the server side
    pub legacy_generation: Generation,

    /// Generation spoken by the client side
    pub modern_generation: Generation,

    /// Virtual realm address stamped on identifiers and achievements
    pub virtual_realm_address: u32,

    /// Largest frame body accepted from either side
    pub max_frame_body: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            legacy_generation: Generation::Wotlk,
            modern_generation: Generation::ClassicWotlk,
            virtual_realm_address: 1,
            max_frame_body: MAX_FRAME_BODY,
        }
    }
}

impl BridgeSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.legacy_generation.is_legacy() {
            errors.push(format!(
                "legacy_generation must be a legacy generation, got '{}'",
                self.legacy_generation
            ));
        }

        if self.modern_generation.is_legacy() {
            errors.push(format!(
                "modern_generation must be a modern generation, got '{}'",
                self.modern_generation
            ));
        }

        if self.virtual_realm_address == 0 {
            errors.push("Virtual realm address cannot be 0".to_string());
        }

        if self.max_frame_body < MIN_FRAME_BODY {
            errors.push(format!(
                "Max frame body too small: {} bytes (minimum: {MIN_FRAME_BODY})",
                self.max_frame_body
            ));
        } else if self.max_frame_body > MAX_FRAME_BODY_LIMIT {
            errors.push(format!(
                "Max frame body too large: {} bytes (maximum: {MAX_FRAME_BODY_LIMIT})",
                self.max_frame_body
            ));
        }

        errors
    }
}

/// Frame header layouts of all four directions of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSet {
    /// Frames arriving from the legacy server
    pub server_inbound: FrameLayout,
    /// Frames sent to the legacy server
    pub server_outbound: FrameLayout,
    /// Frames arriving from the modern client
    pub client_inbound: FrameLayout,
    /// Frames sent to the modern client
    pub client_outbound: FrameLayout,
}

impl LayoutSet {
    /// Built-in layouts of the two generations.
    pub fn for_generations(legacy: Generation, modern: Generation) -> Self {
        Self {
            server_inbound: legacy.frame_layout(Direction::ServerToClient),
            server_outbound: legacy.frame_layout(Direction::ClientToServer),
            client_inbound: modern.frame_layout(Direction::ClientToServer),
            client_outbound: modern.frame_layout(Direction::ServerToClient),
        }
    }
}

/// Optional per-direction overrides of the built-in frame layouts
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrameConfig {
    pub server_inbound: Option<FrameLayout>,
    pub server_outbound: Option<FrameLayout>,
    pub client_inbound: Option<FrameLayout>,
    pub client_outbound: Option<FrameLayout>,
}

impl FrameConfig {
    /// Built-in layouts with any configured overrides applied.
    pub fn resolve(&self, bridge: &BridgeSettings) -> LayoutSet {
        let defaults =
            LayoutSet::for_generations(bridge.legacy_generation, bridge.modern_generation);
        LayoutSet {
            server_inbound: self.server_inbound.unwrap_or(defaults.server_inbound),
            server_outbound: self.server_outbound.unwrap_or(defaults.server_outbound),
            client_inbound: self.client_inbound.unwrap_or(defaults.client_inbound),
            client_outbound: self.client_outbound.unwrap_or(defaults.client_outbound),
        }
    }

    pub fn validate(&self, bridge: &BridgeSettings) -> Vec<String> {
        let mut errors = Vec::new();
        let layouts = self.resolve(bridge);

        for (name, layout) in [
            ("server_inbound", layouts.server_inbound),
            ("server_outbound", layouts.server_outbound),
            ("client_inbound", layouts.client_inbound),
            ("client_outbound", layouts.client_outbound),
        ] {
            errors.extend(
                layout
                    .validate()
                    .into_iter()
                    .map(|problem| format!("frames.{name}: {problem}")),
            );
        }

        // The feedback ciphers transform a fixed header prefix in each direction.
        if matches!(
            bridge.legacy_generation,
            Generation::Vanilla | Generation::Tbc
        ) {
            if layouts.server_inbound.header_len() != FEEDBACK_RECV_HEADER {
                errors.push(format!(
                    "frames.server_inbound: header must be {FEEDBACK_RECV_HEADER} bytes for {}",
                    bridge.legacy_generation
                ));
            }
            if layouts.server_outbound.header_len() != FEEDBACK_SEND_HEADER {
                errors.push(format!(
                    "frames.server_outbound: header must be {FEEDBACK_SEND_HEADER} bytes for {}",
                    bridge.legacy_generation
                ));
            }
        }

        errors
    }
}

/// Realm distance from UTC. An explicit offset wins over a realm zone.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimezoneConfig {
    pub realm_zone: Option<RealmZone>,
    pub offset_minutes: Option<i32>,
}

impl TimezoneConfig {
    pub fn timezone(&self) -> Result<Timezone> {
        match (self.offset_minutes, self.realm_zone) {
            (Some(offset), _) => Timezone::new(Minutes(offset)),
            (None, Some(zone)) => Ok(Timezone::from_realm_zone(zone)),
            (None, None) => Ok(Timezone::UTC),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(offset) = self.offset_minutes {
            if offset.abs() > MAX_OFFSET_MINUTES {
                errors.push(format!(
                    "Timezone offset out of range: {offset} minutes (maximum: ±{MAX_OFFSET_MINUTES})"
                ));
            }
            if self.realm_zone.is_some() {
                errors.push(
                    "Set either timezone.realm_zone or timezone.offset_minutes, not both"
                        .to_string(),
                );
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("protocol-bridge"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            match self.log_file_path {
                Some(ref path) => {
                    if let Some(parent) = Path::new(path).parent() {
                        if !parent.as_os_str().is_empty() && !parent.exists() {
                            errors.push(format!(
                                "Log file directory does not exist: {}",
                                parent.display()
                            ));
                        }
                    }
                }
                None => errors
                    .push("log_file_path must be specified when log_to_file is true".to_string()),
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Serde helper for `tracing::Level`
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        level.as_str().to_ascii_lowercase().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
