//! Configuration for the landing tracker.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page variant label attached to every event (`unknown` when unset)
    #[serde(default)]
    pub page_variant: Option<String>,

    /// Tracker timing and presentation settings
    #[serde(default)]
    pub tracker: TrackerSettings,

    /// Path for exported tracked events and insight reports
    pub export_path: PathBuf,

    /// Path for the transparency log
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("landing-tracker");

        Self {
            page_variant: None,
            tracker: TrackerSettings::default(),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.tracker.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("landing-tracker")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Path of the persisted transparency log.
    pub fn transparency_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }
}

/// Upper bound for any tracker timing (one day).
pub const MAX_TIMING: Duration = Duration::from_secs(24 * 60 * 60);

/// Timing and presentation settings of the interaction tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Period of the engagement heartbeat
    #[serde(with = "duration_serde")]
    pub heartbeat_interval: Duration,

    /// Engaged time required before a heartbeat is reported
    #[serde(with = "duration_serde")]
    pub engagement_threshold: Duration,

    /// Quiet time after which the visitor counts as disengaged
    #[serde(with = "duration_serde")]
    pub inactivity_timeout: Duration,

    /// Delay between the two stages of the CTA click animation
    #[serde(with = "millis_serde")]
    pub cta_settle_delay: Duration,

    /// Message surfaced after a CTA click
    pub confirmation_message: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            engagement_threshold: Duration::from_secs(30),
            inactivity_timeout: Duration::from_secs(30),
            cta_settle_delay: Duration::from_millis(150),
            confirmation_message: "Welcome! This is where your journey begins.".to_string(),
        }
    }
}

impl TrackerSettings {
    /// Check that every timing is usable for scheduling.
    ///
    /// The heartbeat interval must be non-zero and no timing may exceed
    /// [`MAX_TIMING`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::InvalidSetting(
                "heartbeat_interval must be greater than zero".to_string(),
            ));
        }
        let timings = [
            ("heartbeat_interval", self.heartbeat_interval),
            ("engagement_threshold", self.engagement_threshold),
            ("inactivity_timeout", self.inactivity_timeout),
            ("cta_settle_delay", self.cta_settle_delay),
        ];
        for (name, value) in timings {
            if value > MAX_TIMING {
                return Err(ConfigError::InvalidSetting(format!(
                    "{name} must be at most {} seconds",
                    MAX_TIMING.as_secs()
                )));
            }
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> chrono::Duration {
        to_chrono(self.heartbeat_interval)
    }

    pub fn engagement_threshold(&self) -> chrono::Duration {
        to_chrono(self.engagement_threshold)
    }

    pub fn inactivity_timeout(&self) -> chrono::Duration {
        to_chrono(self.inactivity_timeout)
    }

    pub fn cta_settle_delay(&self) -> chrono::Duration {
        to_chrono(self.cta_settle_delay)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX / 1000))
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Serde support for Duration as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration as milliseconds.
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
