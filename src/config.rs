//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{RelayError, Result};
use crate::link::record::MAX_LINE_LEN;
use crate::radar::registers::MAX_PEAKS;

/// Main configuration structure
///
/// Every section may be omitted, in which case its defaults apply.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub imu: ImuConfig,
    #[serde(default)]
    pub radar: RadarConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Serial radio modem configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_radio_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Bound on writing one acknowledgment to the modem
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Inertial sensor configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ImuConfig {
    /// Read intervals above this are logged as stale
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
}

/// Radar module configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadarConfig {
    #[serde(default = "default_start_mm")]
    pub start_mm: u32,

    #[serde(default = "default_end_mm")]
    pub end_mm: u32,

    #[serde(default = "default_channel_count")]
    pub channel_count: usize,

    #[serde(default = "default_max_busy_polls")]
    pub max_busy_polls: u32,
}

/// Radio link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,

    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_radio_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 57600 }
fn default_timeout_ms() -> u64 { 100 }

fn default_stale_after_ms() -> u64 { 50 }

fn default_start_mm() -> u32 { 20 }
fn default_end_mm() -> u32 { 7000 }
fn default_channel_count() -> usize { 9 }
fn default_max_busy_polls() -> u32 { 1000 }

fn default_ack_timeout_ms() -> u64 { 500 }
fn default_max_line_len() -> usize { MAX_LINE_LEN }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

/// Baud rates the radio modem supports
const VALID_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 230400];

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            port: default_radio_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self { stale_after_ms: default_stale_after_ms() }
    }
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            start_mm: default_start_mm(),
            end_mm: default_end_mm(),
            channel_count: default_channel_count(),
            max_busy_polls: default_max_busy_polls(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: default_ack_timeout_ms(),
            max_line_len: default_max_line_len(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

impl RadioConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ImuConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

impl LinkConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> RelayError {
    RelayError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tracker_relay::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Radio
        if self.radio.port.is_empty() {
            return Err(invalid("radio port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.radio.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                VALID_BAUD_RATES
            )));
        }

        if self.radio.timeout_ms == 0 || self.radio.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // IMU
        if self.imu.stale_after_ms == 0 || self.imu.stale_after_ms > 60000 {
            return Err(invalid("stale_after_ms must be between 1 and 60000"));
        }

        // Radar
        if self.radar.start_mm >= self.radar.end_mm {
            return Err(invalid("start_mm must be less than end_mm"));
        }

        if self.radar.channel_count == 0 || self.radar.channel_count > MAX_PEAKS {
            return Err(invalid(format!(
                "channel_count must be between 1 and {}",
                MAX_PEAKS
            )));
        }

        if self.radar.max_busy_polls == 0 {
            return Err(invalid("max_busy_polls must be greater than 0"));
        }

        // Link
        if self.link.ack_timeout_ms == 0 || self.link.ack_timeout_ms > 60000 {
            return Err(invalid("ack_timeout_ms must be between 1 and 60000"));
        }

        if self.link.max_line_len == 0 || self.link.max_line_len > MAX_LINE_LEN {
            return Err(invalid(format!(
                "max_line_len must be between 1 and {}",
                MAX_LINE_LEN
            )));
        }

        // Telemetry
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config {
            radio: RadioConfig {
                port: default_radio_port(),
                baud_rate: default_baud_rate(),
                timeout_ms: default_timeout_ms(),
            },
            imu: ImuConfig {
                stale_after_ms: default_stale_after_ms(),
            },
            radar: RadarConfig {
                start_mm: default_start_mm(),
                end_mm: default_end_mm(),
                channel_count: default_channel_count(),
                max_busy_polls: default_max_busy_polls(),
            },
            link: LinkConfig {
                ack_timeout_ms: default_ack_timeout_ms(),
                max_line_len: default_max_line_len(),
            },
            telemetry: TelemetryConfig {
                enabled: default_telemetry_enabled(),
                log_dir: default_log_dir(),
                max_records_per_file: default_max_records_per_file(),
                max_files_to_keep: default_max_files_to_keep(),
                format: default_log_format(),
            },
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[radio]
port = "/dev/ttyUSB1"
baud_rate = 115200

[radar]
start_mm = 100
end_mm = 3000

[link]
ack_timeout_ms = 250
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.radio.port, "/dev/ttyUSB1");
        assert_eq!(config.radio.baud_rate, 115200);
        assert_eq!(config.radar.start_mm, 100);
        assert_eq!(config.radar.channel_count, 9);
        assert_eq!(config.link.ack_timeout(), Duration::from_millis(250));
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.radio.port, "/dev/ttyUSB0");
        assert_eq!(config.link.max_line_len, 256);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/tracker-relay.toml");
        assert!(matches!(result, Err(RelayError::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = Config::from_toml("[radio\nport = ");
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let result = Config::from_toml("[radar]\nstart_mm = 5000\nend_mm = 1000\n");
        match result {
            Err(RelayError::Config(e)) => assert!(e.to_string().contains("start_mm")),
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_radio_port() {
        let mut config = create_valid_config();
        config.radio.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = create_valid_config();
        config.radio.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &VALID_BAUD_RATES {
            let mut config = create_valid_config();
            config.radio.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_timeout_ms_zero() {
        let mut config = create_valid_config();
        config.radio.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_ms_too_high() {
        let mut config = create_valid_config();
        config.radio.timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stale_after_zero() {
        let mut config = create_valid_config();
        config.imu.stale_after_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_radar_range_equal() {
        let mut config = create_valid_config();
        config.radar.start_mm = 1000;
        config.radar.end_mm = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_count_zero() {
        let mut config = create_valid_config();
        config.radar.channel_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_count_above_peak_slots() {
        let mut config = create_valid_config();
        config.radar.channel_count = MAX_PEAKS + 1;
        assert!(config.validate().is_err());

        config.radar.channel_count = MAX_PEAKS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_busy_polls_zero() {
        let mut config = create_valid_config();
        config.radar.max_busy_polls = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ack_timeout_zero() {
        let mut config = create_valid_config();
        config.link.ack_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ack_timeout_too_high() {
        let mut config = create_valid_config();
        config.link.ack_timeout_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_line_len_above_ceiling() {
        let mut config = create_valid_config();
        config.link.max_line_len = MAX_LINE_LEN + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = create_valid_config();
        config.telemetry.format = "csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_helpers() {
        let config = create_valid_config();
        assert_eq!(config.radio.timeout(), Duration::from_millis(100));
        assert_eq!(config.imu.stale_after(), Duration::from_millis(50));
        assert_eq!(config.link.ack_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_radio_port(), "/dev/ttyUSB0");
        assert_eq!(default_baud_rate(), 57600);
        assert_eq!(default_timeout_ms(), 100);
        assert_eq!(default_stale_after_ms(), 50);
        assert_eq!(default_start_mm(), 20);
        assert_eq!(default_end_mm(), 7000);
        assert_eq!(default_channel_count(), 9);
        assert_eq!(default_max_busy_polls(), 1000);
        assert_eq!(default_ack_timeout_ms(), 500);
        assert_eq!(default_max_line_len(), 256);
        assert_eq!(default_telemetry_enabled(), true);
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_format(), "jsonl");
    }
}
