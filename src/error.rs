//! # Error Types
//!
//! Custom error types for Tracker Relay using `thiserror`.
//!
//! Radar cycle failures and radio link failures have their own enums so the
//! caller can match on the per-cycle / per-send outcome; both fold into
//! [`RelayError`] through `From`.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::radar::registers::DetectorErrors;

/// Main error type for Tracker Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Wire line or frame could not be parsed
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Sensor bus transaction failed
    #[error("Bus error: {0}")]
    Bus(io::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// No serial port could be opened
    #[error("No radio serial port found (tried: {0})")]
    SerialPortNotFound(String),

    /// Radar acquisition cycle failed
    #[error(transparent)]
    Radar(#[from] RadarError),

    /// Radio link failure
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Telemetry log could not be serialized
    #[error("Telemetry encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a radar acquisition cycle that did not end in fresh data.
///
/// None of these are fatal; the next cycle starts clean.
#[derive(Debug, Error)]
pub enum RadarError {
    /// Detector status register reported one or more error bits
    #[error("Detector status error: {0:?}")]
    DeviceError(DetectorErrors),

    /// A command register write was rejected
    #[error("Detector command {command:#x} failed: {source}")]
    CommandError {
        command: u32,
        #[source]
        source: io::Error,
    },

    /// Busy bit still set after the poll budget ran out
    #[error("Detector still busy after {polls} status polls")]
    Timeout { polls: u32 },

    /// Distance result flagged the measurement as failed
    #[error("Measure distance error")]
    MeasurementFailed,

    /// Calibration was requested by the device and a recalibrate was issued
    #[error("Recalibration triggered, measurement retried next cycle")]
    RecalibrationTriggered,

    /// Register read or write failed at the transport level
    #[error("Radar bus error: {0}")]
    Bus(#[from] io::Error),
}

impl RadarError {
    /// True for outcomes that report progress rather than a fault.
    pub fn is_informational(&self) -> bool {
        matches!(self, RadarError::RecalibrationTriggered)
    }
}

/// Radio link failure for a single send attempt.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Rendered line does not fit the outbound buffer
    #[error("Telemetry line exceeds {limit} bytes")]
    BufferOverflow { limit: usize },

    /// Transport rejected the outbound packet
    #[error("Transmit failed: {0}")]
    TransmitFailed(#[source] io::Error),

    /// Nothing arrived inside the acknowledgment window
    #[error("No acknowledgment within {timeout:?}")]
    NoAck { timeout: Duration },

    /// Transport failed while waiting for the acknowledgment
    #[error("Receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),
}

/// Result type alias for Tracker Relay
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recalibration_is_informational() {
        assert!(RadarError::RecalibrationTriggered.is_informational());
        assert!(!RadarError::MeasurementFailed.is_informational());
        assert!(!RadarError::Timeout { polls: 3 }.is_informational());
    }

    #[test]
    fn test_radar_error_converts_into_relay_error() {
        let err: RelayError = RadarError::MeasurementFailed.into();
        assert!(matches!(err, RelayError::Radar(RadarError::MeasurementFailed)));
        assert_eq!(err.to_string(), "Measure distance error");
    }

    #[test]
    fn test_link_error_messages() {
        let err = LinkError::NoAck { timeout: Duration::from_millis(500) };
        assert_eq!(err.to_string(), "No acknowledgment within 500ms");

        let err = LinkError::BufferOverflow { limit: 256 };
        assert_eq!(err.to_string(), "Telemetry line exceeds 256 bytes");
    }
}
