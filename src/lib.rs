//! # Tracker Relay Library
//!
//! Sensor-to-radio telemetry for a tracking payload: an inertial sensor and a
//! pulsed radar on one side, a sequenced and acknowledged long-range radio
//! link on the other.
//!
//! This library provides:
//! - Decoding of raw inertial-sensor frames (`imu`)
//! - The radar measurement-cycle state machine (`radar`)
//! - Telemetry line framing, sequencing and acknowledged delivery (`link`)
//! - A serial radio-modem transport (`serial`)
//! - JSONL link logging with rotation (`telemetry`)
//! - Glue holding the latest sensor state for transmission (`pipeline`)

pub mod config;
pub mod error;
pub mod imu;
pub mod radar;
pub mod link;
pub mod serial;
pub mod telemetry;
pub mod pipeline;
