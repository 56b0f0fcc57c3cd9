//! # Telemetry Module
//!
//! Handles link logging to JSONL files with rotation.
//!
//! This module handles:
//! - Recording each received telemetry packet and its sequence outcome
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files

pub mod logger;

pub use logger::{LinkLogEntry, LinkOutcome, TelemetryLogger};
