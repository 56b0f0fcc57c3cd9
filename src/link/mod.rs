//! # Radio Link Module
//!
//! Telemetry framing and acknowledged delivery over the long-range radio.
//!
//! This module handles:
//! - Rendering the telemetry record as a bounded ASCII line
//! - The session-wide 12-bit sequence counter
//! - Send / wait-for-ack exchange with a fixed timeout
//! - Ground-side parsing of received lines and sequence gap detection

pub mod record;
pub mod session;
pub mod radio;
pub mod wire;
