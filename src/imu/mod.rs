//! # Inertial Sensor Module
//!
//! Turns raw inertial-sensor frames into physical units.
//!
//! This module handles:
//! - Frame layout and scale factors (26-byte frame, twelve big-endian words)
//! - Decoding gated by the data-ready latch
//! - The latch shared with the data-ready interrupt
//! - Reading frames through the sensor bus

pub mod frame;
pub mod decoder;
pub mod latch;
pub mod reader;
