//! # Radar Module
//!
//! Distance acquisition from the pulsed-radar module over its register
//! interface.
//!
//! This module handles:
//! - Register map, commands and status bit layouts
//! - The status/command/busy-poll handshake for one measurement cycle
//! - Error detection and advisory recalibration
//! - Per-channel peak distance and strength readout

pub mod registers;
pub mod bus;
pub mod channels;
pub mod monitor;
