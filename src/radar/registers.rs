//! # Radar Register Map
//!
//! Register addresses, command codes and status bit layouts of the radar
//! distance detector.

use bitflags::bitflags;

/// Detector status register (error bits, busy bit)
pub const REG_DETECTOR_STATUS: u16 = 0x0003;

/// Distance result register (peak count, calibration-needed, measure error)
pub const REG_DISTANCE_RESULT: u16 = 0x0010;

/// Peak 0 distance in mm; peaks 1..9 follow at consecutive addresses
pub const REG_PEAK0_DISTANCE: u16 = 0x0011;

/// Peak 0 strength; peaks 1..9 follow at consecutive addresses
pub const REG_PEAK0_STRENGTH: u16 = 0x001B;

/// Start of the measured interval in mm
pub const REG_START: u16 = 0x0040;

/// End of the measured interval in mm
pub const REG_END: u16 = 0x0041;

/// Command register
pub const REG_COMMAND: u16 = 0x0100;

/// Number of peak slots the detector reports
pub const MAX_PEAKS: usize = 10;

/// Commands written to [`REG_COMMAND`]
pub const CMD_MEASURE_DISTANCE: u32 = 2;
pub const CMD_APPLY_CONFIGURATION: u32 = 3;
pub const CMD_RECALIBRATE: u32 = 5;
/// "RST!" in ASCII
pub const CMD_RESET_MODULE: u32 = 0x5253_5421;

/// Busy bit of the detector status register
pub const STATUS_BUSY: u32 = 1 << 31;

/// Error bits live in the upper half of the detector status register
const STATUS_ERROR_SHIFT: u32 = 16;

/// Distance result: number of detected peaks
pub const RESULT_NUM_DISTANCES_MASK: u32 = 0x0000_000F;
/// Distance result: a target sits at the near edge of the interval
pub const RESULT_NEAR_START_EDGE: u32 = 1 << 8;
/// Distance result: device asks for recalibration
pub const RESULT_CALIBRATION_NEEDED: u32 = 1 << 9;
/// Distance result: the last measurement failed
pub const RESULT_MEASURE_DISTANCE_ERROR: u32 = 1 << 10;
const RESULT_TEMPERATURE_SHIFT: u32 = 16;

bitflags! {
    /// Error half of the detector status register, shifted down to bit 0
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DetectorErrors: u32 {
        const RSS_REGISTER       = 1 << 0;
        const CONFIG_CREATE      = 1 << 1;
        const SENSOR_CREATE      = 1 << 2;
        const DETECTOR_CREATE    = 1 << 3;
        const DETECTOR_BUFFER    = 1 << 4;
        const SENSOR_BUFFER      = 1 << 5;
        const CALIBRATION_BUFFER = 1 << 6;
        const CONFIG_APPLY       = 1 << 7;
        const SENSOR_CALIBRATE   = 1 << 8;
        const DETECTOR_CALIBRATE = 1 << 9;
        const DETECTOR           = 1 << 12;
    }
}

impl DetectorErrors {
    /// Extract the error bits from a raw detector status value
    pub fn from_status(status: u32) -> Self {
        Self::from_bits_truncate(status >> STATUS_ERROR_SHIFT)
    }
}

/// Whether a raw detector status value has the busy bit set
pub fn is_busy(status: u32) -> bool {
    status & STATUS_BUSY != 0
}

/// Decoded distance result register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistanceResult {
    pub num_distances: u8,
    pub near_start_edge: bool,
    pub calibration_needed: bool,
    pub measurement_failed: bool,
    /// Sensor temperature in degC
    pub temperature: i16,
}

impl From<u32> for DistanceResult {
    fn from(raw: u32) -> Self {
        Self {
            num_distances: (raw & RESULT_NUM_DISTANCES_MASK) as u8,
            near_start_edge: raw & RESULT_NEAR_START_EDGE != 0,
            calibration_needed: raw & RESULT_CALIBRATION_NEEDED != 0,
            measurement_failed: raw & RESULT_MEASURE_DISTANCE_ERROR != 0,
            temperature: (raw >> RESULT_TEMPERATURE_SHIFT) as u16 as i16,
        }
    }
}
