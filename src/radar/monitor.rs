//! # Radar Acquisition Monitor
//!
//! Drives one measurement cycle of the radar distance detector and exposes
//! the per-channel peaks it produced.
//!
//! ## Cycle
//!
//! ```text
//! CheckError -> StartDetector -> AwaitReady -> VerifyError
//!            -> VerifyMeasurement -> Recalibrate? -> fresh
//! ```
//!
//! Starting the detector is asynchronous on the device side, so completion
//! is polled on the busy bit. The poll is capped at `max_busy_polls` status
//! reads. Recalibration is advisory: the command is issued and the cycle
//! reports [`RadarError::RecalibrationTriggered`] without waiting for it.
//!
//! ## Access
//!
//! `refresh` and `read_channels` take `&mut self`; callers with more than one
//! execution context must serialize access (e.g. behind a mutex), since the
//! per-channel reads are not atomic as a set.

use tracing::{debug, info, warn};

use super::bus::RegisterBus;
use super::channels::{RadarChannel, RadarChannelSet};
use super::registers::*;
use crate::error::RadarError;

/// Result alias for radar cycles
pub type RadarResult<T> = std::result::Result<T, RadarError>;

/// Default bound on busy-bit polls per wait
pub const DEFAULT_MAX_BUSY_POLLS: u32 = 1000;

/// Latest status observed on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadarStatus {
    pub errors: DetectorErrors,
    pub busy: bool,
    pub measurement_failed: bool,
    pub calibration_needed: bool,
}

/// Radar acquisition state machine over a register bus
pub struct RadarMonitor<B: RegisterBus> {
    bus: B,
    max_busy_polls: u32,
    status: RadarStatus,
    channels: RadarChannelSet,
    fresh: bool,
}

impl<B: RegisterBus> RadarMonitor<B> {
    /// Create a monitor
    ///
    /// # Arguments
    ///
    /// * `bus` - Register interface of the radar module
    /// * `max_busy_polls` - Status reads allowed while waiting for the busy bit to clear (min 1)
    pub fn new(bus: B, max_busy_polls: u32) -> Self {
        Self {
            bus,
            max_busy_polls: max_busy_polls.max(1),
            status: RadarStatus::default(),
            channels: RadarChannelSet::default(),
            fresh: false,
        }
    }

    /// Reset the module and apply a measurement interval
    ///
    /// # Arguments
    ///
    /// * `start_mm` - Start of the measured interval
    /// * `end_mm` - End of the measured interval
    ///
    /// # Errors
    ///
    /// Returns the same taxonomy as [`refresh`](Self::refresh): device error
    /// bits, rejected commands, busy timeout or bus failure.
    pub fn configure(&mut self, start_mm: u32, end_mm: u32) -> RadarResult<()> {
        self.fresh = false;

        self.command(CMD_RESET_MODULE)?;
        let status = self.await_ready()?;
        self.check_errors(status)?;

        self.bus.write_register(REG_START, start_mm)?;
        self.bus.write_register(REG_END, end_mm)?;

        self.command(CMD_APPLY_CONFIGURATION)?;
        let status = self.await_ready()?;
        self.check_errors(status)?;

        info!("Radar configured for {}..{} mm", start_mm, end_mm);
        Ok(())
    }

    /// Run one measurement cycle
    ///
    /// On success the peak registers hold a fresh measurement and
    /// [`read_channels`](Self::read_channels) will read them. On any error the
    /// previously read channels stay as the last known values.
    ///
    /// # Errors
    ///
    /// - `DeviceError`: error bits set before or after the measurement
    /// - `CommandError`: the start command was rejected
    /// - `Timeout`: busy bit did not clear within the poll budget
    /// - `MeasurementFailed`: the distance result flagged a failed measurement
    /// - `RecalibrationTriggered`: calibration was needed and a recalibrate was issued
    /// - `Bus`: a register transaction failed
    pub fn refresh(&mut self) -> RadarResult<()> {
        self.fresh = false;
        self.status = RadarStatus::default();

        let status = self.read_status()?;
        self.check_errors(status)?;

        self.command(CMD_MEASURE_DISTANCE)?;
        self.await_ready()?;

        let status = self.read_status()?;
        self.check_errors(status)?;

        let result = DistanceResult::from(self.bus.read_register(REG_DISTANCE_RESULT)?);
        self.status.measurement_failed = result.measurement_failed;
        self.status.calibration_needed = result.calibration_needed;

        if result.measurement_failed {
            warn!("Radar measure distance error");
            return Err(RadarError::MeasurementFailed);
        }

        if result.calibration_needed {
            info!("Radar requested calibration, issuing recalibrate");
            self.command(CMD_RECALIBRATE)?;
            return Err(RadarError::RecalibrationTriggered);
        }

        debug!(
            "Radar cycle complete ({} peaks, {} degC)",
            result.num_distances, result.temperature
        );
        self.fresh = true;
        Ok(())
    }

    /// Peak distance and strength for channels `0..count`
    ///
    /// Reads the peak registers only after a successful [`refresh`](Self::refresh);
    /// otherwise returns the last known set untouched. `count` is clamped to
    /// [`MAX_PEAKS`].
    ///
    /// # Errors
    ///
    /// Returns `Bus` if a register read fails; the cached set is left unchanged.
    pub fn read_channels(&mut self, count: usize) -> RadarResult<RadarChannelSet> {
        if !self.fresh {
            debug!("No fresh radar cycle, returning last known channels");
            return Ok(self.channels.clone());
        }

        let count = count.min(MAX_PEAKS);
        let mut channels = Vec::with_capacity(count);

        for i in 0..count as u16 {
            let distance_mm = self.bus.read_register(REG_PEAK0_DISTANCE + i)?;
            let strength = self.bus.read_register(REG_PEAK0_STRENGTH + i)? as i32;
            channels.push(RadarChannel { distance_mm, strength });
        }

        self.channels = RadarChannelSet::new(channels);
        Ok(self.channels.clone())
    }

    /// Status seen during the most recent cycle
    pub fn status(&self) -> RadarStatus {
        self.status
    }

    /// Whether the last cycle succeeded and the peak registers are safe to read
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Last channels read, without touching the bus
    pub fn last_channels(&self) -> &RadarChannelSet {
        &self.channels
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn read_status(&mut self) -> RadarResult<u32> {
        let status = self.bus.read_register(REG_DETECTOR_STATUS)?;
        self.status.errors = DetectorErrors::from_status(status);
        self.status.busy = is_busy(status);
        Ok(status)
    }

    fn check_errors(&self, status: u32) -> RadarResult<()> {
        let errors = DetectorErrors::from_status(status);
        if errors.is_empty() {
            Ok(())
        } else {
            warn!("Detector status error: {:?} (raw {:#010x})", errors, status);
            Err(RadarError::DeviceError(errors))
        }
    }

    fn command(&mut self, command: u32) -> RadarResult<()> {
        self.bus
            .write_register(REG_COMMAND, command)
            .map_err(|source| {
                warn!("Radar command {:#x} failed: {}", command, source);
                RadarError::CommandError { command, source }
            })
    }

    fn await_ready(&mut self) -> RadarResult<u32> {
        for _ in 0..self.max_busy_polls {
            let status = self.read_status()?;
            if !is_busy(status) {
                return Ok(status);
            }
        }

        warn!("Radar busy after {} polls", self.max_busy_polls);
        Err(RadarError::Timeout { polls: self.max_busy_polls })
    }
}
