//! # IMU Reader
//!
//! Pulls frames from the inertial sensor when the data-ready latch is set.
//!
//! The reader never waits for data: if the latch is clear, [`ImuReader::poll`]
//! returns an invalid sample without touching the bus.

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::decoder::decode;
use super::frame::{ImuSample, RawImuFrame, IMU_FRAME_LEN, IMU_READ_COMMAND};
use super::latch::DataReadyLatch;
use crate::error::{RelayError, Result};

/// Sensor bus capability for the inertial sensor
///
/// One call is one chip-select-framed transaction: clock out `command`, then
/// clock in the full frame.
#[cfg_attr(test, mockall::automock)]
pub trait ImuBus {
    fn read_frame(&mut self, command: &[u8; 2], frame: &mut RawImuFrame) -> io::Result<()>;
}

/// Latch-gated frame reader
pub struct ImuReader<B: ImuBus> {
    bus: B,
    latch: DataReadyLatch,
    stale_after: Duration,
    last_read: Option<Instant>,
    last_interval: Option<Duration>,
}

impl<B: ImuBus> ImuReader<B> {
    /// Create a reader over `bus`, consuming `latch`
    ///
    /// # Arguments
    ///
    /// * `bus` - Sensor bus transport
    /// * `latch` - Data-ready latch set by the sensor interrupt
    /// * `stale_after` - Read intervals longer than this are logged as warnings
    pub fn new(bus: B, latch: DataReadyLatch, stale_after: Duration) -> Self {
        Self {
            bus,
            latch,
            stale_after,
            last_read: None,
            last_interval: None,
        }
    }

    /// Read and decode a frame if one has been signalled
    ///
    /// # Returns
    ///
    /// * `Result<ImuSample>` - Fresh sample, or an invalid sample when no data is ready
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Bus` if the bus transaction fails. The latch has
    /// already been consumed at that point, so the frame is dropped.
    pub fn poll(&mut self) -> Result<ImuSample> {
        if !self.latch.test_and_clear() {
            return Ok(decode(&[0u8; IMU_FRAME_LEN], false));
        }

        let mut raw: RawImuFrame = [0u8; IMU_FRAME_LEN];
        self.bus
            .read_frame(&IMU_READ_COMMAND, &mut raw)
            .map_err(RelayError::Bus)?;

        self.record_interval(Instant::now());

        Ok(decode(&raw, true))
    }

    /// Time between the two most recent frame reads
    pub fn last_interval(&self) -> Option<Duration> {
        self.last_interval
    }

    /// Shared latch handle, for wiring to the interrupt source
    pub fn latch(&self) -> &DataReadyLatch {
        &self.latch
    }

    fn record_interval(&mut self, now: Instant) {
        if let Some(previous) = self.last_read {
            let interval = now.duration_since(previous);
            if interval > self.stale_after {
                warn!("IMU frame interval {:?} exceeds {:?}", interval, self.stale_after);
            } else {
                trace!("IMU frame interval {:?}", interval);
            }
            self.last_interval = Some(interval);
        } else {
            debug!("First IMU frame read");
        }
        self.last_read = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imu::frame::IMU_FRAME_HEADER_LEN;

    fn reader(bus: MockImuBus) -> ImuReader<MockImuBus> {
        ImuReader::new(bus, DataReadyLatch::new(), Duration::from_millis(100))
    }

    #[test]
    fn test_poll_without_signal_skips_bus() {
        let mut bus = MockImuBus::new();
        bus.expect_read_frame().times(0);

        let mut reader = reader(bus);
        let sample = reader.poll().unwrap();

        assert!(!sample.valid);
        assert!(reader.last_interval().is_none());
    }

    #[test]
    fn test_poll_after_signal_reads_and_decodes() {
        let mut bus = MockImuBus::new();
        bus.expect_read_frame()
            .times(1)
            .returning(|command, frame| {
                assert_eq!(*command, [0x3D, 0x00]);
                // v[3] = 4000 -> 1 g on X
                frame[IMU_FRAME_HEADER_LEN + 6] = 0x0F;
                frame[IMU_FRAME_HEADER_LEN + 7] = 0xA0;
                Ok(())
            });

        let mut reader = reader(bus);
        reader.latch().signal();

        let sample = reader.poll().unwrap();
        assert!(sample.valid);
        assert_eq!(sample.x_accel, 1.0);
        assert!(!reader.latch().is_set(), "poll must clear the latch");
    }

    #[test]
    fn test_bus_failure_surfaces_and_consumes_latch() {
        let mut bus = MockImuBus::new();
        bus.expect_read_frame()
            .times(1)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::TimedOut, "spi")));

        let mut reader = reader(bus);
        reader.latch().signal();

        match reader.poll() {
            Err(RelayError::Bus(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("Expected Bus error, got: {:?}", other),
        }
        assert!(!reader.latch().is_set());
    }

    #[test]
    fn test_interval_recorded_from_second_read() {
        let mut bus = MockImuBus::new();
        bus.expect_read_frame().times(2).returning(|_, _| Ok(()));

        let mut reader = reader(bus);

        reader.latch().signal();
        reader.poll().unwrap();
        assert!(reader.last_interval().is_none());

        reader.latch().signal();
        reader.poll().unwrap();
        assert!(reader.last_interval().is_some());
    }
}
