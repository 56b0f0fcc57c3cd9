//! # Sensor-to-Radio Pipeline
//!
//! Glue between the sensor readers and the radio link for the airborne side.
//!
//! The pipeline keeps the latest valid inertial sample and the last radar
//! channel set, and turns them into a telemetry record on demand. It never
//! schedules anything itself: the caller decides how often to poll the IMU,
//! refresh the radar and transmit.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{LinkError, Result};
use crate::imu::frame::ImuSample;
use crate::imu::latch::DataReadyLatch;
use crate::imu::reader::{ImuBus, ImuReader};
use crate::link::radio::{Ack, RadioLink, RadioTransport};
use crate::link::record::TelemetryInputs;
use crate::link::session::LinkSession;
use crate::radar::bus::RegisterBus;
use crate::radar::channels::RadarChannelSet;
use crate::radar::monitor::{RadarMonitor, RadarResult};

/// Latest known sensor state
#[derive(Debug, Clone, Default)]
pub struct SensorState {
    imu: Option<ImuSample>,
    radar: RadarChannelSet,
}

impl SensorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sample` if it is valid
    ///
    /// Returns whether the state changed.
    pub fn update_imu(&mut self, sample: ImuSample) -> bool {
        if sample.valid {
            self.imu = Some(sample);
        }
        sample.valid
    }

    pub fn update_radar(&mut self, channels: RadarChannelSet) {
        self.radar = channels;
    }

    /// Latest valid sample, if any has been seen
    pub fn imu(&self) -> Option<&ImuSample> {
        self.imu.as_ref()
    }

    pub fn radar(&self) -> &RadarChannelSet {
        &self.radar
    }

    /// Build the telemetry inputs for a record stamped `timestamp_ms`
    ///
    /// Angles are converted to degrees. Before the first valid sample the
    /// attitude and acceleration are zero.
    pub fn to_inputs(&self, timestamp_ms: u64) -> TelemetryInputs {
        let sample = self.imu.unwrap_or_default();

        TelemetryInputs {
            pitch: sample.pitch.to_degrees(),
            roll: sample.roll.to_degrees(),
            yaw: sample.yaw.to_degrees(),
            nearest_distance_mm: self.radar.nearest(),
            accel: sample.accel(),
            timestamp_ms,
        }
    }
}

/// IMU reader, radar monitor and radio link with shared sensor state
pub struct Pipeline<I: ImuBus, R: RegisterBus, T: RadioTransport> {
    imu: ImuReader<I>,
    radar: RadarMonitor<R>,
    link: RadioLink<T>,
    channel_count: usize,
    state: SensorState,
}

impl<I: ImuBus, R: RegisterBus, T: RadioTransport> Pipeline<I, R, T> {
    /// Assemble a pipeline from already constructed parts
    ///
    /// # Arguments
    ///
    /// * `imu` - Inertial sensor reader
    /// * `radar` - Radar monitor, already configured
    /// * `link` - Radio link
    /// * `channel_count` - Radar channels read after each successful cycle
    pub fn new(
        imu: ImuReader<I>,
        radar: RadarMonitor<R>,
        link: RadioLink<T>,
        channel_count: usize,
    ) -> Self {
        Self {
            imu,
            radar,
            link,
            channel_count,
            state: SensorState::new(),
        }
    }

    /// Build every part from configuration and configure the radar
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Radar` if the radar cannot be configured
    pub fn from_config(
        imu_bus: I,
        latch: DataReadyLatch,
        radar_bus: R,
        transport: T,
        session: Arc<LinkSession>,
        config: &Config,
    ) -> Result<Self> {
        let imu = ImuReader::new(imu_bus, latch, config.imu.stale_after());

        let mut radar = RadarMonitor::new(radar_bus, config.radar.max_busy_polls);
        radar.configure(config.radar.start_mm, config.radar.end_mm)?;

        let link = RadioLink::new(transport, session, config.link.ack_timeout())
            .with_max_line_len(config.link.max_line_len);

        Ok(Self::new(imu, radar, link, config.radar.channel_count))
    }

    /// Read the IMU if it signalled new data
    ///
    /// Returns `true` when a fresh valid sample was stored.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Bus` if the sensor read fails; the previous sample
    /// is kept.
    pub fn poll_imu(&mut self) -> Result<bool> {
        let sample = self.imu.poll()?;
        Ok(self.state.update_imu(sample))
    }

    /// Run one radar cycle and, on success, read the channels
    ///
    /// # Errors
    ///
    /// Returns the cycle's `RadarError`. The previous channels stay in the
    /// state on any error, including the informational recalibration.
    pub fn refresh_radar(&mut self) -> RadarResult<()> {
        let outcome = self
            .radar
            .refresh()
            .and_then(|()| self.radar.read_channels(self.channel_count));

        match outcome {
            Ok(channels) => {
                debug!(
                    "Radar channels updated, nearest {:?} mm [{}]",
                    channels.nearest(),
                    channels.to_log_fields()
                );
                self.state.update_radar(channels);
                Ok(())
            }
            Err(e) if e.is_informational() => {
                info!("Radar cycle skipped: {}", e);
                Err(e)
            }
            Err(e) => {
                warn!("Radar cycle failed: {}", e);
                Err(e)
            }
        }
    }

    /// Send the current state as one telemetry record
    ///
    /// # Errors
    ///
    /// Returns the `LinkError` of the attempt; the sequence number is
    /// consumed regardless.
    pub async fn transmit(&mut self, timestamp_ms: u64) -> std::result::Result<Ack, LinkError> {
        let inputs = self.state.to_inputs(timestamp_ms);
        self.link.send(&inputs).await
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn radar(&self) -> &RadarMonitor<R> {
        &self.radar
    }

    pub fn link(&self) -> &RadioLink<T> {
        &self.link
    }
}
