//! # IMU Frame Constants and Types
//!
//! Layout of the raw inertial-sensor frame and the decoded sample.

/// Total frame length produced by one bus transaction
pub const IMU_FRAME_LEN: usize = 26;

/// Junk/header bytes at the start of every frame
pub const IMU_FRAME_HEADER_LEN: usize = 2;

/// Number of big-endian 16-bit words following the header
pub const IMU_WORD_COUNT: usize = 12;

/// Register/request command clocked out before the frame (0x3D, 0x00)
pub const IMU_READ_COMMAND: [u8; 2] = [0x3D, 0x00];

/// Angular rate scale (LSB per deg/s)
pub const RATE_DIVISOR: f32 = 64.0;

/// Acceleration scale (LSB per g)
pub const ACCEL_DIVISOR: f32 = 4000.0;

/// Temperature scale (degC per LSB)
pub const TEMP_SCALE: f32 = 0.073111172849435;

/// Temperature offset (degC)
pub const TEMP_OFFSET: f32 = 31.0;

/// Angle scale (radians per LSB): a full turn spans the 16-bit range
pub const ANGLE_SCALE: f32 = 2.0 * std::f32::consts::PI / 65536.0;

/// Raw frame as read from the sensor bus
pub type RawImuFrame = [u8; IMU_FRAME_LEN];

/// Decoded inertial measurement
///
/// When `valid` is false every other field is meaningless and must not be
/// consumed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuSample {
    /// Angular rate around X in deg/s
    pub x_rate: f32,

    /// Angular rate around Y in deg/s
    pub y_rate: f32,

    /// Angular rate around Z in deg/s
    pub z_rate: f32,

    /// Linear acceleration along X in g
    pub x_accel: f32,

    /// Linear acceleration along Y in g
    pub y_accel: f32,

    /// Linear acceleration along Z in g
    pub z_accel: f32,

    /// Sensor die temperature in degC
    pub temperature: f32,

    /// Roll in radians
    pub roll: f32,

    /// Pitch in radians
    pub pitch: f32,

    /// Yaw in radians
    pub yaw: f32,

    /// Whether this sample carries fresh data
    pub valid: bool,
}

impl ImuSample {
    /// A sample marking "no new data"
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Acceleration vector `[x, y, z]` in g
    pub fn accel(&self) -> [f32; 3] {
        [self.x_accel, self.y_accel, self.z_accel]
    }
}
