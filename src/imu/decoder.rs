//! # IMU Frame Decoder
//!
//! Decodes raw inertial-sensor frames into physical units.

use super::frame::*;

/// Decode a raw frame into an [`ImuSample`]
///
/// # Arguments
///
/// * `raw` - Complete 26-byte frame (2 header bytes + 12 big-endian words)
/// * `ready` - Whether the data-ready latch was set for this frame
///
/// # Returns
///
/// * `ImuSample` - Decoded sample, or an invalid sample when `ready` is false
///
/// # Word Layout
///
/// ```text
/// v[0..3]   angular rate x,y,z   / 64.0
/// v[3..6]   acceleration x,y,z   / 4000.0
/// v[6]      temperature          * 0.0731 + 31.0
/// v[7..10]  roll, pitch, yaw     * 2π / 65536
/// v[10..12] reserved
/// ```
///
/// # Examples
///
/// ```
/// use tracker_relay::imu::decoder::decode;
/// use tracker_relay::imu::frame::IMU_FRAME_LEN;
///
/// let sample = decode(&[0u8; IMU_FRAME_LEN], false);
/// assert!(!sample.valid);
/// ```
pub fn decode(raw: &RawImuFrame, ready: bool) -> ImuSample {
    if !ready {
        return ImuSample::invalid();
    }

    let v = words(raw);

    ImuSample {
        x_rate: v[0] as f32 / RATE_DIVISOR,
        y_rate: v[1] as f32 / RATE_DIVISOR,
        z_rate: v[2] as f32 / RATE_DIVISOR,
        x_accel: v[3] as f32 / ACCEL_DIVISOR,
        y_accel: v[4] as f32 / ACCEL_DIVISOR,
        z_accel: v[5] as f32 / ACCEL_DIVISOR,
        temperature: v[6] as f32 * TEMP_SCALE + TEMP_OFFSET,
        roll: v[7] as f32 * ANGLE_SCALE,
        pitch: v[8] as f32 * ANGLE_SCALE,
        yaw: v[9] as f32 * ANGLE_SCALE,
        valid: true,
    }
}

/// Split the frame body into its twelve signed words
fn words(raw: &RawImuFrame) -> [i16; IMU_WORD_COUNT] {
    let mut v = [0i16; IMU_WORD_COUNT];
    let body = &raw[IMU_FRAME_HEADER_LEN..];

    for (word, bytes) in v.iter_mut().zip(body.chunks_exact(2)) {
        *word = i16::from_be_bytes([bytes[0], bytes[1]]);
    }

    v
}
