//! # Telemetry Record Framing
//!
//! Renders a telemetry record as the ASCII line sent over the radio.
//!
//! ## Line Format
//!
//! ```text
//! SEQ:00A,P:  1.50,R: -0.25,Y:  3.14,D:1250.00,AX:  0.01,AY: -0.98,AZ:  9.81,T:123456
//! ```
//!
//! - `SEQ`: 12-bit sequence number, 3 uppercase hex digits
//! - `P`, `R`, `Y`: pitch, roll, yaw in degrees
//! - `D`: nearest radar distance in mm, `inf` when nothing was detected
//! - `AX`, `AY`, `AZ`: acceleration in g
//! - `T`: timestamp in ms, unsigned decimal
//!
//! Every float is right-aligned in a 6-character field with 2 decimals.
//! Wider values grow the field rather than being cut.

use std::fmt::{self, Write};

use bytes::{Bytes, BytesMut};

use crate::error::LinkError;

/// Upper bound on a rendered line in bytes
pub const MAX_LINE_LEN: usize = 256;

/// Sequence numbers are 12 bits wide
pub const SEQUENCE_MODULUS: u16 = 0x1000;

/// Values the caller supplies for one transmission
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryInputs {
    /// Pitch in degrees
    pub pitch: f32,

    /// Roll in degrees
    pub roll: f32,

    /// Yaw in degrees
    pub yaw: f32,

    /// Nearest radar detection in mm, `None` for no detection
    pub nearest_distance_mm: Option<u32>,

    /// Acceleration `[x, y, z]` in g
    pub accel: [f32; 3],

    /// Monotonic timestamp in ms
    pub timestamp_ms: u64,
}

/// One outbound telemetry record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    /// 12-bit sequence number
    pub sequence: u16,

    pub inputs: TelemetryInputs,
}

impl TelemetryRecord {
    pub fn new(sequence: u16, inputs: TelemetryInputs) -> Self {
        Self {
            sequence: sequence % SEQUENCE_MODULUS,
            inputs,
        }
    }

    /// Distance field value; no detection renders as infinity
    fn distance_field(&self) -> f32 {
        match self.inputs.nearest_distance_mm {
            Some(mm) => mm as f32,
            None => f32::INFINITY,
        }
    }

    /// Render the record as a wire line
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum line length in bytes
    ///
    /// # Returns
    ///
    /// * `Result<Bytes, LinkError>` - The complete line (no terminator)
    ///
    /// # Errors
    ///
    /// Returns `BufferOverflow` if the line would exceed `limit`. Nothing is
    /// truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker_relay::link::record::{TelemetryInputs, TelemetryRecord, MAX_LINE_LEN};
    ///
    /// let record = TelemetryRecord::new(1, TelemetryInputs::default());
    /// let line = record.render(MAX_LINE_LEN).unwrap();
    /// assert!(line.starts_with(b"SEQ:001,P:  0.00"));
    /// ```
    pub fn render(&self, limit: usize) -> Result<Bytes, LinkError> {
        let mut w = BoundedWriter::new(limit);
        let [ax, ay, az] = self.inputs.accel;

        write!(
            w,
            "SEQ:{:03X},P:{:6.2},R:{:6.2},Y:{:6.2},D:{:6.2},AX:{:6.2},AY:{:6.2},AZ:{:6.2},T:{}",
            self.sequence,
            self.inputs.pitch,
            self.inputs.roll,
            self.inputs.yaw,
            self.distance_field(),
            ax,
            ay,
            az,
            self.inputs.timestamp_ms,
        )
        .map_err(|_| LinkError::BufferOverflow { limit })?;

        Ok(w.into_bytes())
    }
}

/// `fmt::Write` sink that refuses to grow past a fixed length
struct BoundedWriter {
    buf: BytesMut,
    limit: usize,
}

impl BoundedWriter {
    fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit),
            limit,
        }
    }

    fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl fmt::Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.buf.len() + s.len() > self.limit {
            return Err(fmt::Error);
        }
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_inputs() -> TelemetryInputs {
        TelemetryInputs {
            pitch: 1.5,
            roll: -0.25,
            yaw: 3.14159,
            nearest_distance_mm: Some(1250),
            accel: [0.01, -0.98, 9.81],
            timestamp_ms: 123_456,
        }
    }

    #[test]
    fn test_render_exact_line() {
        let line = TelemetryRecord::new(0x00A, sample_inputs())
            .render(MAX_LINE_LEN)
            .unwrap();

        assert_eq!(
            &line[..],
            b"SEQ:00A,P:  1.50,R: -0.25,Y:  3.14,D:1250.00,AX:  0.01,AY: -0.98,AZ:  9.81,T:123456"
        );
    }

    #[test]
    fn test_render_no_detection_as_inf() {
        let mut inputs = sample_inputs();
        inputs.nearest_distance_mm = None;

        let line = TelemetryRecord::new(1, inputs).render(MAX_LINE_LEN).unwrap();
        let text = std::str::from_utf8(&line).unwrap();
        assert!(text.contains(",D:   inf,"), "got: {}", text);
        assert!(!text.contains("D:  0.00"));
    }

    #[test]
    fn test_sequence_hex_is_uppercase_and_masked() {
        let line = TelemetryRecord::new(0xFFF, sample_inputs())
            .render(MAX_LINE_LEN)
            .unwrap();
        assert!(line.starts_with(b"SEQ:FFF,"));

        let record = TelemetryRecord::new(0x1001, sample_inputs());
        assert_eq!(record.sequence, 1);
    }

    #[test]
    fn test_timestamp_full_u64() {
        let mut inputs = sample_inputs();
        inputs.timestamp_ms = u64::MAX;

        let line = TelemetryRecord::new(1, inputs).render(MAX_LINE_LEN).unwrap();
        assert!(line.ends_with(b",T:18446744073709551615"));
    }

    #[test]
    fn test_oversized_line_fails_instead_of_truncating() {
        let inputs = TelemetryInputs {
            pitch: f32::MAX,
            roll: f32::MAX,
            yaw: f32::MAX,
            nearest_distance_mm: Some(u32::MAX),
            accel: [f32::MAX; 3],
            timestamp_ms: u64::MAX,
        };

        match TelemetryRecord::new(1, inputs).render(MAX_LINE_LEN) {
            Err(LinkError::BufferOverflow { limit }) => assert_eq!(limit, MAX_LINE_LEN),
            other => panic!("Expected BufferOverflow, got: {:?}", other),
        }
    }

    #[test]
    fn test_line_exactly_at_limit_is_accepted() {
        let line = TelemetryRecord::new(1, sample_inputs()).render(MAX_LINE_LEN).unwrap();
        let exact = TelemetryRecord::new(1, sample_inputs()).render(line.len()).unwrap();
        assert_eq!(line, exact);

        assert!(TelemetryRecord::new(1, sample_inputs())
            .render(line.len() - 1)
            .is_err());
    }
}
