//! # Telemetry Line Parser
//!
//! Ground-side counterpart of [`record`](super::record): parses received
//! telemetry lines and detects lost packets from sequence gaps.

use super::record::SEQUENCE_MODULUS;
use crate::error::{RelayError, Result};

/// Field keys in wire order
const FIELD_KEYS: [&str; 9] = ["SEQ", "P", "R", "Y", "D", "AX", "AY", "AZ", "T"];

/// A parsed telemetry line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryLine {
    pub sequence: u16,
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    /// Nearest distance in mm, `None` when the sender saw no detection
    pub distance_mm: Option<f32>,
    pub accel: [f32; 3],
    pub timestamp_ms: u64,
}

/// Parse one telemetry line
///
/// Leading/trailing whitespace and a trailing CR/LF are ignored.
///
/// # Errors
///
/// Returns `RelayError::Protocol` if a field is missing, out of order or
/// not a number, or the sequence exceeds 12 bits.
///
/// # Examples
///
/// ```
/// use tracker_relay::link::wire::parse_line;
///
/// let line = parse_line("SEQ:00A,P:  1.50,R: -0.25,Y:  3.14,D:   inf,AX:  0.01,AY: -0.98,AZ:  9.81,T:123456")?;
/// assert_eq!(line.sequence, 10);
/// assert_eq!(line.distance_mm, None);
/// # Ok::<(), tracker_relay::error::RelayError>(())
/// ```
pub fn parse_line(line: &str) -> Result<TelemetryLine> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != FIELD_KEYS.len() {
        return Err(RelayError::Protocol(format!(
            "Expected {} fields, got {}",
            FIELD_KEYS.len(),
            fields.len()
        )));
    }

    let mut values = [""; 9];
    for (i, (field, key)) in fields.iter().zip(FIELD_KEYS.iter()).enumerate() {
        let (found, value) = field
            .split_once(':')
            .ok_or_else(|| RelayError::Protocol(format!("Field {} has no key: {:?}", i, field)))?;
        if found != *key {
            return Err(RelayError::Protocol(format!(
                "Expected key {} at field {}, got {}",
                key, i, found
            )));
        }
        values[i] = value.trim();
    }

    let sequence = u16::from_str_radix(values[0], 16)
        .map_err(|e| RelayError::Protocol(format!("Bad sequence {:?}: {}", values[0], e)))?;
    if sequence >= SEQUENCE_MODULUS {
        return Err(RelayError::Protocol(format!(
            "Sequence {:#x} exceeds 12 bits",
            sequence
        )));
    }

    let distance = parse_float("D", values[4])?;

    Ok(TelemetryLine {
        sequence,
        pitch: parse_float("P", values[1])?,
        roll: parse_float("R", values[2])?,
        yaw: parse_float("Y", values[3])?,
        distance_mm: if distance.is_finite() { Some(distance) } else { None },
        accel: [
            parse_float("AX", values[5])?,
            parse_float("AY", values[6])?,
            parse_float("AZ", values[7])?,
        ],
        timestamp_ms: values[8]
            .parse()
            .map_err(|e| RelayError::Protocol(format!("Bad timestamp {:?}: {}", values[8], e)))?,
    })
}

fn parse_float(key: &str, value: &str) -> Result<f32> {
    value
        .parse()
        .map_err(|e| RelayError::Protocol(format!("Bad {} value {:?}: {}", key, value, e)))
}

/// How an observed sequence number relates to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceGap {
    /// First packet seen
    First,
    /// Directly follows the previous packet
    InOrder,
    /// This many packets were lost in between
    Lost(u16),
    /// Same number as the previous packet
    Duplicate,
}

/// Loss detection from the 12-bit sequence stream
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last: Option<u16>,
    received: u64,
    lost: u64,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received sequence number
    ///
    /// Gaps are computed modulo 4096, so a wrap from `FFF` to `000` is in
    /// order. A gap of more than 4095 packets cannot be distinguished from a
    /// smaller one.
    pub fn observe(&mut self, sequence: u16) -> SequenceGap {
        let sequence = sequence % SEQUENCE_MODULUS;
        let gap = match self.last {
            None => SequenceGap::First,
            Some(last) => {
                let delta = (sequence + SEQUENCE_MODULUS - last) % SEQUENCE_MODULUS;
                match delta {
                    0 => SequenceGap::Duplicate,
                    1 => SequenceGap::InOrder,
                    n => SequenceGap::Lost(n - 1),
                }
            }
        };

        if gap != SequenceGap::Duplicate {
            self.received += 1;
        }
        if let SequenceGap::Lost(n) = gap {
            self.lost += n as u64;
        }
        self.last = Some(sequence);
        gap
    }

    /// Packets received, duplicates excluded
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Packets inferred lost from gaps
    pub fn lost(&self) -> u64 {
        self.lost
    }

    /// Fraction of packets lost so far (0.0 when nothing was expected)
    pub fn loss_ratio(&self) -> f64 {
        let expected = self.received + self.lost;
        if expected == 0 {
            0.0
        } else {
            self.lost as f64 / expected as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::record::{TelemetryInputs, TelemetryRecord, MAX_LINE_LEN};

    #[test]
    fn test_parse_rendered_line() {
        let inputs = TelemetryInputs {
            pitch: -12.34,
            roll: 0.5,
            yaw: 359.99,
            nearest_distance_mm: Some(812),
            accel: [0.02, -0.01, 1.0],
            timestamp_ms: 987_654_321,
        };
        let line = TelemetryRecord::new(0xABC, inputs).render(MAX_LINE_LEN).unwrap();
        let parsed = parse_line(std::str::from_utf8(&line).unwrap()).unwrap();

        assert_eq!(parsed.sequence, 0xABC);
        assert!((parsed.pitch - -12.34).abs() < 0.005);
        assert!((parsed.yaw - 359.99).abs() < 0.005);
        assert_eq!(parsed.distance_mm, Some(812.0));
        assert_eq!(parsed.accel, [0.02, -0.01, 1.0]);
        assert_eq!(parsed.timestamp_ms, 987_654_321);
    }

    #[test]
    fn test_parse_accepts_trailing_newline() {
        let line = "SEQ:001,P:  0.00,R:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,AZ:  1.00,T:5\r\n";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.sequence, 1);
        assert_eq!(parsed.distance_mm, None);
        assert_eq!(parsed.timestamp_ms, 5);
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let line = "SEQ:001,P:  0.00,R:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,T:5";
        assert!(matches!(parse_line(line), Err(RelayError::Protocol(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_order() {
        let line = "SEQ:001,R:  0.00,P:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,AZ:  1.00,T:5";
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        let bad_seq = "SEQ:XYZ,P:  0.00,R:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,AZ:  1.00,T:5";
        assert!(parse_line(bad_seq).is_err());

        let wide_seq = "SEQ:1000,P:  0.00,R:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,AZ:  1.00,T:5";
        assert!(parse_line(wide_seq).is_err());

        let bad_float = "SEQ:001,P:  abc,R:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,AZ:  1.00,T:5";
        assert!(parse_line(bad_float).is_err());

        let negative_ts = "SEQ:001,P:  0.00,R:  0.00,Y:  0.00,D:   inf,AX:  0.00,AY:  0.00,AZ:  1.00,T:-5";
        assert!(parse_line(negative_ts).is_err());
    }

    #[test]
    fn test_tracker_in_order_and_wrap() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.observe(0xFFE), SequenceGap::First);
        assert_eq!(tracker.observe(0xFFF), SequenceGap::InOrder);
        assert_eq!(tracker.observe(0x000), SequenceGap::InOrder);
        assert_eq!(tracker.lost(), 0);
        assert_eq!(tracker.received(), 3);
    }

    #[test]
    fn test_tracker_detects_loss_across_wrap() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(0xFFD);
        assert_eq!(tracker.observe(0x002), SequenceGap::Lost(4));
        assert_eq!(tracker.lost(), 4);
        assert!((tracker.loss_ratio() - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_tracker_duplicate() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(7);
        assert_eq!(tracker.observe(7), SequenceGap::Duplicate);
        assert_eq!(tracker.received(), 1);
        assert_eq!(tracker.loss_ratio(), 0.0);
    }
}
