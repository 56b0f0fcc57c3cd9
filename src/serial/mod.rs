//! # Serial Radio Module
//!
//! Radio transport over a serial-attached long-range radio modem.
//!
//! This module handles:
//! - Opening the modem's serial port (8N1)
//! - Newline-framed packet transmission
//! - Reassembling newline-terminated inbound packets from the byte stream
//!
//! The modem does not report per-packet signal strength, so inbound packets
//! carry no RSSI.

pub mod port_trait;

use std::io;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::link::radio::{Inbound, RadioTransport};
use port_trait::{SerialPortIO, TokioSerialPort};

/// Default modem baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Packet terminator on the serial stream
pub const PACKET_TERMINATOR: u8 = b'\n';

/// Bytes buffered without a terminator before the stream is considered garbage
const MAX_PENDING_BYTES: usize = 1024;

/// Default modem device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common for radio modems)
    "/dev/ttyACM0", // USB CDC devices
];

/// Serial radio modem handler
pub struct SerialRadio<P: SerialPortIO = TokioSerialPort> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    /// Received bytes not yet returned as a packet
    pending: BytesMut,
}

impl<P: SerialPortIO> std::fmt::Debug for SerialRadio<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRadio")
            .field("device_path", &self.device_path)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl SerialRadio<TokioSerialPort> {
    /// Open connection to the radio modem
    ///
    /// Auto-detects the device by trying common paths.
    ///
    /// # Errors
    ///
    /// Returns error if no modem found or connection fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tracker_relay::serial::{SerialRadio, DEFAULT_BAUD_RATE};
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let radio = SerialRadio::open(DEFAULT_BAUD_RATE)?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open(baud_rate: u32) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open connection to the radio modem with custom device paths
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Modem baud rate
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened radio modem at {}", path);
                    return Ok(Self::new(TokioSerialPort::new(port), *path));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(RelayError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| RelayError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> SerialRadio<P> {
    /// Wrap an already opened port
    pub fn new(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
            pending: BytesMut::with_capacity(MAX_PENDING_BYTES),
        }
    }

    /// Send one packet followed by the terminator
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Serial` if the write or flush fails
    pub async fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.write_packet(packet)
            .await
            .map_err(|e| RelayError::Serial(format!("Failed to write packet: {}", e)))
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    async fn write_packet(&mut self, packet: &[u8]) -> io::Result<()> {
        let mut framed = BytesMut::with_capacity(packet.len() + 1);
        framed.extend_from_slice(packet);
        framed.extend_from_slice(&[PACKET_TERMINATOR]);

        self.port.write_all(&framed).await?;
        self.port.flush().await?;

        debug!("Sent radio packet ({} bytes)", packet.len());
        Ok(())
    }

    /// Wait for the next non-empty newline-terminated packet
    ///
    /// The terminator and a preceding CR are stripped.
    ///
    /// # Errors
    ///
    /// - `UnexpectedEof`: the port closed
    /// - `InvalidData`: the packet does not fit `buf`, or too many bytes
    ///   arrived without a terminator
    pub async fn read_packet(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == PACKET_TERMINATOR) {
                let mut line = self.pending.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(pos - 1);
                }
                if line.is_empty() {
                    continue;
                }
                if line.len() > buf.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Packet of {} bytes exceeds {} byte buffer", line.len(), buf.len()),
                    ));
                }
                let len = line.len();
                line.copy_to_slice(&mut buf[..len]);
                return Ok(len);
            }

            if self.pending.len() >= MAX_PENDING_BYTES {
                let dropped = self.pending.len();
                self.pending.clear();
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Dropped {} bytes without packet terminator", dropped),
                ));
            }

            let mut chunk = [0u8; 64];
            let n = self.port.read(&mut chunk).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Serial port closed",
                ));
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}

#[async_trait]
impl<P: SerialPortIO> RadioTransport for SerialRadio<P> {
    async fn transmit(&mut self, packet: &[u8]) -> io::Result<()> {
        self.write_packet(packet).await
    }

    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<Inbound> {
        let len = self.read_packet(buf).await?;
        Ok(Inbound { len, rssi: None })
    }
}
