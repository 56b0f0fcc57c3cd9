//! # Radio Link
//!
//! Sends telemetry records and waits for an acknowledgment.
//!
//! Any inbound packet inside the ack window counts as the acknowledgment;
//! its content is not inspected. There is no retry here: the caller decides
//! whether to send again on the next cycle. The sequence number advances on
//! every attempt, successful or not.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::record::{TelemetryInputs, TelemetryRecord, MAX_LINE_LEN};
use super::session::LinkSession;
use crate::error::LinkError;

/// Default time to wait for an acknowledgment
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(500);

/// Receive buffer size, large enough for any telemetry line
pub const RX_BUFFER_LEN: usize = MAX_LINE_LEN;

/// Metadata for one received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inbound {
    /// Bytes written into the receive buffer
    pub len: usize,

    /// Received signal strength in dBm, if the transport reports it
    pub rssi: Option<i16>,
}

/// Radio transport capability
#[async_trait]
pub trait RadioTransport: Send {
    /// Transmit one opaque packet
    async fn transmit(&mut self, packet: &[u8]) -> io::Result<()>;

    /// Wait for the next inbound packet and copy it into `buf`
    ///
    /// Implementations may block indefinitely; the link bounds the wait.
    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<Inbound>;
}

/// Delivery confirmation for one telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Sequence number of the acknowledged record
    pub sequence: u16,

    /// RSSI of the acknowledgment in dBm
    pub rssi: Option<i16>,

    /// Length of the acknowledgment packet
    pub len: usize,
}

/// Sequenced, acknowledged telemetry sender
pub struct RadioLink<T: RadioTransport> {
    transport: T,
    session: Arc<LinkSession>,
    ack_timeout: Duration,
    max_line_len: usize,
}

impl<T: RadioTransport> RadioLink<T> {
    /// Create a link over `transport`
    ///
    /// # Arguments
    ///
    /// * `transport` - Radio transport
    /// * `session` - Session sequence counter, shared if several links exist
    /// * `ack_timeout` - How long to wait for an acknowledgment
    pub fn new(transport: T, session: Arc<LinkSession>, ack_timeout: Duration) -> Self {
        Self {
            transport,
            session,
            ack_timeout,
            max_line_len: MAX_LINE_LEN,
        }
    }

    /// Override the line length ceiling (defaults to [`MAX_LINE_LEN`])
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Send one telemetry record and wait for the acknowledgment
    ///
    /// # Arguments
    ///
    /// * `inputs` - Latest decoded state to transmit
    ///
    /// # Returns
    ///
    /// * `Result<Ack, LinkError>` - Acknowledgment, or the reason delivery was not confirmed
    ///
    /// # Errors
    ///
    /// - `BufferOverflow`: the rendered line exceeds the ceiling (nothing sent)
    /// - `TransmitFailed`: the transport rejected the packet
    /// - `NoAck`: nothing arrived within the ack timeout
    /// - `ReceiveFailed`: the transport failed while waiting
    pub async fn send(&mut self, inputs: &TelemetryInputs) -> Result<Ack, LinkError> {
        let sequence = self.session.next();
        let record = TelemetryRecord::new(sequence, *inputs);

        let packet = record.render(self.max_line_len).map_err(|e| {
            warn!("Telemetry {:03X} not sent: {}", sequence, e);
            e
        })?;

        self.transport
            .transmit(&packet)
            .await
            .map_err(|e| {
                warn!("Telemetry {:03X} transmit failed: {}", sequence, e);
                LinkError::TransmitFailed(e)
            })?;
        debug!("Sent telemetry {:03X} ({} bytes)", sequence, packet.len());

        let mut buf = [0u8; RX_BUFFER_LEN];
        match timeout(self.ack_timeout, self.transport.receive(&mut buf)).await {
            Ok(Ok(inbound)) => {
                info!(
                    "Ack for {:03X} ({} bytes, RSSI: {:?})",
                    sequence, inbound.len, inbound.rssi
                );
                Ok(Ack {
                    sequence,
                    rssi: inbound.rssi,
                    len: inbound.len,
                })
            }
            Ok(Err(e)) => {
                warn!("Receive failed for {:03X}: {}", sequence, e);
                Err(LinkError::ReceiveFailed(e))
            }
            Err(_) => {
                warn!("No reply for {:03X} within {:?}", sequence, self.ack_timeout);
                Err(LinkError::NoAck {
                    timeout: self.ack_timeout,
                })
            }
        }
    }

    /// Session counter used by this link
    pub fn session(&self) -> &Arc<LinkSession> {
        &self.session
    }

    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// How the mock radio answers a receive call
    #[derive(Debug, Clone, Copy)]
    pub enum Reply {
        /// Deliver a packet of this length with this RSSI
        Packet { len: usize, rssi: Option<i16> },
        /// Never deliver anything
        Silent,
        /// Fail the receive call
        Fail(io::ErrorKind),
    }

    /// Mock radio for testing
    #[derive(Clone)]
    pub struct MockRadio {
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
        pub reply: Arc<Mutex<Reply>>,
        pub transmit_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MockRadio {
        pub fn new(reply: Reply) -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                reply: Arc::new(Mutex::new(reply)),
                transmit_error: Arc::new(Mutex::new(None)),
            }
        }

        pub fn get_sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }

        pub fn set_reply(&self, reply: Reply) {
            *self.reply.lock().unwrap() = reply;
        }

        pub fn set_transmit_error(&self, error: Option<io::ErrorKind>) {
            *self.transmit_error.lock().unwrap() = error;
        }
    }

    #[async_trait]
    impl RadioTransport for MockRadio {
        async fn transmit(&mut self, packet: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.transmit_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock transmit error"));
            }
            self.sent.lock().unwrap().push(packet.to_vec());
            Ok(())
        }

        async fn receive(&mut self, buf: &mut [u8]) -> io::Result<Inbound> {
            let reply = *self.reply.lock().unwrap();
            match reply {
                Reply::Packet { len, rssi } => {
                    let len = len.min(buf.len());
                    buf[..len].fill(b'A');
                    Ok(Inbound { len, rssi })
                }
                Reply::Silent => std::future::pending().await,
                Reply::Fail(kind) => Err(io::Error::new(kind, "Mock receive error")),
            }
        }
    }
}
