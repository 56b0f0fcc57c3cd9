//! # Tracker Relay
//!
//! Ground station for the tracker telemetry link.
//!
//! Receives telemetry lines from the airborne radio through a serial-attached
//! radio modem, acknowledges each one, tracks lost packets from the sequence
//! numbers and logs every packet to rotating JSONL files.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tracker_relay::config::Config;
use tracker_relay::link::radio::{RadioTransport, RX_BUFFER_LEN};
use tracker_relay::link::wire::{parse_line, SequenceGap, SequenceTracker};
use tracker_relay::serial::SerialRadio;
use tracker_relay::telemetry::{LinkLogEntry, LinkOutcome, TelemetryLogger};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of received packets between link statistics log messages
const STATS_INTERVAL_PACKETS: u64 = 100;

/// Application log file name inside the telemetry log directory
const APP_LOG_FILE: &str = "tracker-relay.log";

/// Main entry point for the ground station
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, else `config/default.toml`, else defaults)
///    - Set up logging to stderr and, with telemetry enabled, a daily log file
///    - Open the radio modem serial port
///
/// 2. **Main Loop**
///    - Wait for a telemetry line
///    - Parse it and check its sequence number for gaps
///    - Reply `ACK:<seq>` so the sender's link confirms delivery
///    - Append the outcome to the JSONL link log
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid, the modem cannot be
/// opened or the link log directory cannot be created.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    let _log_guard = init_logging(&config);

    info!("Tracker Relay v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut radio = SerialRadio::open_with_paths(&[config.radio.port.as_str()], config.radio.baud_rate)
        .context("Failed to open radio modem")?;
    info!(
        "Radio modem opened at {} ({} baud)",
        radio.device_path(),
        config.radio.baud_rate
    );

    let mut logger = if config.telemetry.enabled {
        let logger = TelemetryLogger::from_config(&config.telemetry)
            .context("Failed to create link log")?;
        info!("Logging link packets to {}", logger.log_dir().display());
        Some(logger)
    } else {
        None
    };

    let mut tracker = SequenceTracker::new();
    let mut last_stats_at = 0u64;
    let mut buf = [0u8; RX_BUFFER_LEN];

    info!("Waiting for telemetry");
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            received = radio.receive(&mut buf) => {
                let inbound = match received {
                    Ok(inbound) => inbound,
                    Err(e) if is_recoverable(&e) => {
                        warn!("Dropped bad packet: {}", e);
                        continue;
                    }
                    Err(e) => {
                        warn!("Radio modem lost: {}", e);
                        break;
                    }
                };

                let text = String::from_utf8_lossy(&buf[..inbound.len]).into_owned();
                let entry = classify_packet(&mut tracker, &text, inbound.rssi);

                if let Some(sequence) = entry.sequence {
                    let ack = ack_packet(sequence);
                    match timeout(config.radio.timeout(), radio.transmit(ack.as_bytes())).await {
                        Ok(Ok(())) => debug!("Sent {}", ack),
                        Ok(Err(e)) => warn!("Failed to send {}: {}", ack, e),
                        Err(_) => warn!("Timed out sending {}", ack),
                    }
                }

                if let Some(logger) = logger.as_mut() {
                    if let Err(e) = logger.log(&entry) {
                        warn!("Failed to log packet: {}", e);
                    }
                }

                if stats_due(tracker.received(), last_stats_at) {
                    last_stats_at = tracker.received();
                    info!(
                        "Received {} packets, {} lost ({:.1}% loss)",
                        tracker.received(),
                        tracker.lost(),
                        tracker.loss_ratio() * 100.0
                    );
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!(
        "Total packets received: {}, lost: {}",
        tracker.received(),
        tracker.lost()
    );

    Ok(())
}

/// Load configuration from `path`, the default path, or built-in defaults
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Install the tracing subscriber
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the program.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = if config.telemetry.enabled {
        let appender = tracing_appender::rolling::daily(&config.telemetry.log_dir, APP_LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Whether the receive loop can continue after `e`
///
/// Only a bad packet is recoverable; the framer reports those as
/// `InvalidData`. Anything else (port closed, EIO after unplugging) ends the
/// session.
fn is_recoverable(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::InvalidData
}

/// Whether link statistics should be logged for `received` packets
fn stats_due(received: u64, last_reported: u64) -> bool {
    received != last_reported && received % STATS_INTERVAL_PACKETS == 0
}

/// Acknowledgment reply for `sequence`
fn ack_packet(sequence: u16) -> String {
    format!("ACK:{:03X}", sequence)
}

/// Parse one received line and record its sequence outcome
fn classify_packet(tracker: &mut SequenceTracker, text: &str, rssi: Option<i16>) -> LinkLogEntry {
    match parse_line(text) {
        Ok(line) => {
            let gap = tracker.observe(line.sequence);
            match gap {
                SequenceGap::Lost(n) => warn!("Lost {} packet(s) before {:03X}", n, line.sequence),
                SequenceGap::Duplicate => debug!("Duplicate packet {:03X}", line.sequence),
                _ => debug!("Packet {:03X} in order", line.sequence),
            }
            LinkLogEntry::new(Some(line.sequence), gap.into(), rssi, text)
        }
        Err(e) => {
            warn!("Malformed telemetry line: {}", e);
            LinkLogEntry::new(None, LinkOutcome::Malformed, rssi, text)
        }
    }
}
