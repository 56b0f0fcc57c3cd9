//! Rotating JSONL writer for link log entries.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::link::wire::SequenceGap;

/// Log file name prefix
const FILE_PREFIX: &str = "link_";

/// Log file extension
const FILE_EXTENSION: &str = "jsonl";

/// What happened to one received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Parsed and in sequence (or the first packet of the session)
    InOrder,
    /// Parsed, after this many lost packets
    Lost(u16),
    /// Parsed, repeats the previous sequence number
    Duplicate,
    /// Could not be parsed
    Malformed,
}

impl From<SequenceGap> for LinkOutcome {
    fn from(gap: SequenceGap) -> Self {
        match gap {
            SequenceGap::First | SequenceGap::InOrder => LinkOutcome::InOrder,
            SequenceGap::Lost(n) => LinkOutcome::Lost(n),
            SequenceGap::Duplicate => LinkOutcome::Duplicate,
        }
    }
}

/// One JSONL record
#[derive(Debug, Clone, Serialize)]
pub struct LinkLogEntry {
    pub logged_at: DateTime<Utc>,
    pub sequence: Option<u16>,
    pub outcome: LinkOutcome,
    pub rssi: Option<i16>,
    pub line: String,
}

impl LinkLogEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        sequence: Option<u16>,
        outcome: LinkOutcome,
        rssi: Option<i16>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            logged_at: Utc::now(),
            sequence,
            outcome,
            rssi,
            line: line.into(),
        }
    }
}

/// JSONL link logger with size-based rotation
pub struct TelemetryLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_opened: u32,
}

impl std::fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("log_dir", &self.log_dir)
            .field("current_path", &self.current_path)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl TelemetryLogger {
    /// Create a logger writing into `log_dir`
    ///
    /// The directory is created if missing. No file is opened until the
    /// first record is written.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(
        log_dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)?;

        Ok(Self {
            log_dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    /// Create a logger from the `[telemetry]` section
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(
            &config.log_dir,
            config.max_records_per_file,
            config.max_files_to_keep,
        )
    }

    /// Append one entry, rotating first if the current file is full
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written, or the entry
    /// cannot be serialized
    pub fn log(&mut self, entry: &LinkLogEntry) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, entry)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    /// Path of the file currently being written
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn records_in_file(&self) -> usize {
        self.records_in_file
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        self.files_opened += 1;
        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.log_dir.join(name);

        let file = File::create(&path)?;
        info!("Opened link log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| is_log_file(path))
            .collect();

        if logs.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names embed the open time, so lexical order is age order
        logs.sort();
        let excess = logs.len() - self.max_files_to_keep;
        for path in &logs[..excess] {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed old link log {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        Ok(())
    }
}

fn is_log_file(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with(FILE_PREFIX))
        .unwrap_or(false);
    let ext_matches = path
        .extension()
        .map(|ext| ext == FILE_EXTENSION)
        .unwrap_or(false);
    name_matches && ext_matches
}
