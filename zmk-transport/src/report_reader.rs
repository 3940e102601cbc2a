//! Input report reader
//!
//! Each open device gets a dedicated OS thread that polls `read_timeout` and
//! broadcasts every input report to subscribers. The thread exits when the
//! shutdown flag is set, which happens when the owning device is dropped, or
//! when reads keep failing because the device went away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hidapi::HidDevice;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::protocol::INPUT_BUFFER_SIZE;
use crate::types::InputReport;

/// Broadcast channel capacity for input reports
const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Split a raw read into report ID and payload.
///
/// With numbered reports hidapi places the report ID in byte 0. Without them
/// the whole buffer is payload and the report ID is 0.
pub fn parse_input_report(raw: &[u8], numbered_reports: bool, timestamp: f64) -> InputReport {
    match raw.split_first() {
        Some((&report_id, payload)) if numbered_reports => InputReport {
            report_id,
            data: payload.to_vec(),
            timestamp,
        },
        _ => InputReport {
            report_id: 0,
            data: raw.to_vec(),
            timestamp,
        },
    }
}

/// Configuration for the reader loop
#[derive(Clone)]
pub struct ReportReaderConfig {
    /// Read timeout in milliseconds (how often the shutdown flag is checked when idle)
    pub read_timeout_ms: i32,
    /// Sleep duration on error before retrying
    pub error_sleep_ms: u64,
    /// Consecutive read errors after which the device counts as gone
    pub max_read_errors: u32,
    /// Whether byte 0 of each read is a report ID
    pub numbered_reports: bool,
}

impl Default for ReportReaderConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 5,
            error_sleep_ms: 100,
            max_read_errors: 3,
            numbered_reports: true,
        }
    }
}

/// Owns the reader thread and hands out subscriptions to its reports.
///
/// The reader thread holds the only sender, so subscribers see `Closed`
/// once it exits.
pub struct ReportSubsystem {
    reports: broadcast::Receiver<InputReport>,
    shutdown: Arc<AtomicBool>,
}

impl ReportSubsystem {
    /// Spawn the reader thread for `device`
    pub fn spawn(
        device: Arc<Mutex<HidDevice>>,
        name: String,
        config: ReportReaderConfig,
    ) -> Result<Self, TransportError> {
        let (report_tx, reports) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = shutdown.clone();
        let read_timeout = config.read_timeout_ms;
        std::thread::Builder::new()
            .name("hid-report-reader".into())
            .spawn(move || {
                run_report_reader_loop(
                    |buf| Ok(device.lock().read_timeout(buf, read_timeout)?),
                    report_tx,
                    flag,
                    &name,
                    config,
                )
            })
            .map_err(|e| TransportError::Internal(format!("spawn report reader: {e}")))?;

        Ok(Self { reports, shutdown })
    }

    /// Subscribe to input reports
    pub fn subscribe(&self) -> broadcast::Receiver<InputReport> {
        self.reports.resubscribe()
    }

    /// Ask the reader thread to exit
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for ReportSubsystem {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reader loop body.
///
/// Runs until `shutdown` is set or `max_read_errors` reads in a row fail.
/// `read` fills the buffer and returns the byte count, 0 on timeout.
pub fn run_report_reader_loop<F>(
    mut read: F,
    tx: broadcast::Sender<InputReport>,
    shutdown: Arc<AtomicBool>,
    name: &str,
    config: ReportReaderConfig,
) where
    F: FnMut(&mut [u8]) -> Result<usize, TransportError>,
{
    debug!("{} report reader thread started", name);
    let mut buf = [0u8; INPUT_BUFFER_SIZE];
    let start_time = Instant::now();
    let mut errors = 0u32;

    while !shutdown.load(Ordering::Relaxed) {
        // Short timeout: the lock is released between polls so writers get a turn
        match read(&mut buf) {
            Ok(len) if len > 0 => {
                errors = 0;
                let timestamp = start_time.elapsed().as_secs_f64();
                debug!(
                    "{} report reader got {} bytes at {:.3}s: {:02X?}",
                    name,
                    len,
                    timestamp,
                    &buf[..len.min(16)]
                );
                let report = parse_input_report(&buf[..len], config.numbered_reports, timestamp);
                // No receivers is fine
                let _ = tx.send(report);
            }
            Ok(_) => errors = 0,
            Err(e) => {
                errors += 1;
                if errors >= config.max_read_errors {
                    warn!(
                        "{} report reader giving up after {} errors, last: {}",
                        name, errors, e
                    );
                    break;
                }
                warn!("{} report reader error: {}", name, e);
                std::thread::sleep(Duration::from_millis(config.error_sleep_ms));
            }
        }
    }

    debug!("{} report reader thread exiting", name);
}
