//! Background refresh of the published sheet.
//!
//! One worker thread fetches right away and then once per interval. Each
//! successful fetch is parsed and sent as a complete batch; failures are
//! logged and the previous batch stays on screen.

use crate::loader::parse;
use crate::model::Record;
use reqwest::blocking::Client;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sheet returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

pub trait SheetSource: Send + 'static {
    fn fetch(&self) -> Result<String, FetchError>;
}

pub struct HttpSheetSource {
    client: Client,
    url: String,
}

impl HttpSheetSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(format!("weapons-sheet/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, url: url.into() })
    }
}

impl SheetSource for HttpSheetSource {
    fn fetch(&self) -> Result<String, FetchError> {
        let resp = self.client.get(&self.url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(resp.text()?)
    }
}

/// Handle to the refresh thread. Dropping it stops the schedule without
/// waiting for an in-flight request.
pub struct RefreshTask {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    pub fn start<S, F>(source: S, interval: Duration, updates: Sender<Vec<Record>>, notify: F) -> Self
    where
        S: SheetSource,
        F: Fn() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            info!(interval_secs = interval.as_secs(), "sheet refresh started");
            loop {
                match source.fetch() {
                    Ok(text) => {
                        let records = parse(&text);
                        debug!(rows = records.len(), "fetched sheet");
                        if updates.send(records).is_err() {
                            break;
                        }
                        notify();
                    }
                    Err(e) => warn!("error fetching sheet: {e}"),
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
            info!("sheet refresh stopped");
        });

        Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stop the schedule and wait for the worker to exit.
    pub fn shutdown(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sheet refresh thread panicked");
            }
        }
    }

    fn signal_stop(&mut self) {
        // dropping the sender wakes the worker with Disconnected
        self.stop.take();
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
