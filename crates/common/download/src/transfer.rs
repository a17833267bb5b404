use std::path::Path;

use async_trait::async_trait;

use crate::error::DownloadError;

/// State of one transfer attempt as reported by its facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Connecting,
    Transferring,
    Transferred,
    Error,
    Unknown,
}

impl TransferState {
    /// A pending transfer is still worth polling.
    pub fn is_pending(self) -> bool {
        matches!(self, TransferState::Connecting | TransferState::Transferring)
    }
}

/// Progress snapshot of a transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    pub state: TransferState,
    pub bytes_transferred: u64,
    pub bytes_total: u64,
    /// Detail of the underlying failure, when the facility has one.
    pub error: Option<String>,
}

impl TransferProgress {
    pub fn connecting() -> Self {
        TransferProgress {
            state: TransferState::Connecting,
            bytes_transferred: 0,
            bytes_total: 0,
            error: None,
        }
    }

    /// Percent complete, rounded to two decimal places.
    ///
    /// An unknown total (zero bytes) reads as 0% rather than a division
    /// fault.
    pub fn percent_complete(&self) -> f64 {
        if self.bytes_total == 0 {
            0.0
        } else {
            (self.bytes_transferred as f64 / self.bytes_total as f64 * 10_000.0).round() / 100.0
        }
    }
}

/// One transfer attempt running on a facility worker.
#[async_trait]
pub trait Transfer: Send {
    /// Snapshot of the attempt's current state and byte counts.
    fn progress(&self) -> TransferProgress;

    /// Finalize a transfer that reported [`TransferState::Transferred`],
    /// committing the received bytes to the destination path.
    async fn complete(self: Box<Self>) -> Result<(), DownloadError>;
}

/// The platform service performing the actual asynchronous byte transfer.
#[async_trait]
pub trait TransferFacility: Send + Sync {
    /// Start transferring `url` towards `destination`.
    ///
    /// Starting never fails: connection and request errors surface through
    /// the transfer's [`TransferState::Error`] state so that every failure
    /// mode takes the same retry path.
    async fn start(&self, url: &str, destination: &Path) -> Box<dyn Transfer>;
}
