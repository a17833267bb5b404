//! Retried, progress-reported file downloads.
//!
//! This crate downloads exactly one source URL to one destination path,
//! synchronously from the caller's perspective, with bounded retries:
//!
//! - a transfer runs asynchronously on a [`TransferFacility`] worker while
//!   the downloader polls its progress at a fixed interval, logging percent
//!   complete and elapsed time
//! - an attempt that ends in an error or an indeterminate state is retried
//!   after a fixed delay, up to a bounded attempt count
//! - each attempt writes into a draft file which is atomically renamed into
//!   the destination only when the transfer completed
//!
//! # Usage
//!
//! ```no_run
//! use download::DownloadJob;
//! use download::Downloader;
//! use download::HttpTransferFacility;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), download::DownloadError> {
//!     let job = DownloadJob::new(
//!         "https://repo.example.com/releases/app.tar.gz",
//!         "/var/opt/AppDeployment/app.tar.gz",
//!     );
//!
//!     let downloader = Downloader::new(HttpTransferFacility::default());
//!     downloader.download(&job).await?;
//!
//!     Ok(())
//! }
//! ```

mod download;
mod error;
mod http;
mod transfer;

pub use crate::download::DownloadJob;
pub use crate::download::Downloader;
pub use crate::error::DownloadError;
pub use crate::http::HttpTransferFacility;
pub use crate::transfer::Transfer;
pub use crate::transfer::TransferFacility;
pub use crate::transfer::TransferProgress;
pub use crate::transfer::TransferState;
