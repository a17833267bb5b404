use std::io;

/// An error that can be returned as a result of
/// [`Downloader::download`](super::download::Downloader::download).
///
/// Failures of individual attempts are never surfaced here; they only drive
/// the retry decision. The download as a whole fails once the retry budget
/// is spent or a completed transfer cannot be persisted.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Download of {url} still failing after {attempts} attempts")]
    RetryExhausted { url: String, attempts: u32 },

    #[error("{context}")]
    FromIo { context: String, source: io::Error },

    #[error("Error while persisting the downloaded file")]
    FromPathsError(#[from] deployment_utils::paths::PathsError),
}
