use std::io;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use deployment_utils::paths::DraftFile;
use deployment_utils::paths::PathsError;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::sync::watch;

use crate::error::DownloadError;
use crate::transfer::Transfer;
use crate::transfer::TransferFacility;
use crate::transfer::TransferProgress;
use crate::transfer::TransferState;

/// Transfer facility backed by plain HTTP GET requests.
///
/// Each transfer runs on its own tokio task, streaming response chunks into
/// a draft file next to the destination and publishing progress through a
/// watch channel. The destination itself is only touched by
/// [`Transfer::complete`], which renames the finished draft into place, so a
/// failed attempt never clobbers a previously downloaded file.
#[derive(Clone, Default)]
pub struct HttpTransferFacility {
    client: reqwest::Client,
}

impl HttpTransferFacility {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransferFacility for HttpTransferFacility {
    async fn start(&self, url: &str, destination: &Path) -> Box<dyn Transfer> {
        let (progress_tx, progress_rx) = watch::channel(TransferProgress::connecting());
        let (draft_tx, draft_rx) = oneshot::channel();

        let client = self.client.clone();
        let url = url.to_string();
        let destination = destination.to_path_buf();
        tokio::spawn(async move {
            run_transfer(client, url, destination, progress_tx, draft_tx).await
        });

        Box::new(HttpTransfer {
            progress: progress_rx,
            draft: draft_rx,
        })
    }
}

struct HttpTransfer {
    progress: watch::Receiver<TransferProgress>,
    draft: oneshot::Receiver<DraftFile>,
}

#[async_trait]
impl Transfer for HttpTransfer {
    fn progress(&self) -> TransferProgress {
        let progress = self.progress.borrow().clone();
        // A closed channel with a still-pending state means the worker task
        // vanished without reporting a terminal state.
        if progress.state.is_pending() && self.progress.has_changed().is_err() {
            return TransferProgress {
                state: TransferState::Unknown,
                ..progress
            };
        }
        progress
    }

    async fn complete(self: Box<Self>) -> Result<(), DownloadError> {
        let draft = self.draft.await.map_err(|_| DownloadError::FromIo {
            context: "Draft file of the completed transfer is gone".to_string(),
            source: io::Error::other("transfer worker dropped the draft file"),
        })?;
        draft.persist().await?;
        Ok(())
    }
}

async fn run_transfer(
    client: reqwest::Client,
    url: String,
    destination: PathBuf,
    progress: watch::Sender<TransferProgress>,
    draft_tx: oneshot::Sender<DraftFile>,
) {
    if let Err(err) = try_transfer(client, url, destination, &progress, draft_tx).await {
        progress.send_modify(|snapshot| {
            snapshot.state = TransferState::Error;
            snapshot.error = Some(err.to_string());
        });
    }
}

#[derive(Debug, thiserror::Error)]
enum TransferTaskError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("writing the draft file failed: {0}")]
    FromIo(#[from] io::Error),

    #[error("creating the draft file failed: {0}")]
    FromPathsError(#[from] PathsError),
}

async fn try_transfer(
    client: reqwest::Client,
    url: String,
    destination: PathBuf,
    progress: &watch::Sender<TransferProgress>,
    draft_tx: oneshot::Sender<DraftFile>,
) -> Result<(), TransferTaskError> {
    let mut response = client.get(&url).send().await?.error_for_status()?;

    let bytes_total = response.content_length().unwrap_or(0);
    progress.send_modify(|snapshot| {
        snapshot.state = TransferState::Transferring;
        snapshot.bytes_total = bytes_total;
    });

    let mut draft = DraftFile::new(&destination).await?;
    while let Some(chunk) = response.chunk().await? {
        draft.write_all(&chunk).await?;
        progress.send_modify(|snapshot| snapshot.bytes_transferred += chunk.len() as u64);
    }

    // Hand the draft over before flipping the state: a `Transferred` report
    // promises that `complete` will find the file.
    let _ = draft_tx.send(draft);
    progress.send_modify(|snapshot| snapshot.state = TransferState::Transferred);
    Ok(())
}
