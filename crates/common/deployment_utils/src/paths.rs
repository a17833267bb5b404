use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use async_tempfile::TempFile;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufWriter;

#[derive(thiserror::Error, Debug)]
pub enum PathsError {
    #[error("Directory Error. Check permissions for {1}.")]
    DirCreationFailed(#[source] std::io::Error, PathBuf),

    #[error("File Error. Check permissions for {1}.")]
    FileCreationFailed(#[source] std::io::Error, PathBuf),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Couldn't write draft file, check permissions.")]
    PersistError(#[from] async_tempfile::Error),

    #[error("Parent directory for the path: {path:?} not found")]
    ParentDirNotFound { path: OsString },
}

pub fn create_directories(dir_path: impl AsRef<Path>) -> Result<(), PathsError> {
    let dir_path = dir_path.as_ref();
    std::fs::create_dir_all(dir_path)
        .map_err(|error| PathsError::DirCreationFailed(error, dir_path.into()))
}

pub async fn persist_tempfile(
    mut file: BufWriter<TempFile>,
    path_to: impl AsRef<Path>,
) -> Result<(), PathsError> {
    file.flush().await?;
    file.get_ref().sync_all().await?;
    tokio::fs::rename(file.get_ref().file_path(), &path_to)
        .await
        .map_err(|error| PathsError::FileCreationFailed(error, path_to.as_ref().into()))?;

    Ok(())
}

/// In-progress content for a target file, written to a temporary sibling.
///
/// Callers stream bytes into the draft through `AsyncWrite` and then call
/// [`DraftFile::persist`] to move it atomically over the target. A dropped
/// draft disappears with its temp file, leaving the target as it was.
#[pin_project::pin_project]
pub struct DraftFile {
    #[pin]
    file: BufWriter<TempFile>,
    target: PathBuf,
}

impl DraftFile {
    /// Create a draft for a file
    pub async fn new(target: impl AsRef<Path>) -> Result<DraftFile, PathsError> {
        let target = target.as_ref();

        // Since the persist method will rename the temp file into the target,
        // one has to create the temp file in the same file system as the target.
        let dir = target
            .parent()
            .ok_or_else(|| PathsError::ParentDirNotFound {
                path: target.as_os_str().into(),
            })?;
        let file = BufWriter::new(TempFile::new_in(dir).await?);

        let target = target.to_path_buf();

        Ok(DraftFile { file, target })
    }

    /// Atomically persist the file into its target path
    pub async fn persist(self) -> Result<(), PathsError> {
        let target = &self.target;
        persist_tempfile(self.file, target).await?;

        Ok(())
    }
}

impl AsyncWrite for DraftFile {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        let this = self.project();
        this.file.poll_write(cx, buf)
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let this = self.project();
        this.file.poll_flush(cx)
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        let this = self.project();
        this.file.poll_shutdown(cx)
    }
}
