use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clock::elapsed_since;
use clock::Clock;
use clock::Timestamp;
use clock::WallClock;
use deployment_utils::paths::create_directories;
use log::error;
use log::info;
use log::warn;

use crate::error::DownloadError;
use crate::transfer::Transfer;
use crate::transfer::TransferFacility;
use crate::transfer::TransferProgress;
use crate::transfer::TransferState;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Immutable configuration for one invocation of the downloader.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    url: String,
    destination: PathBuf,
    max_attempts: u32,
    retry_delay: Duration,
    poll_interval: Duration,
}

impl DownloadJob {
    pub fn new(url: &str, destination: impl AsRef<Path>) -> Self {
        DownloadJob {
            url: url.into(),
            destination: destination.as_ref().into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    pub fn with_retry_delay(self, retry_delay: Duration) -> Self {
        Self {
            retry_delay,
            ..self
        }
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn destination(&self) -> &Path {
        self.destination.as_path()
    }
}

/// Downloads a job's source URL to its destination path, blocking the caller
/// until success or until the retry budget is spent.
///
/// At most one transfer attempt is in flight at any time. The downloader
/// starts an attempt on its facility, then repeatedly sleeps and polls the
/// attempt's progress; a fixed delay separates failed attempts.
pub struct Downloader<F> {
    facility: F,
    clock: Arc<dyn Clock>,
}

impl<F: TransferFacility> Downloader<F> {
    pub fn new(facility: F) -> Self {
        Downloader {
            facility,
            clock: Arc::new(WallClock),
        }
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self { clock, ..self }
    }

    pub async fn download(&self, job: &DownloadJob) -> Result<(), DownloadError> {
        if let Some(parent) = job.destination().parent() {
            create_directories(parent)?;
        }

        let mut attempt = 1;
        loop {
            if attempt > job.max_attempts {
                return Err(self.retries_exhausted(job));
            }

            info!(
                "Downloading {} (attempt {attempt} of {})",
                job.url(),
                job.max_attempts
            );
            let started = self.clock.now();
            let transfer = self.facility.start(job.url(), job.destination()).await;
            let progress = self.poll_until_settled(transfer.as_ref(), job, started).await;
            let elapsed = elapsed_since(self.clock.as_ref(), started).num_seconds();

            match progress.state {
                TransferState::Transferred => {
                    info!(
                        "Transfer of {} bytes completed in {elapsed}s",
                        progress.bytes_transferred
                    );
                    transfer.complete().await?;
                    info!("Downloaded {} to {:?}", job.url(), job.destination());
                    return Ok(());
                }
                TransferState::Error => {
                    let detail = progress
                        .error
                        .as_deref()
                        .unwrap_or("no error detail reported");
                    warn!(
                        "Transfer failed after {elapsed}s with {}/{} bytes ({:.2}%): {detail}",
                        progress.bytes_transferred,
                        progress.bytes_total,
                        progress.percent_complete()
                    );
                }
                _ => {
                    warn!("Transfer failure status could not be determined");
                }
            }

            attempt += 1;
            if attempt > job.max_attempts {
                return Err(self.retries_exhausted(job));
            }
            info!("Retrying in {}s", job.retry_delay.as_secs());
            tokio::time::sleep(job.retry_delay).await;
        }
    }

    async fn poll_until_settled(
        &self,
        transfer: &dyn Transfer,
        job: &DownloadJob,
        started: Timestamp,
    ) -> TransferProgress {
        let mut progress = transfer.progress();
        while progress.state.is_pending() {
            tokio::time::sleep(job.poll_interval).await;
            progress = transfer.progress();
            let elapsed = elapsed_since(self.clock.as_ref(), started).num_seconds();
            info!(
                "Transferred {:.2}% ({}/{} bytes) after {elapsed}s",
                progress.percent_complete(),
                progress.bytes_transferred,
                progress.bytes_total
            );
        }
        progress
    }

    fn retries_exhausted(&self, job: &DownloadJob) -> DownloadError {
        let err = DownloadError::RetryExhausted {
            url: job.url.clone(),
            attempts: job.max_attempts,
        };
        error!("{err}");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferProgress;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const RETRY_DELAY: Duration = Duration::from_secs(10);
    const POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// One scripted attempt: stay pending for `polls` progress reads, then
    /// settle into `outcome`.
    #[derive(Clone)]
    struct AttemptScript {
        polls: u32,
        outcome: TransferProgress,
    }

    impl AttemptScript {
        fn succeeds(bytes: u64) -> Self {
            AttemptScript {
                polls: 0,
                outcome: TransferProgress {
                    state: TransferState::Transferred,
                    bytes_transferred: bytes,
                    bytes_total: bytes,
                    error: None,
                },
            }
        }

        fn fails(detail: &str) -> Self {
            AttemptScript {
                polls: 0,
                outcome: TransferProgress {
                    state: TransferState::Error,
                    bytes_transferred: 0,
                    bytes_total: 0,
                    error: Some(detail.into()),
                },
            }
        }

        fn vanishes() -> Self {
            AttemptScript {
                polls: 0,
                outcome: TransferProgress {
                    state: TransferState::Unknown,
                    bytes_transferred: 0,
                    bytes_total: 0,
                    error: None,
                },
            }
        }

        fn pending_for(self, polls: u32) -> Self {
            Self { polls, ..self }
        }
    }

    struct ScriptedTransfer {
        script: AttemptScript,
        polls_left: AtomicU32,
        completions: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Transfer for ScriptedTransfer {
        fn progress(&self) -> TransferProgress {
            let polls_left = self.polls_left.load(Ordering::SeqCst);
            if polls_left > 0 {
                self.polls_left.store(polls_left - 1, Ordering::SeqCst);
                TransferProgress {
                    state: TransferState::Transferring,
                    bytes_transferred: 0,
                    bytes_total: self.script.outcome.bytes_total,
                    error: None,
                }
            } else {
                self.script.outcome.clone()
            }
        }

        async fn complete(self: Box<Self>) -> Result<(), DownloadError> {
            self.completions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedFacility {
        scripts: Mutex<VecDeque<AttemptScript>>,
        starts: AtomicU32,
        completions: Arc<AtomicU32>,
    }

    impl ScriptedFacility {
        fn new(scripts: Vec<AttemptScript>) -> Self {
            ScriptedFacility {
                scripts: Mutex::new(scripts.into()),
                starts: AtomicU32::new(0),
                completions: Arc::new(AtomicU32::new(0)),
            }
        }

        fn starts(&self) -> u32 {
            self.starts.load(Ordering::SeqCst)
        }

        fn completions(&self) -> u32 {
            self.completions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferFacility for &ScriptedFacility {
        async fn start(&self, _url: &str, _destination: &Path) -> Box<dyn Transfer> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("more attempts started than scripted");
            Box::new(ScriptedTransfer {
                polls_left: AtomicU32::new(script.polls),
                script,
                completions: Arc::clone(&self.completions),
            })
        }
    }

    fn job(dir: &TempDir) -> DownloadJob {
        DownloadJob::new("http://repo.local/app.tar.gz", dir.path().join("app.tar.gz"))
            .with_retry_delay(RETRY_DELAY)
            .with_poll_interval(POLL_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_attempt_without_any_delay() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let facility = ScriptedFacility::new(vec![AttemptScript::succeeds(1000)]);
        let epoch = tokio::time::Instant::now();

        Downloader::new(&facility).download(&job(&dir)).await?;

        assert_eq!(facility.starts(), 1);
        assert_eq!(facility.completions(), 1);
        assert_eq!(epoch.elapsed(), Duration::ZERO);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_an_attempt_succeeds() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let facility = ScriptedFacility::new(vec![
            AttemptScript::fails("connection reset"),
            AttemptScript::fails("connection reset"),
            AttemptScript::succeeds(1000),
        ]);
        let epoch = tokio::time::Instant::now();

        Downloader::new(&facility)
            .with_clock(Arc::new(WallClock))
            .download(&job(&dir).with_max_attempts(3))
            .await?;

        assert_eq!(facility.starts(), 3);
        assert_eq!(facility.completions(), 1);
        // two failed attempts, hence two inter-attempt delays
        assert_eq!(epoch.elapsed(), 2 * RETRY_DELAY);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn fails_once_the_retry_budget_is_spent() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let facility = ScriptedFacility::new(vec![
            AttemptScript::fails("410 Gone"),
            AttemptScript::fails("410 Gone"),
            AttemptScript::fails("410 Gone"),
        ]);
        let epoch = tokio::time::Instant::now();

        let err = Downloader::new(&facility)
            .download(&job(&dir).with_max_attempts(3))
            .await
            .unwrap_err();

        assert_matches!(err, DownloadError::RetryExhausted { attempts: 3, .. });
        assert_eq!(facility.starts(), 3);
        assert_eq!(facility.completions(), 0);
        // no delay after the final attempt
        assert_eq!(epoch.elapsed(), 2 * RETRY_DELAY);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn indeterminate_attempts_are_retried_like_failures() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let facility =
            ScriptedFacility::new(vec![AttemptScript::vanishes(), AttemptScript::vanishes()]);
        let epoch = tokio::time::Instant::now();

        let err = Downloader::new(&facility)
            .download(&job(&dir).with_max_attempts(2))
            .await
            .unwrap_err();

        assert_matches!(err, DownloadError::RetryExhausted { attempts: 2, .. });
        assert_eq!(epoch.elapsed(), RETRY_DELAY);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pending_transfer_is_polled_at_the_configured_interval() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let facility =
            ScriptedFacility::new(vec![AttemptScript::succeeds(1000).pending_for(3)]);
        let epoch = tokio::time::Instant::now();

        Downloader::new(&facility).download(&job(&dir)).await?;

        assert_eq!(epoch.elapsed(), 3 * POLL_INTERVAL);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempt_budget_fails_without_starting_a_transfer() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let facility = ScriptedFacility::new(vec![]);

        let err = Downloader::new(&facility)
            .download(&job(&dir).with_max_attempts(0))
            .await
            .unwrap_err();

        assert_matches!(err, DownloadError::RetryExhausted { attempts: 0, .. });
        assert_eq!(facility.starts(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn missing_destination_directories_are_created() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let destination = dir.path().join("nested/cache/app.tar.gz");
        let facility = ScriptedFacility::new(vec![AttemptScript::succeeds(10)]);

        let job = DownloadJob::new("http://repo.local/app.tar.gz", &destination)
            .with_retry_delay(RETRY_DELAY)
            .with_poll_interval(POLL_INTERVAL);
        Downloader::new(&facility).download(&job).await?;

        assert!(destination.parent().unwrap().is_dir());
        Ok(())
    }
}
