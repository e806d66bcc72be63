//! Caller-side handle on a running import job.

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::models::{BatchImportJob, JobStatus};

/// Observable handle returned by [`super::BatchImportController::start`].
///
/// Every read returns a consistent snapshot: the counters are updated together,
/// never one at a time.
#[derive(Debug, Clone)]
pub struct ImportJob {
    id: Uuid,
    progress: watch::Receiver<BatchImportJob>,
}

impl ImportJob {
    pub(crate) fn new(id: Uuid, progress: watch::Receiver<BatchImportJob>) -> Self {
        Self { id, progress }
    }

    /// Job id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current state of the job.
    #[must_use]
    pub fn snapshot(&self) -> BatchImportJob {
        self.progress.borrow().clone()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.progress.borrow().status
    }

    /// Stream of snapshots, starting with the current one.
    ///
    /// Intermediate states may be skipped when the consumer is slower than the
    /// job; the terminal state is always delivered.
    #[must_use]
    pub fn subscribe(&self) -> WatchStream<BatchImportJob> {
        WatchStream::new(self.progress.clone())
    }

    /// Wait until the job reaches a state matching `predicate` and return that snapshot.
    pub async fn wait_for(&self, predicate: impl FnMut(&BatchImportJob) -> bool) -> BatchImportJob {
        let mut progress = self.progress.clone();
        let result = progress.wait_for(predicate).await.map(|job| job.clone());

        // The worker is gone: whatever it published last is final
        result.unwrap_or_else(|_| progress.borrow().clone())
    }

    /// Wait for the terminal snapshot.
    pub async fn wait(&self) -> BatchImportJob {
        self.wait_for(|job| job.status.is_terminal()).await
    }
}
