use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;

#[derive(Debug, thiserror::Error)]
pub(crate) enum PoolError {
    #[error("Worker pool is shut down")]
    Closed,
    #[error("Worker panicked: {0}")]
    Panicked(String),
}

/// Bounded set of workers. Remote calls run on their own tasks so a caller waiting on the
/// broker only blocks itself, and at most `workers` of them wait at once.
pub(crate) struct WorkerPool {
    permits: Arc<Semaphore>,
    running: Mutex<Vec<AbortHandle>>,
    closed: AtomicBool,
}

impl WorkerPool {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            running: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Runs `task` on a worker once one is free and waits for its output.
    pub(crate) async fn run<F, T>(&self, task: F) -> Result<T, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PoolError::Closed)?;
            Ok(task.await)
        });
        self.track(handle.abort_handle());

        match handle.await {
            Ok(output) => output,
            Err(err) if err.is_cancelled() => Err(PoolError::Closed),
            Err(err) => Err(PoolError::Panicked(err.to_string())),
        }
    }

    fn track(&self, handle: AbortHandle) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        running.retain(|h| !h.is_finished());

        // Shut down between the check in `run` and here
        if self.is_closed() {
            handle.abort();
            return;
        }
        running.push(handle);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Refuses new work and aborts everything in flight. Returns `false` when the pool was
    /// already shut down.
    pub(crate) fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.permits.close();

        let running = {
            let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *running)
        };
        for handle in running {
            handle.abort();
        }
        true
    }
}
