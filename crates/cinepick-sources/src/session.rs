use crate::error::SourceError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// A live browser able to render pages.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, wait `settle` for client-side rendering, and return the page HTML.
    async fn fetch_html(&mut self, url: &str, settle: Duration) -> Result<String, SourceError>;

    /// Terminate the browser. Called at most once per session.
    async fn close(&mut self) -> Result<(), SourceError>;
}

/// Starts new browser sessions for the pool and the detail fetcher.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SourceError>;
}

type Slot = Arc<Mutex<Option<Box<dyn BrowserSession>>>>;

/// One lazily launched session per worker slot.
///
/// A worker always acquires its own slot, so a session is never driven by two
/// workers at once and repeated acquires from the same worker reuse the same
/// browser.
pub struct SessionPool {
    launcher: Arc<dyn SessionLauncher>,
    slots: Vec<Slot>,
}

impl SessionPool {
    pub fn new(launcher: Arc<dyn SessionLauncher>, workers: usize) -> Self {
        let slots = (0..workers.max(1)).map(|_| Arc::new(Mutex::new(None))).collect();
        Self { launcher, slots }
    }

    pub fn workers(&self) -> usize {
        self.slots.len()
    }

    /// Lease the session bound to `worker`, launching it on first use.
    pub async fn acquire(&self, worker: usize) -> Result<SessionLease, SourceError> {
        let slot = self
            .slots
            .get(worker)
            .ok_or(SourceError::SessionUnavailable(worker))?
            .clone();

        let mut guard = slot.lock_owned().await;
        if guard.is_none() {
            info!(worker = worker, "Launching browser session");
            let session = self.launcher.launch().await?;
            *guard = Some(session);
        } else {
            debug!(worker = worker, "Reusing browser session");
        }

        Ok(SessionLease { worker, guard })
    }

    /// Close every launched session. Slots that never launched are skipped and
    /// close failures are logged, never returned.
    pub async fn release_all(&self) -> usize {
        let mut closed = 0;
        for (worker, slot) in self.slots.iter().enumerate() {
            let mut guard = slot.lock().await;
            if let Some(mut session) = guard.take() {
                match session.close().await {
                    Ok(()) => {
                        closed += 1;
                        debug!(worker = worker, "Browser session closed");
                    }
                    Err(e) => {
                        warn!(worker = worker, error = %e, "Failed to close browser session");
                    }
                }
            }
        }
        if closed > 0 {
            info!(closed = closed, "Released browser sessions");
        }
        closed
    }

    pub async fn active_sessions(&self) -> usize {
        let mut active = 0;
        for slot in &self.slots {
            if slot.lock().await.is_some() {
                active += 1;
            }
        }
        active
    }
}

/// Exclusive access to one worker's session until dropped.
pub struct SessionLease {
    worker: usize,
    guard: OwnedMutexGuard<Option<Box<dyn BrowserSession>>>,
}

impl SessionLease {
    pub fn worker(&self) -> usize {
        self.worker
    }
}

#[async_trait]
impl BrowserSession for SessionLease {
    async fn fetch_html(&mut self, url: &str, settle: Duration) -> Result<String, SourceError> {
        match self.guard.as_mut() {
            Some(session) => session.fetch_html(url, settle).await,
            None => Err(SourceError::SessionUnavailable(self.worker)),
        }
    }

    /// Closes the leased browser and empties the slot; the next acquire relaunches.
    async fn close(&mut self) -> Result<(), SourceError> {
        match self.guard.take() {
            Some(mut session) => session.close().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSession {
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl BrowserSession for CountingSession {
        async fn fetch_html(
            &mut self,
            url: &str,
            _settle: Duration,
        ) -> Result<String, SourceError> {
            Ok(format!("<html><body>{}</body></html>", url))
        }

        async fn close(&mut self) -> Result<(), SourceError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(SourceError::new("close failed"))
            } else {
                Ok(())
            }
        }
    }

    struct CountingLauncher {
        launches: AtomicUsize,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    impl CountingLauncher {
        fn new(fail_close: bool) -> Self {
            Self {
                launches: AtomicUsize::new(0),
                closes: Arc::new(AtomicUsize::new(0)),
                fail_close,
            }
        }
    }

    #[async_trait]
    impl SessionLauncher for CountingLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>, SourceError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingSession {
                closes: self.closes.clone(),
                fail_close: self.fail_close,
            }))
        }
    }

    #[tokio::test]
    async fn test_acquire_reuses_session_per_worker() {
        let launcher = Arc::new(CountingLauncher::new(false));
        let pool = SessionPool::new(launcher.clone(), 2);

        for _ in 0..3 {
            let mut lease = pool.acquire(0).await.unwrap();
            let html = lease.fetch_html("https://example.test/a", Duration::ZERO).await.unwrap();
            assert!(html.contains("example.test/a"));
        }
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);

        let _other = pool.acquire(1).await.unwrap();
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_release_all_skips_unlaunched_slots() {
        let launcher = Arc::new(CountingLauncher::new(false));
        let pool = SessionPool::new(launcher.clone(), 4);
        drop(pool.acquire(2).await.unwrap());

        assert_eq!(pool.release_all().await, 1);
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
        assert_eq!(pool.active_sessions().await, 0);

        // Second release is a no-op.
        assert_eq!(pool.release_all().await, 0);
    }

    #[tokio::test]
    async fn test_release_all_swallows_close_errors() {
        let launcher = Arc::new(CountingLauncher::new(true));
        let pool = SessionPool::new(launcher.clone(), 2);
        drop(pool.acquire(0).await.unwrap());
        drop(pool.acquire(1).await.unwrap());

        assert_eq!(pool.release_all().await, 0);
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 2);
        assert_eq!(pool.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_acquire_unknown_worker_fails() {
        let pool = SessionPool::new(Arc::new(CountingLauncher::new(false)), 1);
        assert!(matches!(pool.acquire(5).await, Err(SourceError::SessionUnavailable(5))));
    }
}
