//! Elapsed-time ticker for an open logging session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Background thread invoking a handler with the elapsed time every `interval`.
///
/// Cancelling (or dropping) the ticker wakes the thread, waits for it to exit
/// and guarantees the handler is not called afterwards.
pub struct SessionTicker {
    stop: Option<Sender<()>>,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SessionTicker {
    pub fn start<F>(interval: Duration, handler: F) -> Self
    where
        F: Fn(Duration) + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let started = Instant::now();

        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    handler(started.elapsed());
                }
                // Explicit stop or the ticker was dropped
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        tracing::debug!("Session ticker started ({:?} interval)", interval);
        Self {
            stop: Some(stop),
            cancelled,
            handle: Some(handle),
        }
    }

    /// Stop ticking and join the thread; safe to call more than once
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Session ticker handler panicked");
            }
            tracing::debug!("Session ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
