use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::definitions::PROGRESS_EVERY_N_FRAMES;

/// A flag that stops a running analysis. Clones share the same flag, so a token can be handed
/// to another thread and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How far an analysis has got. `total` is taken from the reported frame count, so
/// `current` may overshoot it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

type ProgressSink = Box<dyn Fn(Progress) + Send + Sync>;

/// Cancellation and progress reporting for a single analysis.
///
/// Cancellation is checked once per frame. A cancelled analysis still returns successfully,
/// with whatever results it had found so far and [`ScanSummary::cancelled`][crate::ScanSummary] set.
#[derive(Default)]
pub struct ScanControl {
    cancel: CancelToken,
    progress: Option<ProgressSink>,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Receive a progress report every few frames. Reports never affect the results.
    #[must_use]
    pub fn with_progress(mut self, sink: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    //Reports on every PROGRESS_EVERY_N_FRAMES'th iteration only.
    pub(crate) fn tick(&self, iteration: u64, current: u64, total: u64) {
        if iteration % PROGRESS_EVERY_N_FRAMES != 0 {
            return;
        }
        if let Some(sink) = &self.progress {
            sink(Progress { current, total });
        }
    }
}

impl fmt::Debug for ScanControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanControl")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let control = ScanControl::new().with_cancel_token(token.clone());
        assert!(!control.is_cancelled());

        std::thread::spawn(move || token.cancel()).join().unwrap();
        assert!(control.is_cancelled());
    }

    #[test]
    fn test_progress_is_throttled() {
        let seen = Arc::new(Mutex::new(vec![]));
        let seen_clone = Arc::clone(&seen);
        let control = ScanControl::new().with_progress(move |p| seen_clone.lock().unwrap().push(p.current));

        for i in 0..25 {
            control.tick(i, i, 25);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 10, 20]);
    }
}
