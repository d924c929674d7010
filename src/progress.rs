//src/progress.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

/// Handle that lets another thread request cancellation of a running task.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Progress reporting plus cooperative cancellation.
///
/// Long loops call [`ProgressListener::increment`] or
/// [`ProgressListener::check_cancelled`] once per unit of work (read, node,
/// contig); both return [`Error::Cancelled`] once cancellation was requested.
/// The listener is `Sync`, so worker threads may share one instance.
#[derive(Debug)]
pub struct ProgressListener {
    bar: ProgressBar,
    cancel: CancelHandle,
}

impl Default for ProgressListener {
    fn default() -> Self {
        Self::silent()
    }
}

impl ProgressListener {
    /// A listener that draws nothing, for library and test use.
    pub fn silent() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            cancel: CancelHandle::default(),
        }
    }

    /// A listener that draws a bar on stderr.
    pub fn with_bar(task: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix(task.to_string());
        Self {
            bar,
            cancel: CancelHandle::default(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn set_subtask(&self, subtask: &str) {
        self.bar.set_message(subtask.to_string());
    }

    /// Resets the position and sets a new length.
    pub fn set_maximum(&self, max: u64) {
        self.bar.set_length(max);
        self.bar.set_position(0);
    }

    pub fn increment(&self) -> Result<()> {
        self.bar.inc(1);
        self.check_cancelled()
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
