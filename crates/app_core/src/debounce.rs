//! Trailing-edge debouncer on tokio timers

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Delivers only the latest value once calls stop for `delay`
///
/// `call` must run inside a tokio runtime.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    callback: Callback<T>,
    pending: Arc<Mutex<Option<T>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            callback: Arc::new(callback),
            pending: Arc::new(Mutex::new(None)),
            timer: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the delay
    pub fn call(&self, value: T) {
        *self.pending.lock() = Some(value);

        let pending = Arc::clone(&self.pending);
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let value = pending.lock().take();
            if let Some(value) = value {
                callback(value);
            }
        });

        if let Some(previous) = self.timer.lock().replace(task) {
            previous.abort();
        }
    }

    /// Deliver the pending value now; returns whether there was one
    pub fn flush(&self) -> bool {
        self.stop_timer();
        let value = self.pending.lock().take();
        match value {
            Some(value) => {
                (self.callback)(value);
                true
            }
            None => false,
        }
    }

    /// Drop the pending value without delivering it
    pub fn cancel(&self) {
        self.stop_timer();
        self.pending.lock().take();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    fn stop_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.stop_timer();
    }
}
