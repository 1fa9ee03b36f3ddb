use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

/// Delivers only the last value pushed once no new value has arrived for
/// the quiescence window.
///
/// Each push restarts the window. Dropping the debouncer cancels any pending
/// delivery. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, T)>,
    rx: mpsc::UnboundedReceiver<(u64, T)>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { window, generation: 0, tx, rx, pending: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn push(&mut self, value: T) {
        self.cancel();

        let generation = self.generation;
        let tx = self.tx.clone();
        let window = self.window;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Receiver lives as long as the debouncer; nothing to do if it's gone.
            let _ = tx.send((generation, value));
        }));
    }

    /// Forget the pending value, if any.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// A value has been pushed and not yet received or cancelled.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the next value to survive the window.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let (generation, value) = self.rx.recv().await?;
            // The timer may have fired just before a cancel.
            if generation == self.generation {
                self.pending = None;
                return Some(value);
            }
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
