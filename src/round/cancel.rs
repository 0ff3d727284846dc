use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Process-wide shutdown request, set once and never cleared.
#[derive(Clone)]
pub struct Cancel {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Cancel {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            let cancelled = *rx.borrow();
            if cancelled {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `delay` unless cancelled first. Returns true if cancelled.
    pub async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay)      => self.is_cancelled(),
            _ = self.cancelled()  => true,
        }
    }
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}
