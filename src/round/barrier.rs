use tokio::sync::watch;

/// Barrier phase broadcast to every worker.
///
/// A single value carries both signals, so raising `Go` clears `Release`
/// and raising `Release` clears `Go`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Go(u64),
    Release(u64),
}

/// Coordinator side of the two-phase round barrier.
pub struct Barrier {
    tx:    watch::Sender<Phase>,
    round: u64,
}

/// Worker side of the round barrier.
#[derive(Clone)]
pub struct Gate {
    rx: watch::Receiver<Phase>,
}

impl Barrier {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Idle);
        Self { tx, round: 0 }
    }

    pub fn gate(&self) -> Gate {
        Gate { rx: self.tx.subscribe() }
    }

    pub fn go(&mut self) -> u64 {
        self.round += 1;
        self.raise(Phase::Go(self.round));
        self.round
    }

    pub fn release(&mut self) {
        self.raise(Phase::Release(self.round));
    }

    fn raise(&self, phase: Phase) {
        let _ = self.tx.send(phase);
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    /// Wait for a go signal for a round after `last`, returning that round,
    /// or `None` once the barrier is gone.
    pub async fn go(&mut self, last: u64) -> Option<u64> {
        loop {
            let phase = *self.rx.borrow();
            if let Phase::Go(round) = phase {
                if round > last {
                    return Some(round);
                }
            }
            self.rx.changed().await.ok()?;
        }
    }

    /// Wait until `round` is released. A later go implies the release.
    pub async fn release(&mut self, round: u64) -> bool {
        loop {
            let phase = *self.rx.borrow();
            if phase != Phase::Go(round) {
                return true;
            }
            if self.rx.changed().await.is_err() {
                return false;
            }
        }
    }
}
