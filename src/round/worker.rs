use std::sync::Arc;
use log::{debug, info, warn};
use rand::{thread_rng, Rng};
use tokio::sync::mpsc;
use crate::ping::Executor;
use super::barrier::Gate;
use super::cancel::Cancel;
use super::target::{Sample, Target};

/// Probes one target once per round until cancelled or faulted.
pub struct Worker<E: ?Sized> {
    target:  Target,
    payload: Vec<u8>,
    exec:    Arc<E>,
    gate:    Gate,
    done:    mpsc::Sender<Sample>,
    cancel:  Cancel,
}

impl<E: Executor + ?Sized> Worker<E> {
    pub fn new(
        target: Target,
        exec:   Arc<E>,
        gate:   Gate,
        done:   mpsc::Sender<Sample>,
        cancel: Cancel,
    ) -> Self {
        let mut payload = vec![0u8; target.size()];
        thread_rng().fill(&mut payload[..]);
        Self { target, payload, exec, gate, done, cancel }
    }

    pub async fn run(mut self) -> Target {
        info!("starting worker for {}", self.target.host());

        let mut last = 0;

        while let Some(round) = self.gate.go(last).await {
            last = round;

            if self.cancel.is_cancelled() {
                break;
            }

            if !self.probe(round).await {
                break;
            }

            if self.done.send(self.target.sample()).await.is_err() {
                break;
            }

            if !self.gate.release(round).await {
                break;
            }
        }

        if !self.target.is_fatal() {
            let _ = self.done.send(self.target.sample()).await;
        }

        info!("exiting worker for {}", self.target.host());

        self.target
    }

    async fn probe(&mut self, round: u64) -> bool {
        let Self { target, payload, exec, done, .. } = self;

        let host    = target.host();
        let expiry  = target.expiry();
        let options = target.options();

        match exec.send(host, expiry, &payload[..], options).await {
            Ok(reply) => {
                debug!("{} round {}: {} in {:?}", host, round, reply.status, reply.rtt);
                target.record(&reply);
                true
            }
            Err(e) => {
                warn!("exception sending ping to {}: {}", host, e);
                target.fail();
                let _ = done.send(target.sample()).await;
                false
            }
        }
    }
}
