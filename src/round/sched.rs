use std::sync::Arc;
use anyhow::Result;
use chrono::Local;
use futures::future::join_all;
use log::{debug, error, info};
use tokio::sync::mpsc;
use crate::ping::Executor;
use super::barrier::Barrier;
use super::cancel::Cancel;
use super::config::Config;
use super::report::{Column, Round};
use super::target::{Sample, Target};
use super::worker::Worker;

/// Drives one worker per host through synchronized rounds.
///
/// Each round raises go, waits for every live worker to hand back its
/// sample, emits one `Round` with the hosts in input order, then raises
/// release and sleeps for the configured rate. Workers that fault are
/// retired from the wait set and their column keeps its last value.
pub struct Scheduler<E: ?Sized> {
    exec:   Arc<E>,
    hosts:  Vec<String>,
    config: Config,
    cancel: Cancel,
}

struct Slot {
    column: Column,
    rx:     Option<mpsc::Receiver<Sample>>,
}

impl<E: Executor + ?Sized + 'static> Scheduler<E> {
    pub fn new(exec: Arc<E>, hosts: Vec<String>, config: Config, cancel: Cancel) -> Self {
        Self { exec, hosts, config, cancel }
    }

    /// Run rounds until cancelled, passing each one to `emit`, and return
    /// the number of rounds emitted. Every worker has exited by the time
    /// this returns. An error from `emit` stops the rounds and is returned
    /// after shutdown.
    pub async fn run<F>(self, mut emit: F) -> Result<u64>
    where
        F: FnMut(&Round) -> Result<()>,
    {
        let Self { exec, hosts, config, cancel } = self;

        let mut barrier = Barrier::new();
        let mut slots   = Vec::with_capacity(hosts.len());
        let mut tasks   = Vec::with_capacity(hosts.len());

        for host in hosts {
            let (tx, rx) = mpsc::channel(1);
            let target   = Target::new(host, &config);
            let gate     = barrier.gate();

            slots.push(Slot::new(target.host(), rx));

            let worker = Worker::new(target, exec.clone(), gate, tx, cancel.clone());
            tasks.push(tokio::spawn(worker.run()));
        }

        let mut rounds = 0;
        let mut failed = None;

        while !cancel.is_cancelled() {
            let seq = barrier.go();

            complete(&mut slots).await;

            let round = Round {
                seq:     seq,
                time:    Local::now(),
                columns: slots.iter().map(|slot| slot.column.clone()).collect(),
            };

            match emit(&round) {
                Ok(()) => rounds += 1,
                Err(e) => {
                    cancel.cancel();
                    failed = Some(e);
                }
            }

            barrier.release();

            cancel.sleep(config.rate).await;
        }

        debug!("shutting down after {} rounds", rounds);

        barrier.go();
        complete(&mut slots).await;
        barrier.release();

        for task in join_all(tasks).await {
            match task {
                Ok(target) => debug!("{} stopped, last status {:?}", target.host(), target.sample().status),
                Err(e)     => error!("worker task failed: {}", e),
            }
        }

        match failed {
            Some(e) => Err(e),
            None    => Ok(rounds),
        }
    }
}

impl Slot {
    fn new(host: &str, rx: mpsc::Receiver<Sample>) -> Self {
        Self {
            column: Column::new(host),
            rx:     Some(rx),
        }
    }

    async fn complete(&mut self) {
        let rx = match &mut self.rx {
            Some(rx) => rx,
            None     => return,
        };

        match rx.recv().await {
            Some(sample) => {
                self.column.sample = sample;
                if sample.fatal {
                    info!("retiring worker for {}", self.column.host);
                    self.rx = None;
                }
            }
            None => {
                debug!("worker for {} has exited", self.column.host);
                self.rx = None;
            }
        }
    }
}

async fn complete(slots: &mut [Slot]) {
    join_all(slots.iter_mut().map(|slot| slot.complete())).await;
}
