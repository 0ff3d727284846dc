use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, timeout};
use multiping::{Cancel, Config, Executor, Options, Reply, Round, Scheduler, Status};

#[derive(Clone, Copy)]
enum Step {
    Ok(u64),
    Fail(Status),
    Slow(u64, u64),
    Fault,
}

#[derive(Default)]
struct Script {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    sizes: Mutex<Vec<usize>>,
    calls: AtomicUsize,
}

impl Script {
    fn host(self, host: &str, steps: &[Step]) -> Self {
        self.steps.lock().insert(host.to_string(), steps.iter().copied().collect());
        self
    }

    fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Executor for Script {
    async fn send(&self, host: &str, expiry: Duration, payload: &[u8], _: Options) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().push(payload.len());

        let step = self.steps.lock().get_mut(host).and_then(VecDeque::pop_front);

        match step.unwrap_or(Step::Fail(Status::TimedOut)) {
            Step::Ok(ms)         => Ok(Reply::success(Duration::from_millis(ms))),
            Step::Fail(status)   => Ok(Reply::new(status, expiry)),
            Step::Slow(wait, ms) => {
                sleep(Duration::from_millis(wait)).await;
                Ok(Reply::success(Duration::from_millis(ms)))
            }
            Step::Fault          => Err(anyhow!("general failure")),
        }
    }
}

fn config() -> Config {
    Config {
        rate: Duration::from_millis(1),
        ..Config::default()
    }
}

fn hosts(hosts: &[&str]) -> Vec<String> {
    hosts.iter().map(|host| host.to_string()).collect()
}

async fn collect<E: Executor + 'static>(exec: Arc<E>, hosts: Vec<String>, config: Config, count: usize) -> Vec<Round> {
    let cancel = Cancel::new();
    let stop   = cancel.clone();
    let sched  = Scheduler::new(exec, hosts, config, cancel);

    let mut rounds = Vec::new();
    let run = sched.run(|round| {
        rounds.push(round.clone());
        if rounds.len() >= count {
            stop.cancel();
        }
        Ok(())
    });

    let emitted = timeout(Duration::from_secs(10), run).await.expect("scheduler stalled").unwrap();
    assert_eq!(emitted as usize, rounds.len());

    rounds
}

#[tokio::test]
async fn timeout_shows_initial_value_then_success() {
    let exec = Script::default()
        .host("10.0.0.1", &[Step::Ok(50), Step::Ok(50)])
        .host("10.0.0.2", &[Step::Fail(Status::TimedOut), Step::Ok(40)])
        .build();

    let rounds = collect(exec, hosts(&["10.0.0.1", "10.0.0.2"]), config(), 2).await;

    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0].rtts(), vec![50, 0]);
    assert_eq!(rounds[1].rtts(), vec![50, 40]);
    assert_eq!(rounds[0].columns[1].sample.status, Some(Status::TimedOut));
    assert_eq!(rounds[1].columns[1].sample.status, Some(Status::Success));
}

#[tokio::test]
async fn failures_repeat_last_known_rtt() {
    let exec = Script::default()
        .host("a", &[
            Step::Ok(10),
            Step::Fail(Status::TimedOut),
            Step::Fail(Status::Unreachable),
            Step::Ok(30),
        ])
        .build();

    let rounds = collect(exec, hosts(&["a"]), config(), 4).await;
    let rtts   = rounds.iter().map(|round| round.rtts()[0]).collect::<Vec<_>>();

    assert_eq!(rtts, vec![10, 10, 10, 30]);
    assert_eq!(rounds[2].columns[0].sample.status, Some(Status::Unreachable));
}

#[tokio::test]
async fn columns_follow_input_order() {
    let exec = Script::default()
        .host("slow", &[Step::Slow(40, 3)])
        .host("fast", &[Step::Ok(1)])
        .host("middle", &[Step::Slow(10, 2)])
        .build();

    let rounds = collect(exec, hosts(&["slow", "fast", "middle"]), config(), 1).await;
    let hosts  = rounds[0].columns.iter().map(|c| c.host.as_str()).collect::<Vec<_>>();

    assert_eq!(hosts, vec!["slow", "fast", "middle"]);
    assert_eq!(rounds[0].rtts(), vec![3, 1, 2]);
}

#[tokio::test]
async fn report_waits_for_slowest_worker() {
    let exec = Script::default()
        .host("a", &[Step::Ok(1), Step::Ok(2)])
        .host("b", &[Step::Slow(60, 7), Step::Slow(30, 8)])
        .build();

    let rounds = collect(exec, hosts(&["a", "b"]), config(), 2).await;

    assert_eq!(rounds[0].rtts(), vec![1, 7]);
    assert_eq!(rounds[1].rtts(), vec![2, 8]);
}

#[tokio::test]
async fn fatal_worker_is_retired() {
    let exec = Script::default()
        .host("a", &[Step::Ok(5), Step::Ok(6), Step::Ok(7), Step::Ok(8)])
        .host("b", &[Step::Ok(9), Step::Fault])
        .build();

    let rounds = collect(exec.clone(), hosts(&["a", "b"]), config(), 4).await;
    let rtts   = rounds.iter().map(Round::rtts).collect::<Vec<_>>();

    assert_eq!(rtts, vec![vec![5, 9], vec![6, 9], vec![7, 9], vec![8, 9]]);
    assert!(!rounds[0].columns[1].sample.fatal);
    assert!(rounds[1].columns[1].sample.fatal);
    assert!(rounds[3].columns[1].sample.fatal);

    // four probes for a, two for b
    assert_eq!(exec.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn all_workers_fatal_does_not_stall() {
    let exec = Script::default()
        .host("a", &[Step::Fault])
        .host("b", &[Step::Fault])
        .build();

    let rounds = collect(exec, hosts(&["a", "b"]), config(), 3).await;

    assert_eq!(rounds.len(), 3);
    assert!(rounds.iter().all(|round| round.columns.iter().all(|c| c.sample.fatal)));
}

#[tokio::test]
async fn payload_is_clamped() {
    let exec   = Script::default()
        .host("a", &[Step::Ok(1)])
        .build();
    let config = Config { size: 70000, ..config() };

    collect(exec.clone(), hosts(&["a"]), config, 1).await;

    assert_eq!(*exec.sizes.lock(), vec![65500]);
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let exec   = Script::default()
        .host("a", &[Step::Ok(1)])
        .build();
    let cancel = Cancel::new();
    cancel.cancel();

    let sched = Scheduler::new(exec.clone(), hosts(&["a", "b"]), config(), cancel);
    let run   = sched.run(|_| panic!("no rounds expected"));
    let count = timeout(Duration::from_secs(10), run).await.expect("shutdown stalled").unwrap();

    assert_eq!(count, 0);
    assert_eq!(exec.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_during_sleep_stops_promptly() {
    let exec   = Script::default()
        .host("a", &[Step::Ok(1)])
        .build();
    let cancel = Cancel::new();
    let stop   = cancel.clone();
    let config = Config { rate: Duration::from_secs(60), ..config() };

    tokio::spawn(async move {
        sleep(Duration::from_millis(50)).await;
        stop.cancel();
    });

    let sched = Scheduler::new(exec.clone(), hosts(&["a"]), config, cancel);
    let run   = sched.run(|_| Ok(()));
    let count = timeout(Duration::from_secs(10), run).await.expect("shutdown stalled").unwrap();

    assert_eq!(count, 1);
    assert_eq!(exec.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn emit_error_shuts_down() {
    let exec  = Script::default()
        .host("a", &[Step::Ok(1), Step::Ok(2)])
        .build();
    let sched = Scheduler::new(exec.clone(), hosts(&["a"]), config(), Cancel::new());

    let run    = sched.run(|_| Err(anyhow!("broken pipe")));
    let result = timeout(Duration::from_secs(10), run).await.expect("shutdown stalled");

    assert_eq!(result.unwrap_err().to_string(), "broken pipe");
    assert_eq!(exec.calls.load(Ordering::SeqCst), 1);
}
