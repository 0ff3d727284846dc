use std::convert::TryFrom;
use std::time::Duration;
use crate::ping::{Options, Reply, Status};
use super::config::Config;

/// Largest echo payload accepted by the platform.
pub const MAX_PAYLOAD: u32 = 65500;

/// Per-target work state, owned and mutated by a single worker.
#[derive(Debug)]
pub struct Target {
    host:    String,
    options: Options,
    size:    usize,
    expiry:  Duration,
    rtt:     u64,
    status:  Option<Status>,
    fatal:   bool,
}

/// Snapshot of a target handed to the scheduler at the end of a round.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Sample {
    pub rtt:    u64,
    pub status: Option<Status>,
    pub fatal:  bool,
}

impl Target {
    pub fn new(host: String, config: &Config) -> Self {
        let size = config.size.min(MAX_PAYLOAD) as usize;

        Self {
            host:    host,
            options: config.options,
            size:    size,
            expiry:  config.expiry,
            rtt:     0,
            status:  None,
            fatal:   false,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Record one probe outcome. Only a success moves the round-trip time,
    /// otherwise the last known good value is kept.
    pub fn record(&mut self, reply: &Reply) {
        self.status = Some(reply.status);
        if reply.status == Status::Success {
            self.rtt = u64::try_from(reply.rtt.as_millis()).unwrap_or(u64::MAX);
        }
    }

    pub fn fail(&mut self) {
        self.fatal = true;
    }

    pub fn sample(&self) -> Sample {
        Sample {
            rtt:    self.rtt,
            status: self.status,
            fatal:  self.fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(size: u32) -> Target {
        let config = Config { size, ..Config::default() };
        Target::new("192.0.2.1".to_owned(), &config)
    }

    #[test]
    fn payload_size_is_clamped() {
        assert_eq!(target(0).size(), 0);
        assert_eq!(target(32).size(), 32);
        assert_eq!(target(65500).size(), 65500);
        assert_eq!(target(65501).size(), 65500);
        assert_eq!(target(u32::MAX).size(), 65500);
    }

    #[test]
    fn failures_keep_last_known_rtt() {
        let mut target = target(32);
        assert_eq!(target.sample(), Sample::default());

        target.record(&Reply::success(Duration::from_millis(42)));
        target.record(&Reply::new(Status::TimedOut, Duration::from_secs(4)));

        assert_eq!(target.sample(), Sample {
            rtt:    42,
            status: Some(Status::TimedOut),
            fatal:  false,
        });

        target.record(&Reply::new(Status::Unreachable, Duration::ZERO));
        assert_eq!(target.sample().rtt, 42);

        target.record(&Reply::success(Duration::from_micros(7900)));
        assert_eq!(target.sample().rtt, 7);
    }

    #[test]
    fn fatal_is_sticky() {
        let mut target = target(32);
        target.fail();
        target.record(&Reply::success(Duration::from_millis(1)));
        assert!(target.is_fatal());
        assert!(target.sample().fatal);
    }
}
