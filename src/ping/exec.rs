use std::fmt;
use std::time::Duration;
use anyhow::Result;
use async_trait::async_trait;

/// One echo exchange with a single host.
///
/// `Ok` carries the outcome of the exchange, including timeouts and ICMP
/// errors. `Err` means the exchange could not be attempted at all and the
/// caller should not expect later attempts to fare better.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn send(
        &self,
        host:    &str,
        expiry:  Duration,
        payload: &[u8],
        options: Options,
    ) -> Result<Reply>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Options {
    pub ttl:           u8,
    pub dont_fragment: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub rtt:    Duration,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Success,
    TimedOut,
    Unreachable,
    PacketTooBig,
    TtlExpired,
    Failure,
}

impl Reply {
    pub fn new(status: Status, rtt: Duration) -> Self {
        Self { status, rtt }
    }

    pub fn success(rtt: Duration) -> Self {
        Self::new(Status::Success, rtt)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ttl:           64,
            dont_fragment: false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Success      => "success",
            Status::TimedOut     => "timed out",
            Status::Unreachable  => "destination unreachable",
            Status::PacketTooBig => "packet too big",
            Status::TtlExpired   => "ttl expired",
            Status::Failure      => "failure",
        })
    }
}
