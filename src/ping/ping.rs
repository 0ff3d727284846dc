use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};
use anyhow::{anyhow, Error, Result};
use async_trait::async_trait;
use log::{debug, error, warn};
use rand::random;
use tokio::net::lookup_host;
use tokio::sync::broadcast;
use tokio::time::timeout;
use super::exec::{Executor, Options, Reply, Status};
use super::state::{Echo, State};
use super::{probe::Probe, sock4::Sock4, sock6::Sock6};

/// Raw socket ICMP echo executor shared by every worker.
///
/// Needs `CAP_NET_RAW` (or root) and must be created inside a tokio
/// runtime, which hosts the background receive tasks.
pub struct Pinger {
    sock4:    Sock4,
    sock6:    Option<Sock6>,
    state:    Arc<State>,
    ident:    u16,
    seq:      AtomicU16,
    shutdown: broadcast::Sender<()>,
}

impl Pinger {
    pub fn new() -> Result<Self> {
        let state = Arc::new(State::default());

        let (notify_shutdown, _) = broadcast::channel(1);

        let sock4 = Sock4::new(state.clone(), notify_shutdown.subscribe())?;
        let sock6 = match Sock6::new(state.clone(), notify_shutdown.subscribe()) {
            Ok(sock6) => Some(sock6),
            Err(e)    => {
                warn!("IPv6 unavailable: {}", e);
                None
            }
        };

        Ok(Self {
            sock4,
            sock6,
            state,
            ident:    random(),
            seq:      AtomicU16::new(0),
            shutdown: notify_shutdown,
        })
    }

    async fn probe(&self, probe: &Probe<'_>, expiry: Duration, options: Options) -> Result<Reply> {
        let rx = self.state.insert(probe.key());

        let sent = match self.transmit(probe, options).await {
            Ok(sent) => sent,
            Err(e)   => return refused(e),
        };

        Ok(match timeout(expiry, rx).await {
            Ok(echo) => {
                let Echo(when, status) = echo?;
                Reply::new(status, when.saturating_duration_since(sent))
            }
            Err(_) => Reply::new(Status::TimedOut, expiry),
        })
    }

    async fn transmit(&self, probe: &Probe<'_>, options: Options) -> Result<Instant> {
        match (probe.addr, &self.sock6) {
            (IpAddr::V4(_), _)          => self.sock4.send(probe, options).await,
            (IpAddr::V6(_), Some(sock)) => sock.send(probe, options).await,
            (IpAddr::V6(_), None)       => Err(anyhow!("IPv6 unavailable")),
        }
    }
}

#[async_trait]
impl Executor for Pinger {
    async fn send(
        &self,
        host:    &str,
        expiry:  Duration,
        payload: &[u8],
        options: Options,
    ) -> Result<Reply> {
        let addr  = resolve(host).await?;
        let seq   = self.seq.fetch_add(1, Ordering::Relaxed);
        let probe = Probe::new(addr, self.ident, seq, payload);

        let reply = self.probe(&probe, expiry, options).await?;
        debug!("{} ({}) seq {}: {} in {:?}", host, addr, seq, reply.status, reply.rtt);

        Ok(reply)
    }
}

impl Drop for Pinger {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown.send(()) {
            error!("background task shutdown failed: {}", e);
        }
    }
}

async fn resolve(host: &str) -> Result<IpAddr> {
    if let Ok(addr) = host.parse::<IpAddr>() {
        return Ok(addr);
    }

    let addr = format!("{}:0", host);
    let ip = lookup_host(&addr).await?.next().map(|sa| sa.ip()).ok_or_else(|| {
        anyhow!("unable to resolve {}", host)
    });
    ip
}

fn refused(e: Error) -> Result<Reply> {
    let errno = e.downcast_ref::<io::Error>().and_then(io::Error::raw_os_error);
    let status = match errno {
        Some(libc::EHOSTUNREACH) => Status::Unreachable,
        Some(libc::ENETUNREACH)  => Status::Unreachable,
        Some(libc::EMSGSIZE)     => Status::PacketTooBig,
        _                        => return Err(e),
    };
    Ok(Reply::new(status, Duration::ZERO))
}
