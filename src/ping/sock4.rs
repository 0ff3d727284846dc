use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use anyhow::Result;
use etherparse::{IpNumber, Ipv4Header};
use log::{debug, error, trace};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::unix::AsyncFd;
use tokio::sync::{broadcast, Mutex};
use crate::icmp::{icmp4::Unreachable, IcmpV4Packet};
use super::exec::{Options, Status};
use super::io::{dont_fragment, recv_from, send_to, PACKET_SIZE};
use super::probe::{decode4, Key, Probe};
use super::state::{Echo, State};

pub struct Sock4 {
    sock: Mutex<Arc<AsyncFd<Socket>>>,
}

impl Sock4 {
    pub fn new(state: Arc<State>, shutdown: broadcast::Receiver<()>) -> Result<Self> {
        let sock = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        sock.set_nonblocking(true)?;

        let sock = Arc::new(AsyncFd::new(sock)?);
        let rx   = sock.clone();

        tokio::spawn(async move {
            match recv(rx, state, shutdown).await {
                Ok(()) => debug!("recv4 finished"),
                Err(e) => error!("recv4 failed: {}", e),
            }
        });

        Ok(Self {
            sock: Mutex::new(sock),
        })
    }

    pub async fn send(&self, probe: &Probe<'_>, options: Options) -> Result<Instant> {
        let pkt  = probe.encode();
        let addr = SockAddr::from(SocketAddr::new(probe.addr, 0));

        let sock = self.sock.lock().await;
        sock.get_ref().set_ttl(options.ttl.into())?;
        dont_fragment(sock.get_ref(), options.dont_fragment)?;
        send_to(&sock, &pkt, &addr).await?;

        Ok(Instant::now())
    }
}

async fn recv(
    sock: Arc<AsyncFd<Socket>>,
    state: Arc<State>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let mut pkt = vec![0u8; PACKET_SIZE];
    loop {
        tokio::select! {
            result = recv_from(&sock, &mut pkt) => {
                let (n, _) = result?;
                let now = Instant::now();

                match classify(&pkt[..n]) {
                    Ok(Some((key, status))) => state.reply(&key, Echo(now, status)),
                    Ok(None)                => (),
                    Err(e)                  => trace!("ignoring packet: {}", e),
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }
    Ok(())
}

fn classify(pkt: &[u8]) -> Result<Option<(Key, Status)>> {
    let (head, tail) = Ipv4Header::read_from_slice(pkt)?;

    if head.protocol != ICMP4 {
        return Ok(None);
    }

    Ok(Some(match IcmpV4Packet::try_from(tail)? {
        IcmpV4Packet::EchoReply(echo) => {
            let src = IpAddr::V4(Ipv4Addr::from(head.source));
            (Key(src, echo.id, echo.seq), Status::Success)
        }
        IcmpV4Packet::Unreachable(Unreachable::Fragment(pkt)) => (decode4(pkt)?, Status::PacketTooBig),
        IcmpV4Packet::Unreachable(what)                       => (decode4(what.data())?, Status::Unreachable),
        IcmpV4Packet::TimeExceeded(pkt)                       => (decode4(pkt)?, Status::TtlExpired),
        IcmpV4Packet::ParameterProblem(pkt)                   => (decode4(pkt)?, Status::Failure),
        _                                                     => return Ok(None),
    }))
}

const ICMP4: u8 = IpNumber::Icmp as u8;
