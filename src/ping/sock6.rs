use std::convert::TryFrom;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use anyhow::Result;
use log::{debug, error, trace};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::unix::AsyncFd;
use tokio::sync::{broadcast, Mutex};
use crate::icmp::IcmpV6Packet;
use super::exec::{Options, Status};
use super::io::{recv_from, send_to, PACKET_SIZE};
use super::probe::{decode6, Key, Probe};
use super::state::{Echo, State};

pub struct Sock6 {
    sock: Mutex<Arc<AsyncFd<Socket>>>,
}

impl Sock6 {
    pub fn new(state: Arc<State>, shutdown: broadcast::Receiver<()>) -> Result<Self> {
        let sock = Socket::new(Domain::IPV6, Type::RAW, Some(Protocol::ICMPV6))?;
        sock.set_nonblocking(true)?;

        let sock = Arc::new(AsyncFd::new(sock)?);
        let rx   = sock.clone();

        tokio::spawn(async move {
            match recv(rx, state, shutdown).await {
                Ok(()) => debug!("recv6 finished"),
                Err(e) => error!("recv6 failed: {}", e),
            }
        });

        Ok(Self {
            sock: Mutex::new(sock),
        })
    }

    pub async fn send(&self, probe: &Probe<'_>, options: Options) -> Result<Instant> {
        let pkt  = probe.encode();
        let addr = SockAddr::from(SocketAddr::new(probe.addr, 0));

        if options.dont_fragment {
            trace!("don't fragment ignored for {}", probe.addr);
        }

        let sock = self.sock.lock().await;
        sock.get_ref().set_unicast_hops_v6(options.ttl.into())?;
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
                let (n, from) = result?;
                let now = Instant::now();

                match from.map(|from| classify(from.ip(), &pkt[..n])) {
                    Some(Ok(Some((key, status)))) => state.reply(&key, Echo(now, status)),
                    Some(Err(e))                  => trace!("ignoring packet: {}", e),
                    _                             => (),
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }
    Ok(())
}

fn classify(from: IpAddr, pkt: &[u8]) -> Result<Option<(Key, Status)>> {
    Ok(Some(match IcmpV6Packet::try_from(pkt)? {
        IcmpV6Packet::EchoReply(echo)              => (Key(from, echo.id, echo.seq), Status::Success),
        IcmpV6Packet::Unreachable(what)            => (decode6(what.data())?, Status::Unreachable),
        IcmpV6Packet::PacketTooBig(pkt)            => (decode6(pkt)?, Status::PacketTooBig),
        IcmpV6Packet::HopLimitExceeded(pkt)        => (decode6(pkt)?, Status::TtlExpired),
        IcmpV6Packet::ReassemblyTimeExceeded(pkt)  => (decode6(pkt)?, Status::Failure),
        IcmpV6Packet::ParameterProblem(pkt)        => (decode6(pkt)?, Status::Failure),
        _                                          => return Ok(None),
    }))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv6Addr;
    use etherparse::{IpNumber, Ipv6Header};
    use super::*;

    #[test]
    fn classify_echo_reply_uses_sender() {
        let from = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let pkt  = [129, 0, 0, 0, 0, 5, 0, 6];

        let key = Key(from, 5, 6);
        assert_eq!(classify(from, &pkt).unwrap(), Some((key, Status::Success)));
    }

    #[test]
    fn classify_unreachable_decodes_embedded_request() {
        let src: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let dst: Ipv6Addr = "2001:db8::2".parse().unwrap();
        let probe = Probe::new(dst.into(), 5, 6, &[1, 2, 3]);
        let echo  = probe.encode();

        let head = Ipv6Header {
            traffic_class:   0,
            flow_label:      0,
            payload_length:  u16::try_from(echo.len()).unwrap(),
            next_header:     IpNumber::IPv6Icmp as u8,
            hop_limit:       64,
            source:          src.octets(),
            destination:     dst.octets(),
        };

        let mut pkt = vec![1, 3, 0, 0, 0, 0, 0, 0];
        head.write(&mut pkt).unwrap();
        pkt.extend_from_slice(&echo);

        let router = "2001:db8::ff".parse().unwrap();
        let result = classify(router, &pkt).unwrap();
        assert_eq!(result, Some((probe.key(), Status::Unreachable)));
    }
}
