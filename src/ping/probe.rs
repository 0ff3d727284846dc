use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use anyhow::{anyhow, Result};
use etherparse::{IpNumber, Ipv4Header, Ipv6Header};
use crate::icmp::{icmp4, icmp6, Echo, IcmpV4Packet, IcmpV6Packet};

#[derive(Debug)]
pub struct Probe<'a> {
    pub addr: IpAddr,
    pub id:   u16,
    pub seq:  u16,
    pub data: &'a [u8],
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Key(pub IpAddr, pub u16, pub u16);

impl<'a> Probe<'a> {
    pub fn new(addr: IpAddr, id: u16, seq: u16, data: &'a [u8]) -> Self {
        Self { addr, id, seq, data }
    }

    pub fn key(&self) -> Key {
        Key(self.addr, self.id, self.seq)
    }

    pub fn encode(&self) -> Vec<u8> {
        let echo = Echo { id: self.id, seq: self.seq, data: self.data };

        match self.addr {
            IpAddr::V4(_) => {
                let mut pkt = echo.encode(icmp4::ECHO_REQUEST);
                let cksum = icmp4::checksum(&pkt).to_be_bytes();
                pkt[2..4].copy_from_slice(&cksum);
                pkt
            }
            IpAddr::V6(_) => echo.encode(icmp6::ECHO_REQUEST),
        }
    }
}

pub fn decode4(pkt: &[u8]) -> Result<Key> {
    let (head, tail) = Ipv4Header::read_from_slice(pkt)?;

    if head.protocol != ICMP4 {
        return Err(anyhow!("unsupported protocol: {}", head.protocol));
    }

    match IcmpV4Packet::try_from(tail)? {
        IcmpV4Packet::EchoRequest(echo) => {
            let dst = Ipv4Addr::from(head.destination);
            Ok(Key(dst.into(), echo.id, echo.seq))
        }
        other => Err(anyhow!("not an echo request: {:?}", other)),
    }
}

pub fn decode6(pkt: &[u8]) -> Result<Key> {
    let (head, tail) = Ipv6Header::read_from_slice(pkt)?;

    if head.next_header != ICMP6 {
        return Err(anyhow!("unsupported protocol: {}", head.next_header));
    }

    match IcmpV6Packet::try_from(tail)? {
        IcmpV6Packet::EchoRequest(echo) => {
            let dst = Ipv6Addr::from(head.destination);
            Ok(Key(dst.into(), echo.id, echo.seq))
        }
        other => Err(anyhow!("not an echo request: {:?}", other)),
    }
}

const ICMP4: u8 = IpNumber::Icmp     as u8;
const ICMP6: u8 = IpNumber::IPv6Icmp as u8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_v4_checksums_payload() {
        let addr  = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let data  = [7u8; 33];
        let probe = Probe::new(addr, 0x1234, 2, &data);
        let pkt   = probe.encode();

        assert_eq!(pkt.len(), icmp4::HEADER_SIZE + data.len());
        assert_eq!(pkt[0], icmp4::ECHO_REQUEST);
        assert_eq!(&pkt[4..8], &[0x12, 0x34, 0, 2]);
        assert_eq!(icmp4::checksum(&pkt), 0);
    }

    #[test]
    fn encode_v6_leaves_checksum_to_kernel() {
        let addr  = "2001:db8::1".parse().unwrap();
        let probe = Probe::new(addr, 1, 1, &[]);
        let pkt   = probe.encode();

        assert_eq!(pkt, vec![icmp6::ECHO_REQUEST, 0, 0, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn decode_embedded_request() {
        let src   = [10, 0, 0, 1];
        let dst   = Ipv4Addr::new(192, 0, 2, 9);
        let probe = Probe::new(dst.into(), 77, 5, &[1, 2, 3, 4]);
        let icmp  = probe.encode();

        let len  = u16::try_from(icmp.len()).unwrap();
        let head = Ipv4Header::new(len, 3, IpNumber::Icmp, src, dst.octets());

        let mut pkt = Vec::new();
        head.write(&mut pkt).unwrap();
        pkt.extend_from_slice(&icmp[..icmp4::HEADER_SIZE]);

        assert_eq!(decode4(&pkt).unwrap(), probe.key());
    }

    #[test]
    fn decode_rejects_other_protocols() {
        let head = Ipv4Header::new(8, 3, IpNumber::Udp, [10, 0, 0, 1], [10, 0, 0, 2]);

        let mut pkt = Vec::new();
        head.write(&mut pkt).unwrap();
        pkt.extend_from_slice(&[0u8; 8]);

        assert!(decode4(&pkt).is_err());
    }
}
