use std::convert::{TryFrom, TryInto};
use anyhow::{anyhow, Error};

pub const ECHO_SIZE: usize = 4;

#[derive(Debug)]
pub struct Echo<'a> {
    pub id:   u16,
    pub seq:  u16,
    pub data: &'a [u8]
}

impl<'a> TryFrom<&'a [u8]> for Echo<'a> {
    type Error = Error;

    fn try_from(slice: &'a [u8]) -> Result<Self, Self::Error> {
        if slice.len() < ECHO_SIZE {
            return Err(anyhow!("short echo"));
        }

        Ok(Self {
            id:   u16::from_be_bytes(slice[0..2].try_into()?),
            seq:  u16::from_be_bytes(slice[2..4].try_into()?),
            data: &slice[ECHO_SIZE..]
        })
    }
}

impl Echo<'_> {
    pub fn encode(&self, kind: u8) -> Vec<u8> {
        let mut pkt = Vec::with_capacity(ECHO_SIZE + 4 + self.data.len());
        pkt.extend_from_slice(&[kind, 0, 0, 0]);
        pkt.extend_from_slice(&self.id.to_be_bytes());
        pkt.extend_from_slice(&self.seq.to_be_bytes());
        pkt.extend_from_slice(self.data);
        pkt
    }
}
