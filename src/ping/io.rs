use std::io::{self, Error};
use std::mem::{size_of, MaybeUninit};
use std::net::SocketAddr;
use std::os::unix::io::AsRawFd;
use anyhow::Result;
use libc::{c_int, c_void, socklen_t};
use socket2::{SockAddr, Socket};
use tokio::io::unix::AsyncFd;

pub const PACKET_SIZE: usize = 65536;

pub async fn send_to(sock: &AsyncFd<Socket>, pkt: &[u8], addr: &SockAddr) -> io::Result<usize> {
    loop {
        let mut guard = sock.writable().await?;
        match guard.try_io(|fd| fd.get_ref().send_to(pkt, addr)) {
            Ok(result) => return result,
            Err(_)     => continue,
        }
    }
}

pub async fn recv_from(sock: &AsyncFd<Socket>, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)> {
    loop {
        let mut guard = sock.readable().await?;
        match guard.try_io(|fd| fd.get_ref().recv_from(uninit(buf))) {
            Ok(result) => return result.map(|(n, from)| (n, from.as_socket())),
            Err(_)     => continue,
        }
    }
}

#[cfg(target_os = "linux")]
pub fn dont_fragment(sock: &Socket, enable: bool) -> Result<()> {
    let value = match enable {
        true  => libc::IP_PMTUDISC_DO,
        false => libc::IP_PMTUDISC_DONT,
    };
    setsockopt(sock, libc::IPPROTO_IP, libc::IP_MTU_DISCOVER, value)
}

#[cfg(not(target_os = "linux"))]
pub fn dont_fragment(_sock: &Socket, enable: bool) -> Result<()> {
    if enable {
        log::debug!("don't fragment unsupported on this platform");
    }
    Ok(())
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn setsockopt(sock: &Socket, level: c_int, name: c_int, value: c_int) -> Result<()> {
    unsafe {
        let fd  = sock.as_raw_fd();
        let ptr = &value as *const c_int as *const c_void;
        let len = size_of::<c_int>() as socklen_t;
        match libc::setsockopt(fd, level, name, ptr, len) {
            0 => Ok(()),
            _ => Err(Error::last_os_error().into())
        }
    }
}

fn uninit(buf: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    // recv only ever writes initialized bytes into the buffer
    unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) }
}
