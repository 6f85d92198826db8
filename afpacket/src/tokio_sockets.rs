use crate::sockets;
use std::{ffi::CStr, io};
use tokio::io::unix::AsyncFd;

/// Represents a bound `AF_PACKET` socket for use with Tokio. At this phase in a
/// socket's lifecycle, it can be read and written from.
///
/// Every operation takes `&self`, so one socket can be shared between a reader
/// and any number of concurrent writers.
pub struct AsyncBoundSocket {
    sock: AsyncFd<sockets::BoundSocket>,
}

impl AsyncBoundSocket {
    /// Constructs an `AsyncBoundSocket` from a network interface name, receiving only frames with
    /// the given ether type.
    pub fn from_interface_with_protocol(iface: impl AsRef<CStr>, protocol: u16) -> io::Result<Self> {
        let mut sock = sockets::Socket::with_protocol(protocol)?;
        sock.set_nonblocking(true)?;
        let sock = sock.bind(iface)?;
        Ok(Self {
            sock: AsyncFd::new(sock)?,
        })
    }

    /// Turns promiscuous mode on or off on this NIC. Useful for receiving all packets on an
    /// interface, including those not addressed to the device.
    pub fn set_promiscuous(&self, p: bool) -> io::Result<()> {
        self.sock.get_ref().set_promiscuous(p)
    }

    /// Sends a frame to the given link-layer address, waiting until the socket is writable.
    pub async fn send_to(&self, frame: &[u8], dest: &[u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.sock.writable().await?;
            match guard.try_io(|inner| inner.get_ref().send_to(frame, dest)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    /// Receives a frame, waiting until one is available.
    pub async fn recv_from(&self, frame: &mut [u8]) -> io::Result<(usize, sockets::Addr)> {
        loop {
            let mut guard = self.sock.readable().await?;
            match guard.try_io(|inner| inner.get_ref().recv_from(frame)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}
