use afpacket;
use arp_rs_packets::HardwareAddr;
use arp_rs_runtime::conn::{CloseSignal, Deadlines};
use arp_rs_runtime::PacketConn;
use futures::future::BoxFuture;
use std::{ffi::CString, io, time::Instant};

/// A `PacketConn` over an `AF_PACKET` socket that only sees ARP frames.
///
/// Closing the connection wakes pending reads; the socket itself is released when the
/// connection is dropped.
pub struct AfPacketConn {
    sock: afpacket::AsyncBoundSocket,
    closed: CloseSignal,
    deadlines: Deadlines,
}

impl AfPacketConn {
    /// Opens an ARP socket bound to the named interface. Needs `CAP_NET_RAW`.
    pub fn bind(iface_name: &str) -> io::Result<Self> {
        let name = CString::new(iface_name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let sock = afpacket::AsyncBoundSocket::from_interface_with_protocol(
            &name,
            afpacket::ETH_P_ARP,
        )?;
        Ok(AfPacketConn {
            sock,
            closed: CloseSignal::new(),
            deadlines: Deadlines::new(),
        })
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_closed()
    }
}

impl PacketConn for AfPacketConn {
    fn recv_from<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> BoxFuture<'a, io::Result<(usize, HardwareAddr)>> {
        Box::pin(self.closed.guard_read(self.deadlines.read_within(async move {
            let (n, from) = self.sock.recv_from(buf).await?;
            Ok((n, HardwareAddr::from(from.hardware_addr())))
        })))
    }

    fn send_to<'a>(
        &'a self,
        buf: &'a [u8],
        addr: &'a HardwareAddr,
    ) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(
            self.closed
                .guard_write(self.deadlines.write_within(self.sock.send_to(buf, addr))),
        )
    }

    fn close(&self) -> io::Result<()> {
        self.closed.close();
        Ok(())
    }

    fn set_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        self.deadlines.set(t);
        Ok(())
    }

    fn set_read_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        self.deadlines.set_read(t);
        Ok(())
    }

    fn set_write_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        self.deadlines.set_write(t);
        Ok(())
    }
}
