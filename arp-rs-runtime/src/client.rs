use crate::{Interface, PacketConn, Result};
use arp_rs_packets::{self as packets, ArpPacket, EthernetFrame, HardwareAddr, Operation};
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::trace;

/// Largest frame we expect to read off an Ethernet link.
pub const MTU: usize = 1500;

/// An ARP client bound to one interface.
///
/// A client sends from the interface's hardware address and its first IPv4 address. Reads are
/// not demultiplexed: only one task should call `read` or `resolve` at a time, or replies will
/// be split between them.
pub struct Client<C> {
    conn: C,
    hardware_addr: HardwareAddr,
    ip: Ipv4Addr,
}

impl<C: PacketConn> Client<C> {
    /// Creates a client that sends from `ifi` over `conn`. Fails with `NoIpv4Address` if the
    /// interface has no IPv4 address.
    pub fn new(ifi: &Interface, conn: C) -> Result<Self> {
        let ip = ifi.ipv4_addr()?;
        Ok(Client {
            conn,
            hardware_addr: ifi.hardware_addr.clone(),
            ip,
        })
    }

    /// Broadcasts a request for the hardware address of `ip`. Does not wait for a reply.
    pub async fn request(&self, ip: Ipv4Addr) -> Result<()> {
        let broadcast = HardwareAddr::broadcast(self.hardware_addr.len());
        let packet = ArpPacket::new(
            Operation::REQUEST,
            &self.hardware_addr,
            self.ip,
            &broadcast,
            ip,
        )?;
        self.write_to(&packet, &broadcast).await?;
        Ok(())
    }

    /// Sends a request for `ip` and waits for the matching reply, returning the hardware address
    /// it came from. Packets that are not replies from `ip` are discarded. Bound the wait with a
    /// read deadline.
    pub async fn resolve(&self, ip: Ipv4Addr) -> Result<HardwareAddr> {
        self.request(ip).await?;

        loop {
            let (packet, _) = self.read().await?;
            if packet.operation != Operation::REPLY
                || packet.sender_protocol_addr() != &ip.octets()[..]
            {
                trace!(
                    operation = %packet.operation,
                    "discarding ARP packet while resolving {}",
                    ip
                );
                continue;
            }
            return Ok(HardwareAddr::from(packet.sender_hardware_addr()));
        }
    }

    /// Reads the next ARP packet, along with the frame that carried it. Frames of any other
    /// ether type are skipped; any other decode failure is returned.
    pub async fn read(&self) -> Result<(ArpPacket, EthernetFrame)> {
        let mut buf = vec![0; MTU];
        loop {
            let (n, from) = self.conn.recv_from(&mut buf).await?;
            match packets::parse_packet(&buf[..n]) {
                Ok(parsed) => return Ok(parsed),
                Err(packets::Error::NotArp) => {
                    trace!("skipping non-ARP frame from {}", from);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Frames `packet` and writes it to `addr`. The frame is sent from the packet's sender
    /// hardware address to its target hardware address, both of which must be MAC addresses.
    pub async fn write_to(&self, packet: &ArpPacket, addr: &HardwareAddr) -> Result<usize> {
        let frame = packet.to_ethernet_frame()?;
        Ok(self.conn.send_to(frame.as_bytes(), addr).await?)
    }

    /// Answers `request` on behalf of `ip`, claiming it lives at `hardware_addr`.
    pub async fn reply(
        &self,
        request: &ArpPacket,
        hardware_addr: &HardwareAddr,
        ip: Ipv4Addr,
    ) -> Result<()> {
        let packet = ArpPacket::new(
            Operation::REPLY,
            hardware_addr,
            ip,
            request.sender_hardware_addr(),
            request.sender_protocol_addr(),
        )?;
        let to = HardwareAddr::from(request.sender_hardware_addr());
        self.write_to(&packet, &to).await?;
        Ok(())
    }

    pub fn set_deadline(&self, t: Option<Instant>) -> Result<()> {
        Ok(self.conn.set_deadline(t)?)
    }

    pub fn set_read_deadline(&self, t: Option<Instant>) -> Result<()> {
        Ok(self.conn.set_read_deadline(t)?)
    }

    pub fn set_write_deadline(&self, t: Option<Instant>) -> Result<()> {
        Ok(self.conn.set_write_deadline(t)?)
    }

    pub fn close(&self) -> Result<()> {
        Ok(self.conn.close()?)
    }

    pub fn hardware_addr(&self) -> &HardwareAddr {
        &self.hardware_addr
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }
}
