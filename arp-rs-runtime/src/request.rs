use arp_rs_packets::{self as packets, ArpPacket, HardwareAddr, Operation};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

/// An ARP packet as handed to a `Handler`, with owned copies of its addresses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub operation: Operation,
    pub sender_hardware_addr: HardwareAddr,
    pub sender_ip: Ipv4Addr,
    pub target_hardware_addr: HardwareAddr,
    pub target_ip: Ipv4Addr,
}

impl TryFrom<&ArpPacket> for Request {
    type Error = packets::Error;

    /// Fails with `InvalidProtocolAddress` unless both protocol addresses are 4 bytes long.
    fn try_from(packet: &ArpPacket) -> packets::Result<Self> {
        let sender_ip = packet
            .sender_ipv4_addr()
            .ok_or(packets::Error::InvalidProtocolAddress)?;
        let target_ip = packet
            .target_ipv4_addr()
            .ok_or(packets::Error::InvalidProtocolAddress)?;
        Ok(Request {
            operation: packet.operation,
            sender_hardware_addr: HardwareAddr::from(packet.sender_hardware_addr()),
            sender_ip,
            target_hardware_addr: HardwareAddr::from(packet.target_hardware_addr()),
            target_ip,
        })
    }
}

/// Decodes a raw Ethernet frame into a `Request`.
pub fn parse_request(buf: &[u8]) -> packets::Result<Request> {
    let (packet, _) = packets::parse_packet(buf)?;
    Request::try_from(&packet)
}
