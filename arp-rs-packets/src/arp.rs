use crate::*;
use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

///
/// An ARP operation code. RFC 826 defines request and reply; any other value is carried through
/// encode/decode untouched.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Operation(pub u16);

impl Operation {
    pub const REQUEST: Operation = Operation(1);
    pub const REPLY: Operation = Operation(2);
}

impl From<u16> for Operation {
    fn from(code: u16) -> Self {
        Operation(code)
    }
}

impl From<Operation> for u16 {
    fn from(op: Operation) -> Self {
        op.0
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operation::REQUEST => write!(f, "Request"),
            Operation::REPLY => write!(f, "Reply"),
            Operation(code) => write!(f, "Operation({})", code),
        }
    }
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_OFFSET: usize = 4;
const PROTOCOL_ADDR_LEN_OFFSET: usize = 5;
const OPCODE_RANGE: (usize, usize) = (6, 8);

/// Size of the fixed part of an ARP packet, before the addresses.
pub const ARP_HEADER_LEN: usize = 8;

/// Minimum length of a MAC address accepted by [`ArpPacket::new`].
const MIN_HARDWARE_ADDR_LEN: usize = 6;

///
/// Anything that might name an IPv4 address. Used by [`ArpPacket::new`] so callers can pass typed
/// addresses or raw bytes pulled off the wire.
///
pub trait ToIpv4Addr {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr>;
}

impl ToIpv4Addr for Ipv4Addr {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr> {
        Some(*self)
    }
}

impl ToIpv4Addr for Ipv6Addr {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr> {
        ipv4_mapped(self)
    }
}

impl ToIpv4Addr for IpAddr {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr> {
        match self {
            IpAddr::V4(ipv4) => Some(*ipv4),
            IpAddr::V6(ipv6) => ipv4_mapped(ipv6),
        }
    }
}

impl ToIpv4Addr for [u8] {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr> {
        match self.len() {
            4 => Some(Ipv4Addr::new(self[0], self[1], self[2], self[3])),
            16 => ipv4_mapped(&Ipv6Addr::from(<[u8; 16]>::try_from(self).ok()?)),
            _ => None,
        }
    }
}

impl ToIpv4Addr for Vec<u8> {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr> {
        self.as_slice().to_ipv4_addr()
    }
}

impl<T: ToIpv4Addr + ?Sized> ToIpv4Addr for &T {
    fn to_ipv4_addr(&self) -> Option<Ipv4Addr> {
        (**self).to_ipv4_addr()
    }
}

// ::ffff:a.b.c.d only; the deprecated IPv4-compatible form is not an IPv4 address.
fn ipv4_mapped(addr: &Ipv6Addr) -> Option<Ipv4Addr> {
    match addr.octets() {
        [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, a, b, c, d] => Some(Ipv4Addr::new(a, b, c, d)),
        _ => None,
    }
}

///
/// An ARP packet as described in RFC 826
/// https://tools.ietf.org/html/rfc826
///
/// The four addresses live in a single owned buffer, laid out in wire order. The header scalars
/// are public; the declared lengths may be rewritten to disagree with the stored addresses, in
/// which case `encode` produces exactly what the lengths claim.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArpPacket {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_addr_len: u8,
    pub protocol_addr_len: u8,
    pub operation: Operation,
    addrs: Box<[u8]>,
    hlen: usize,
    plen: usize,
}

impl ArpPacket {
    ///
    /// Builds a packet from typed addresses.
    ///
    /// Fails with `InvalidHardwareAddress` if either hardware address is shorter than 6 bytes or
    /// the two lengths differ, and with `InvalidProtocolAddress` if either protocol address is not
    /// an IPv4 address.
    ///
    pub fn new<S, T>(
        operation: Operation,
        sender_hardware_addr: &[u8],
        sender_protocol_addr: S,
        target_hardware_addr: &[u8],
        target_protocol_addr: T,
    ) -> Result<ArpPacket>
    where
        S: ToIpv4Addr,
        T: ToIpv4Addr,
    {
        if sender_hardware_addr.len() < MIN_HARDWARE_ADDR_LEN
            || target_hardware_addr.len() < MIN_HARDWARE_ADDR_LEN
            || sender_hardware_addr.len() != target_hardware_addr.len()
        {
            return Err(Error::InvalidHardwareAddress);
        }
        // ARP can only declare lengths up to 255.
        let hardware_addr_len =
            u8::try_from(sender_hardware_addr.len()).map_err(|_| Error::InvalidHardwareAddress)?;

        let sender_ip = sender_protocol_addr
            .to_ipv4_addr()
            .ok_or(Error::InvalidProtocolAddress)?;
        let target_ip = target_protocol_addr
            .to_ipv4_addr()
            .ok_or(Error::InvalidProtocolAddress)?;

        Ok(ArpPacket::from_addrs(
            ArpHardwareType::Ethernet as u16,
            IPV4_ETHER_TYPE,
            operation,
            hardware_addr_len,
            4,
            [
                sender_hardware_addr,
                &sender_ip.octets(),
                target_hardware_addr,
                &target_ip.octets(),
            ],
        ))
    }

    ///
    /// Decodes a packet from the start of `buf`. Trailing bytes (e.g. Ethernet padding) are
    /// ignored. The returned packet owns copies of its addresses.
    ///
    pub fn decode(buf: &[u8]) -> Result<ArpPacket> {
        let empty: &[u8] = &[];
        let mut packet = ArpPacket::from_addrs(0, 0, Operation(0), 0, 0, [empty; 4]);
        packet.decode_from(buf)?;
        Ok(packet)
    }

    ///
    /// Re-decodes `buf` into this packet. On failure the packet is left unchanged.
    ///
    pub fn decode_from(&mut self, buf: &[u8]) -> Result<()> {
        // Must have enough room to retrieve the address lengths
        if buf.len() < ARP_HEADER_LEN {
            return Err(Error::ShortBuffer);
        }

        let hlen = buf[HARDWARE_ADDR_LEN_OFFSET] as usize;
        let plen = buf[PROTOCOL_ADDR_LEN_OFFSET] as usize;
        let end = ARP_HEADER_LEN + 2 * hlen + 2 * plen;
        if buf.len() < end {
            return Err(Error::ShortBuffer);
        }

        self.hardware_type = read_u16(buf, HARDWARE_TYPE_RANGE);
        self.protocol_type = read_u16(buf, PROTOCOL_TYPE_RANGE);
        self.hardware_addr_len = hlen as u8;
        self.protocol_addr_len = plen as u8;
        self.operation = Operation(read_u16(buf, OPCODE_RANGE));
        // The address block is contiguous on the wire, so one copy carries all four.
        self.addrs = Box::from(&buf[ARP_HEADER_LEN..end]);
        self.hlen = hlen;
        self.plen = plen;
        Ok(())
    }

    ///
    /// Encodes the packet. The output is sized from the declared lengths; each stored address is
    /// copied into its declared slot, so lying lengths give malformed output rather than an error.
    ///
    pub fn encode(&self) -> Vec<u8> {
        let hlen = self.hardware_addr_len as usize;
        let plen = self.protocol_addr_len as usize;
        let mut buf = vec![0; ARP_HEADER_LEN + 2 * hlen + 2 * plen];

        write_u16(&mut buf, HARDWARE_TYPE_RANGE, self.hardware_type);
        write_u16(&mut buf, PROTOCOL_TYPE_RANGE, self.protocol_type);
        buf[HARDWARE_ADDR_LEN_OFFSET] = self.hardware_addr_len;
        buf[PROTOCOL_ADDR_LEN_OFFSET] = self.protocol_addr_len;
        write_u16(&mut buf, OPCODE_RANGE, self.operation.0);

        let fields = [
            (self.sender_hardware_addr(), hlen),
            (self.sender_protocol_addr(), plen),
            (self.target_hardware_addr(), hlen),
            (self.target_protocol_addr(), plen),
        ];
        let mut offset = ARP_HEADER_LEN;
        for (addr, declared) in fields.iter() {
            let n = addr.len().min(*declared);
            buf[offset..offset + n].copy_from_slice(&addr[..n]);
            offset += declared;
        }
        buf
    }

    pub fn sender_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.sender_hardware_addr_range();
        &self.addrs[start..end]
    }

    pub fn sender_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.sender_protocol_addr_range();
        &self.addrs[start..end]
    }

    pub fn target_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.target_hardware_addr_range();
        &self.addrs[start..end]
    }

    pub fn target_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.target_protocol_addr_range();
        &self.addrs[start..end]
    }

    /// The sender protocol address, if it is 4 bytes long.
    pub fn sender_ipv4_addr(&self) -> Option<Ipv4Addr> {
        ipv4_from_bytes(self.sender_protocol_addr())
    }

    /// The target protocol address, if it is 4 bytes long.
    pub fn target_ipv4_addr(&self) -> Option<Ipv4Addr> {
        ipv4_from_bytes(self.target_protocol_addr())
    }

    fn from_addrs(
        hardware_type: u16,
        protocol_type: u16,
        operation: Operation,
        hardware_addr_len: u8,
        protocol_addr_len: u8,
        addrs: [&[u8]; 4],
    ) -> ArpPacket {
        ArpPacket {
            hardware_type,
            protocol_type,
            hardware_addr_len,
            protocol_addr_len,
            operation,
            addrs: addrs.concat().into_boxed_slice(),
            hlen: hardware_addr_len as usize,
            plen: protocol_addr_len as usize,
        }
    }

    // Offsets into `addrs`, following the stored lengths rather than the declared ones.
    fn sender_hardware_addr_range(&self) -> (usize, usize) {
        (0, self.hlen)
    }

    fn sender_protocol_addr_range(&self) -> (usize, usize) {
        let start = self.hlen;
        (start, start + self.plen)
    }

    fn target_hardware_addr_range(&self) -> (usize, usize) {
        let start = self.hlen + self.plen;
        (start, start + self.hlen)
    }

    fn target_protocol_addr_range(&self) -> (usize, usize) {
        let start = 2 * self.hlen + self.plen;
        (start, start + self.plen)
    }
}

impl TryFrom<&[u8]> for ArpPacket {
    type Error = Error;

    fn try_from(buf: &[u8]) -> Result<Self> {
        ArpPacket::decode(buf)
    }
}

impl TryFrom<&EthernetFrame> for ArpPacket {
    type Error = Error;

    ///
    /// Decodes the payload of the frame, which must carry the ARP ether type.
    ///
    fn try_from(frame: &EthernetFrame) -> Result<Self> {
        if frame.ether_type() != ARP_ETHER_TYPE {
            return Err(Error::NotArp);
        }
        ArpPacket::decode(frame.payload())
    }
}

impl ArpPacket {
    ///
    /// Encodes the packet and wraps it in an Ethernet frame sent from the sender hardware address
    /// to the target hardware address. Both must be 6-byte MAC addresses.
    ///
    pub fn to_ethernet_frame(&self) -> Result<EthernetFrame> {
        let dest = MacAddr::try_from(self.target_hardware_addr())?;
        let src = MacAddr::try_from(self.sender_hardware_addr())?;
        Ok(EthernetFrame::encap_arp(dest, src, &self.encode()))
    }
}

///
/// Decodes an Ethernet frame and the ARP packet inside it. Frames with any other ether type fail
/// with `NotArp`.
///
pub fn parse_packet(buf: &[u8]) -> Result<(ArpPacket, EthernetFrame)> {
    let frame = EthernetFrame::try_from(buf)?;
    let packet = ArpPacket::try_from(&frame)?;
    Ok((packet, frame))
}

fn read_u16(buf: &[u8], (start, end): (usize, usize)) -> u16 {
    u16::from_be_bytes(buf[start..end].try_into().unwrap())
}

fn write_u16(buf: &mut [u8], (start, end): (usize, usize), value: u16) {
    buf[start..end].copy_from_slice(&value.to_be_bytes());
}

fn ipv4_from_bytes(bytes: &[u8]) -> Option<Ipv4Addr> {
    <[u8; 4]>::try_from(bytes).ok().map(Ipv4Addr::from)
}
