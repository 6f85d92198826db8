use std::error;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures produced while building, encoding, or decoding frames and ARP packets.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// A hardware address is too short, or the sender and target lengths disagree.
    InvalidHardwareAddress,
    /// A protocol address can't be represented as an IPv4 address.
    InvalidProtocolAddress,
    /// The buffer ends before the header or the declared addresses do.
    ShortBuffer,
    /// The enclosing frame does not carry the ARP ether type.
    NotArp,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidHardwareAddress => write!(f, "invalid hardware address"),
            Error::InvalidProtocolAddress => write!(f, "invalid IPv4 address"),
            Error::ShortBuffer => write!(f, "buffer too short"),
            Error::NotArp => write!(f, "frame does not have ARP ether type"),
        }
    }
}

impl error::Error for Error {}
