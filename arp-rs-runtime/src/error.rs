use arp_rs_packets as packets;
use std::{error, fmt, io};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A packet could not be built, decoded, or framed.
    Packet(packets::Error),
    /// The interface has no IPv4 address to send requests from.
    NoIpv4Address,
    Io(io::Error),
}

impl Error {
    /// Returns true if the error is an expired read or write deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Packet(e) => write!(f, "packet error: {}", e),
            Error::NoIpv4Address => write!(f, "no IPv4 address available for interface"),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Packet(e) => Some(e),
            Error::NoIpv4Address => None,
            Error::Io(e) => Some(e),
        }
    }
}

impl From<packets::Error> for Error {
    fn from(e: packets::Error) -> Self {
        Error::Packet(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
