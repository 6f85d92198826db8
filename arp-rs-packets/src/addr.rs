use crate::Error;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

//Most significant byte is 0th
#[derive(Eq, Clone, Copy, Debug, Hash, PartialEq)]
pub struct MacAddr {
    pub bytes: [u8; 6],
}

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr { bytes: [0xff; 6] };

    pub fn new(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl TryFrom<&[u8]> for MacAddr {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes = <[u8; 6]>::try_from(bytes).map_err(|_| Error::InvalidHardwareAddress)?;
        Ok(MacAddr::new(bytes))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_hex(f, &self.bytes)
    }
}

///
/// A link-layer address of any length. Ethernet uses 6 bytes, InfiniBand uses 20; ARP carries
/// whichever length the hardware declares.
///
#[derive(Eq, Clone, Default, Hash, PartialEq)]
pub struct HardwareAddr(Vec<u8>);

impl HardwareAddr {
    pub fn new(bytes: Vec<u8>) -> HardwareAddr {
        HardwareAddr(bytes)
    }

    /// The all-ones address with `len` bytes.
    pub fn broadcast(len: usize) -> HardwareAddr {
        HardwareAddr(vec![0xff; len])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for HardwareAddr {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for HardwareAddr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for HardwareAddr {
    fn from(bytes: &[u8]) -> Self {
        HardwareAddr(bytes.to_vec())
    }
}

impl From<Vec<u8>> for HardwareAddr {
    fn from(bytes: Vec<u8>) -> Self {
        HardwareAddr(bytes)
    }
}

impl From<MacAddr> for HardwareAddr {
    fn from(mac: MacAddr) -> Self {
        HardwareAddr(mac.bytes.to_vec())
    }
}

impl TryFrom<&HardwareAddr> for MacAddr {
    type Error = Error;

    fn try_from(addr: &HardwareAddr) -> Result<Self, Self::Error> {
        MacAddr::try_from(addr.as_bytes())
    }
}

impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Debug for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HardwareAddr({})", self)
    }
}

/// Parses colon or dash separated hex octets, e.g. `de:ad:be:ef:00:01`.
impl FromStr for HardwareAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sep = if s.contains('-') { '-' } else { ':' };
        let bytes = s
            .split(sep)
            .map(|octet| {
                if octet.len() != 2 {
                    return Err(Error::InvalidHardwareAddress);
                }
                u8::from_str_radix(octet, 16).map_err(|_| Error::InvalidHardwareAddress)
            })
            .collect::<Result<Vec<u8>, Error>>()?;
        if bytes.len() < 6 {
            return Err(Error::InvalidHardwareAddress);
        }
        Ok(HardwareAddr(bytes))
    }
}

fn write_hex(f: &mut fmt::Formatter, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            write!(f, ":")?;
        }
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}
