use crate::{Error, Result};
use arp_rs_packets::{HardwareAddr, ToIpv4Addr};
use std::net::{IpAddr, Ipv4Addr};

/// A network interface a client or server is bound to.
#[derive(Clone, Debug, PartialEq)]
pub struct Interface {
    pub name: String,
    pub index: i32,
    pub hardware_addr: HardwareAddr,
    pub addrs: Vec<IpAddr>,
}

impl Interface {
    /// The first IPv4 address configured on the interface.
    pub fn ipv4_addr(&self) -> Result<Ipv4Addr> {
        first_ipv4_addr(&self.addrs)
    }
}

/// Returns the first address in `addrs` that is an IPv4 address. IPv4-mapped IPv6 addresses
/// count as IPv4.
pub fn first_ipv4_addr(addrs: &[IpAddr]) -> Result<Ipv4Addr> {
    addrs
        .iter()
        .find_map(|addr| addr.to_ipv4_addr())
        .ok_or(Error::NoIpv4Address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn first_ipv4_addr_skips_ipv6() {
        let addrs = vec![
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        ];
        assert_eq!(
            first_ipv4_addr(&addrs).unwrap(),
            Ipv4Addr::new(192, 168, 1, 10)
        );
    }

    #[test]
    fn first_ipv4_addr_accepts_mapped() {
        let mapped = Ipv4Addr::new(172, 16, 0, 1).to_ipv6_mapped();
        assert_eq!(
            first_ipv4_addr(&[IpAddr::V6(mapped)]).unwrap(),
            Ipv4Addr::new(172, 16, 0, 1)
        );
    }

    #[test]
    fn no_ipv4_addr() {
        match first_ipv4_addr(&[IpAddr::V6(Ipv6Addr::LOCALHOST)]) {
            Err(Error::NoIpv4Address) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(first_ipv4_addr(&[]).is_err());
    }
}
