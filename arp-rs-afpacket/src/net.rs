use crate::AfPacketConn;
use afpacket;
use arp_rs_packets::HardwareAddr;
use arp_rs_runtime::{Client, Handler, Interface, Result, Server};
use std::{ffi::CString, io};
use tracing::info;

/// Looks up the named interface: its index, hardware address, and configured addresses.
pub fn interface_by_name(name: &str) -> io::Result<Interface> {
    let cname =
        CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let ifi = afpacket::interface_by_name(&cname)?;
    Ok(Interface {
        name: name.to_string(),
        index: ifi.index,
        hardware_addr: HardwareAddr::new(ifi.hardware_addr),
        addrs: ifi.addrs,
    })
}

/// Creates a client that sends from the named interface.
pub fn dial(iface_name: &str) -> Result<Client<AfPacketConn>> {
    let ifi = interface_by_name(iface_name)?;
    let conn = AfPacketConn::bind(&ifi.name)?;
    Client::new(&ifi, conn)
}

/// Serves ARP requests arriving on the named interface with `handler`, until the socket fails.
pub async fn listen_and_serve<H: Handler>(iface_name: &str, handler: H) -> Result<()> {
    let ifi = interface_by_name(iface_name)?;
    let conn = AfPacketConn::bind(&ifi.name)?;
    info!(
        "listening for ARP on {} ({})",
        ifi.name, ifi.hardware_addr
    );
    Server::new(handler).serve(conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_interface() {
        let lo = interface_by_name("lo").unwrap();
        assert_eq!(lo.name, "lo");
        assert!(lo.index > 0);
        // Loopback has no Ethernet address.
        assert!(lo.hardware_addr.is_empty());
    }

    #[test]
    fn bad_interface_names() {
        let err = interface_by_name("lo\0").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(interface_by_name("nosuchiface0").is_err());
        assert!(dial("nosuchiface0").is_err());
    }
}
