use crate::linux;
use libc;
use std::{
    ffi::{CStr, CString},
    io,
    mem::MaybeUninit,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    ptr,
};

/// A network interface, as seen by the kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct Interface {
    /// Interface name, e.g. `eth0`.
    pub name: CString,
    /// Kernel interface index.
    pub index: i32,
    /// Hardware address of the interface. Empty for interfaces without one.
    pub hardware_addr: Vec<u8>,
    /// Network addresses configured on the interface, in the order the kernel reports them.
    pub addrs: Vec<IpAddr>,
}

/// Looks up an interface by name, collecting its index, hardware address, and configured IP
/// addresses.
pub fn interface_by_name(name: impl AsRef<CStr>) -> io::Result<Interface> {
    let name = name.as_ref();
    let sock = ControlSocket::new()?;
    let index = index_of(sock.0, name)?;
    let hardware_addr = hardware_addr_of(sock.0, name)?;
    let addrs = addrs_of(name)?;
    Ok(Interface {
        name: name.to_owned(),
        index,
        hardware_addr,
        addrs,
    })
}

/// Returns the index of the named interface. Any socket works for the ioctl.
pub(crate) fn index_of(fd: libc::c_int, name: &CStr) -> io::Result<i32> {
    let ifr = ioctl_ifreq(fd, linux::SIOCGIFINDEX, name)?;
    // Reading the union is sound: SIOCGIFINDEX fills in the index member.
    // expanded from `ifr_ifindex` in kernel headers
    Ok(unsafe { ifr.ifr_ifru.ifru_ivalue })
}

fn hardware_addr_of(fd: libc::c_int, name: &CStr) -> io::Result<Vec<u8>> {
    let ifr = ioctl_ifreq(fd, linux::SIOCGIFHWADDR, name)?;
    // SIOCGIFHWADDR fills in the hwaddr member.
    let sa = unsafe { ifr.ifr_ifru.ifru_hwaddr };
    if sa.sa_family == libc::ARPHRD_ETHER {
        Ok(sa.sa_data[..6].iter().map(|b| *b as u8).collect())
    } else {
        Ok(vec![])
    }
}

fn ioctl_ifreq(fd: libc::c_int, request: libc::c_ulong, name: &CStr) -> io::Result<linux::ifreq> {
    let bytes = name.to_bytes();
    if bytes.len() >= libc::IFNAMSIZ {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "interface name too long",
        ));
    }
    // This block is marked as unsafe because it uses FFI, however, we believe it to be safe
    // because the name is bounds-checked above and the ifreq is owned by this stack frame.
    // Resources:
    // man 7 netdevice
    unsafe {
        let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
        ptr::copy_nonoverlapping(
            bytes.as_ptr() as *const libc::c_char,
            ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
            bytes.len(),
        );
        let err = libc::ioctl(fd, request, &mut ifr);
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ifr)
    }
}

fn addrs_of(name: &CStr) -> io::Result<Vec<IpAddr>> {
    let mut head: *mut libc::ifaddrs = ptr::null_mut();
    // Resources:
    // man 3 getifaddrs
    if unsafe { libc::getifaddrs(&mut head) } < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut addrs = vec![];
    let mut cur = head;
    // The list stays valid until freeifaddrs; every node is checked for null before use.
    unsafe {
        while !cur.is_null() {
            let ifa = &*cur;
            cur = ifa.ifa_next;
            if ifa.ifa_addr.is_null() || CStr::from_ptr(ifa.ifa_name) != name {
                continue;
            }
            match i32::from((*ifa.ifa_addr).sa_family) {
                libc::AF_INET => {
                    let sin = &*(ifa.ifa_addr as *const libc::sockaddr_in);
                    addrs.push(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))));
                }
                libc::AF_INET6 => {
                    let sin6 = &*(ifa.ifa_addr as *const libc::sockaddr_in6);
                    addrs.push(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)));
                }
                _ => {}
            }
        }
        libc::freeifaddrs(head);
    }
    Ok(addrs)
}

// A throwaway datagram socket used only as an ioctl handle.
struct ControlSocket(libc::c_int);

impl ControlSocket {
    fn new() -> io::Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ControlSocket(fd))
    }
}

impl Drop for ControlSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_has_ipv4_addr() {
        let lo = CString::new("lo").unwrap();
        let ifi = interface_by_name(&lo).unwrap();
        assert_eq!(ifi.name, lo);
        assert!(ifi.index > 0);
        assert!(ifi.addrs.contains(&IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn unknown_interface() {
        let name = CString::new("nosuchiface0").unwrap();
        assert!(interface_by_name(&name).is_err());
    }

    #[test]
    fn name_too_long() {
        let name = CString::new("an-interface-name-longer-than-ifnamsiz").unwrap();
        let err = interface_by_name(&name).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
