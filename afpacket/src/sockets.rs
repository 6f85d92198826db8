#![deny(missing_docs)]

use crate::{interface, linux};
use libc;
use std::{
    ffi::CStr,
    fmt, io,
    mem::{self, MaybeUninit},
    os::unix::io::{AsRawFd, RawFd},
};

/// Receive only ARP frames.
pub const ETH_P_ARP: u16 = libc::ETH_P_ARP as u16;

/// Represents the link-layer address a frame was received from.
#[derive(Clone, Copy)]
pub struct Addr {
    inner: libc::sockaddr_ll,
}

impl Addr {
    /// Returns the sender's hardware address.
    pub fn hardware_addr(&self) -> &[u8] {
        let len = (self.inner.sll_halen as usize).min(self.inner.sll_addr.len());
        &self.inner.sll_addr[..len]
    }

    /// Returns the index of the interface the frame arrived on.
    pub fn ifindex(&self) -> i32 {
        self.inner.sll_ifindex
    }

    /// Returns the ether type of the frame, in host byte order.
    pub fn protocol(&self) -> u16 {
        u16::from_be(self.inner.sll_protocol)
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Addr")
            .field("hardware_addr", &self.hardware_addr())
            .field("ifindex", &self.ifindex())
            .field("protocol", &self.protocol())
            .finish()
    }
}

/// Represents an unbound `AF_PACKET` socket.  At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
    protocol: u16,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be read
/// to/written from.
pub struct BoundSocket {
    fd: libc::c_int,
    ifindex: libc::c_int,
    protocol: u16,
}

impl Socket {
    /// Creates a new unbound socket which only receives frames with the given ether type.
    pub fn with_protocol(protocol: u16) -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe the code
        // in this block to be safe because it does not interact with any memory owned by Rust
        // code, nor does it violate the invariant of the Socket type -- namely, that it return an
        // Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#socket
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                libc::c_int::from(protocol.to_be()),
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd, protocol })
    }

    /// Binds the socket to a network interface. This function consumes the `Socket` instance, as
    /// no more configuration options may be safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let ifindex = interface::index_of(self.fd, iface.as_ref())?;

        // This block is marked as unsafe because it uses FFI, however, we believe it to be safe
        // because it handles FFI failures in accordance with the bound API's conventions and only
        // lends the kernel a stack-owned sockaddr_ll.
        unsafe {
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = self.protocol.to_be();
            ll.sll_ifindex = ifindex;
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#bind
            // man 7 packet regarding sockaddr_ll
            let err = libc::bind(
                self.fd,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        let fd = self.fd;
        let protocol = self.protocol;
        // This ensures that `self` does not attempt to close the file descriptor, as the file
        // descriptor is transferred to the BoundSocket we're returning. This doesn't cause any
        // resource leaks since the stack-bound `self` is consumed and deallocated in
        // `mem::forget`.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            ifindex,
            protocol,
        })
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        set_nonblocking(self.fd, nonblocking)
    }
}

impl BoundSocket {
    /// Sends a frame to the NIC, addressed to the given link-layer address. The frame must
    /// already carry its own link-layer header.
    pub fn send_to(&self, frame: &[u8], dest: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be safe,
        // because it safely borrows the Rust-owned frame and passes the length of the frame to the
        // libc function, so it should not exhibit any C-side undefined behaviour.
        unsafe {
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = self.protocol.to_be();
            ll.sll_ifindex = self.ifindex;
            let halen = dest.len().min(ll.sll_addr.len());
            ll.sll_halen = halen as libc::c_uchar;
            ll.sll_addr[..halen].copy_from_slice(&dest[..halen]);

            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC, along with the address it came from.
    pub fn recv_from(&self, frame: &mut [u8]) -> io::Result<(usize, Addr)> {
        // Note comment in `send_to` call.
        unsafe {
            let mut ll = MaybeUninit::<libc::sockaddr_ll>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;

            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                ll.as_mut_ptr() as *mut libc::sockaddr,
                &mut addrlen,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok((
                    bytes as usize,
                    Addr {
                        inner: ll.assume_init(),
                    },
                ))
            }
        }
    }

    /// Turns promiscuous mode on or off on this NIC. Useful for receiving all packets on an
    /// interface, including those not addressed to the device.
    pub fn set_promiscuous(&self, promiscuous: bool) -> io::Result<()> {
        let mreq = linux::packet_mreq {
            mr_ifindex: self.ifindex,
            mr_type: linux::PACKET_MR_PROMISC,
            mr_alen: 0,
            mr_address: [0; 8],
        };
        let op = if promiscuous {
            linux::PACKET_ADD_MEMBERSHIP
        } else {
            linux::PACKET_DROP_MEMBERSHIP
        };
        // The kernel only reads `mreq` for the duration of the call.
        let err = unsafe {
            libc::setsockopt(
                self.fd,
                linux::SOL_PACKET,
                op,
                &mreq as *const _ as *const libc::c_void,
                mem::size_of::<linux::packet_mreq>() as libc::socklen_t,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl AsRawFd for BoundSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

fn set_nonblocking(fd: libc::c_int, nonblocking: bool) -> io::Result<()> {
    // This block is marked as unsafe because it uses FFI, however, we assume this code to be
    // safe because we handle fcntl's failures properly. Additionally, we do not borrow any
    // Rust-owned memory.
    // Resources used to write syscall code:
    // https://beej.us/guide/bgnet/html/multi/advanced.html#blocking
    // man 2 fcntl
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let new_flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & (!libc::O_NONBLOCK)
        };
        let err = libc::fcntl(fd, libc::F_SETFL, new_flags);
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
