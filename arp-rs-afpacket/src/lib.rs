//! This crate runs arp-rs clients and servers on Linux `AF_PACKET` sockets, by way of the
//! `afpacket` crate.
#![cfg(target_os = "linux")]
#![deny(missing_docs)]

mod conn;
mod net;

pub use conn::AfPacketConn;
pub use net::{dial, interface_by_name, listen_and_serve};
