#![cfg(target_os = "linux")]
mod interface;
mod linux;
mod sockets;

#[cfg(feature = "tokio-support")]
mod tokio_sockets;

pub use interface::{interface_by_name, Interface};
pub use sockets::{Addr, BoundSocket, Socket, ETH_P_ARP};
#[cfg(feature = "tokio-support")]
pub use tokio_sockets::AsyncBoundSocket;
