/// Errors shared by the client and the server. Wire-format failures from arp-rs-packets are
/// carried inside, next to transport errors and interface configuration problems.
mod error;
pub use self::error::*;

/// The transport seam. Anything that can move raw link-layer frames and tell us who sent them
/// implements `PacketConn`; the client and the server never touch a socket directly. Deadline and
/// close bookkeeping shared by implementations lives here as well.
pub mod conn;
pub use self::conn::PacketConn;

/// The local view of a network interface: its hardware address and the network addresses
/// configured on it.
mod interface;
pub use self::interface::*;

/// The client side of ARP. A `Client` broadcasts requests from the interface it was built for and
/// matches replies against them, returning the hardware address of the host that answered.
pub mod client;
pub use self::client::Client;

/// Requests as seen by handlers: a decoded ARP packet with its addresses lifted into typed
/// values.
mod request;
pub use self::request::*;

/// The server side of ARP. A `Server` reads frames off a `PacketConn` and hands every ARP packet
/// to a `Handler` on its own task, along with a `ResponseSender` aimed back at the link-layer
/// address the frame came from.
pub mod server;
pub use self::server::{Handler, ResponseSender, Server};

/// Routes requests to handlers by the address being asked about.
pub mod mux;
pub use self::mux::ServeMux;

/// A handler that answers for a single address.
mod responder;
pub use self::responder::Responder;

/// Utility module
pub mod utils;
