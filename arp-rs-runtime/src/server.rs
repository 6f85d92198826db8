use crate::client::MTU;
use crate::{parse_request, PacketConn, Request, Result, ServeMux};
use arp_rs_packets::{self as packets, ArpPacket, HardwareAddr};
use futures::future::BoxFuture;
use std::{io, sync::Arc};
use tracing::{debug, info, trace};

/// Responds to ARP requests.
///
/// `serve_arp` runs on its own task for every packet the server reads. It may answer through the
/// `ResponseSender` any number of times, including not at all.
pub trait Handler: Send + Sync + 'static {
    fn serve_arp<'a>(
        &'a self,
        w: &'a mut dyn ResponseSender,
        r: &'a Request,
    ) -> BoxFuture<'a, ()>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve_arp<'a>(
        &'a self,
        w: &'a mut dyn ResponseSender,
        r: &'a Request,
    ) -> BoxFuture<'a, ()> {
        (**self).serve_arp(w, r)
    }
}

/// Sends ARP packets back to the host a request came from.
pub trait ResponseSender: Send {
    /// Frames `packet` and writes it to the link-layer address the request arrived from. The
    /// frame is addressed from the packet's sender hardware address to its target hardware
    /// address.
    fn send<'a>(&'a mut self, packet: &'a ArpPacket) -> BoxFuture<'a, Result<usize>>;
}

/// The `ResponseSender` a `Server` hands its handler.
pub struct Response<C> {
    conn: Arc<C>,
    remote: HardwareAddr,
}

impl<C: PacketConn> Response<C> {
    pub fn new(conn: Arc<C>, remote: HardwareAddr) -> Self {
        Response { conn, remote }
    }
}

impl<C: PacketConn> ResponseSender for Response<C> {
    fn send<'a>(&'a mut self, packet: &'a ArpPacket) -> BoxFuture<'a, Result<usize>> {
        Box::pin(async move {
            let frame = packet.to_ethernet_frame()?;
            Ok(self.conn.send_to(frame.as_bytes(), &self.remote).await?)
        })
    }
}

/// Serves ARP requests read from a `PacketConn`.
pub struct Server {
    handler: Arc<dyn Handler>,
}

impl Server {
    pub fn new<H: Handler>(handler: H) -> Self {
        Server {
            handler: Arc::new(handler),
        }
    }

    /// Reads frames from `conn` until it is closed, handing each to the handler on a new task.
    ///
    /// Returns `Ok(())` once `conn` reports end of file and the first error of any other kind.
    /// `conn` is closed before this returns. Tasks already spawned are left to finish on their
    /// own.
    pub async fn serve<C: PacketConn>(&self, conn: C) -> Result<()> {
        let conn = Arc::new(conn);
        let _closer = CloseOnDrop(conn.clone());
        info!("ARP server started");

        let mut buf = vec![0; MTU];
        loop {
            let (n, remote) = match conn.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    info!("ARP server stopped");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let datagram = buf[..n].to_vec();
            let conn = conn.clone();
            let handler = self.handler.clone();
            tokio::spawn(serve_datagram(handler, conn, datagram, remote));
        }
    }
}

impl Default for Server {
    /// A server with an empty `ServeMux`, which answers nothing until handlers are registered
    /// with it. Build the server with `Server::new` to keep a handle on the mux.
    fn default() -> Self {
        Server::new(ServeMux::new())
    }
}

async fn serve_datagram<C: PacketConn>(
    handler: Arc<dyn Handler>,
    conn: Arc<C>,
    datagram: Vec<u8>,
    remote: HardwareAddr,
) {
    let request = match parse_request(&datagram) {
        Ok(request) => request,
        Err(packets::Error::NotArp) => return,
        Err(e) => {
            debug!(error = %e, "dropping malformed ARP packet from {}", remote);
            return;
        }
    };

    trace!(
        operation = %request.operation,
        "dispatching ARP packet for {} from {}",
        request.target_ip,
        remote
    );
    let mut w = Response::new(conn, remote);
    handler.serve_arp(&mut w, &request).await;
}

struct CloseOnDrop<C: PacketConn>(Arc<C>);

impl<C: PacketConn> Drop for CloseOnDrop<C> {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            debug!(error = %e, "closing ARP server connection");
        }
    }
}
