use crate::{Handler, Request, ResponseSender};
use futures::future::BoxFuture;
use std::{
    collections::HashMap,
    net::Ipv4Addr,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::trace;

/// A `Handler` that routes each request to the handler registered for its target IPv4 address.
/// Requests for addresses with no handler go unanswered.
///
/// Handlers may be registered and removed while the mux is serving.
#[derive(Default)]
pub struct ServeMux {
    handlers: RwLock<HashMap<Ipv4Addr, Arc<dyn Handler>>>,
}

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for requests asking about `ip`, replacing any handler already there.
    pub fn handle<H: Handler>(&self, ip: Ipv4Addr, handler: H) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ip, Arc::new(handler));
    }

    /// Removes the handler for `ip`. Returns false if there was none.
    pub fn remove(&self, ip: Ipv4Addr) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ip)
            .is_some()
    }

    pub fn handler(&self, ip: Ipv4Addr) -> Option<Arc<dyn Handler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ip)
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Handler for ServeMux {
    fn serve_arp<'a>(
        &'a self,
        w: &'a mut dyn ResponseSender,
        r: &'a Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match self.handler(r.target_ip) {
                Some(handler) => handler.serve_arp(w, r).await,
                None => trace!("no handler for {}", r.target_ip),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use arp_rs_packets::{ArpPacket, HardwareAddr, Operation};

    #[derive(Default)]
    struct Sink {
        sent: Vec<ArpPacket>,
    }

    impl ResponseSender for Sink {
        fn send<'a>(&'a mut self, packet: &'a ArpPacket) -> BoxFuture<'a, Result<usize>> {
            Box::pin(async move {
                self.sent.push(packet.clone());
                Ok(packet.encode().len())
            })
        }
    }

    // Answers with a reply whose target protocol address names the handler.
    struct Tag(u8);

    impl Handler for Tag {
        fn serve_arp<'a>(
            &'a self,
            w: &'a mut dyn ResponseSender,
            r: &'a Request,
        ) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                let p = ArpPacket::new(
                    Operation::REPLY,
                    &[self.0; 6],
                    r.target_ip,
                    &r.sender_hardware_addr,
                    r.sender_ip,
                )
                .unwrap();
                w.send(&p).await.unwrap();
            })
        }
    }

    fn request_for(ip: Ipv4Addr) -> Request {
        Request {
            operation: Operation::REQUEST,
            sender_hardware_addr: HardwareAddr::from(&[0x02, 0, 0, 0, 0, 0x09][..]),
            sender_ip: Ipv4Addr::new(10, 0, 0, 9),
            target_hardware_addr: HardwareAddr::broadcast(6),
            target_ip: ip,
        }
    }

    #[tokio::test]
    async fn routes_by_target_ip() {
        let mux = ServeMux::new();
        mux.handle(Ipv4Addr::new(10, 0, 0, 1), Tag(1));
        mux.handle(Ipv4Addr::new(10, 0, 0, 2), Tag(2));

        let mut w = Sink::default();
        mux.serve_arp(&mut w, &request_for(Ipv4Addr::new(10, 0, 0, 2)))
            .await;
        mux.serve_arp(&mut w, &request_for(Ipv4Addr::new(10, 0, 0, 1)))
            .await;

        assert_eq!(w.sent.len(), 2);
        assert_eq!(w.sent[0].sender_hardware_addr(), &[2; 6][..]);
        assert_eq!(w.sent[1].sender_hardware_addr(), &[1; 6][..]);
    }

    #[tokio::test]
    async fn unmatched_requests_go_unanswered() {
        let mux = ServeMux::new();
        assert!(mux.is_empty());

        let mut w = Sink::default();
        mux.serve_arp(&mut w, &request_for(Ipv4Addr::new(10, 0, 0, 1)))
            .await;
        assert!(w.sent.is_empty());
    }

    #[tokio::test]
    async fn handle_replaces_and_remove_unregisters() {
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        let mux = ServeMux::new();
        mux.handle(ip, Tag(1));
        mux.handle(ip, Tag(3));

        let mut w = Sink::default();
        mux.serve_arp(&mut w, &request_for(ip)).await;
        assert_eq!(w.sent[0].sender_hardware_addr(), &[3; 6][..]);

        assert!(mux.remove(ip));
        assert!(!mux.remove(ip));
        assert!(mux.handler(ip).is_none());
        mux.serve_arp(&mut w, &request_for(ip)).await;
        assert_eq!(w.sent.len(), 1);
    }
}
