use crate::{Handler, Request, ResponseSender};
use arp_rs_packets::{ArpPacket, HardwareAddr, Operation};
use futures::future::BoxFuture;
use std::net::Ipv4Addr;
use tracing::debug;

/// Answers requests for one IPv4 address with a fixed hardware address. Anything that is not a
/// request for that address is ignored.
#[derive(Clone, Debug)]
pub struct Responder {
    hardware_addr: HardwareAddr,
    ip: Ipv4Addr,
}

impl Responder {
    pub fn new(hardware_addr: HardwareAddr, ip: Ipv4Addr) -> Self {
        Responder { hardware_addr, ip }
    }
}

impl Handler for Responder {
    fn serve_arp<'a>(
        &'a self,
        w: &'a mut dyn ResponseSender,
        r: &'a Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if r.operation != Operation::REQUEST || r.target_ip != self.ip {
                return;
            }

            let reply = match ArpPacket::new(
                Operation::REPLY,
                &self.hardware_addr,
                self.ip,
                &r.sender_hardware_addr,
                r.sender_ip,
            ) {
                Ok(reply) => reply,
                Err(e) => {
                    debug!(error = %e, "cannot answer {} for {}", r.sender_hardware_addr, self.ip);
                    return;
                }
            };
            if let Err(e) = w.send(&reply).await {
                debug!(error = %e, "sending reply for {}", self.ip);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[derive(Default)]
    struct Sink {
        sent: Vec<ArpPacket>,
    }

    impl ResponseSender for Sink {
        fn send<'a>(&'a mut self, packet: &'a ArpPacket) -> BoxFuture<'a, Result<usize>> {
            Box::pin(async move {
                self.sent.push(packet.clone());
                Ok(0)
            })
        }
    }

    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

    fn responder() -> Responder {
        Responder::new(HardwareAddr::from(&[0x02, 0, 0, 0, 0, 0x01][..]), IP)
    }

    fn request(operation: Operation, sender_hw: &[u8], target_ip: Ipv4Addr) -> Request {
        Request {
            operation,
            sender_hardware_addr: HardwareAddr::from(sender_hw),
            sender_ip: Ipv4Addr::new(192, 168, 1, 10),
            target_hardware_addr: HardwareAddr::broadcast(sender_hw.len()),
            target_ip,
        }
    }

    #[tokio::test]
    async fn answers_requests_for_its_ip() {
        let mut w = Sink::default();
        let sender = [0x02, 0, 0, 0, 0, 0x10];
        responder()
            .serve_arp(&mut w, &request(Operation::REQUEST, &sender, IP))
            .await;

        assert_eq!(w.sent.len(), 1);
        let reply = &w.sent[0];
        assert_eq!(reply.operation, Operation::REPLY);
        assert_eq!(reply.sender_hardware_addr(), &[0x02, 0, 0, 0, 0, 0x01][..]);
        assert_eq!(reply.sender_ipv4_addr(), Some(IP));
        assert_eq!(reply.target_hardware_addr(), &sender[..]);
        assert_eq!(reply.target_ipv4_addr(), Some(Ipv4Addr::new(192, 168, 1, 10)));
    }

    #[tokio::test]
    async fn ignores_everything_else() {
        let mut w = Sink::default();
        let sender = [0x02, 0, 0, 0, 0, 0x10];
        let r = responder();
        r.serve_arp(&mut w, &request(Operation::REPLY, &sender, IP))
            .await;
        r.serve_arp(
            &mut w,
            &request(Operation::REQUEST, &sender, Ipv4Addr::new(192, 168, 1, 2)),
        )
        .await;
        // A requester whose address length differs from ours cannot be answered.
        r.serve_arp(&mut w, &request(Operation::REQUEST, &[0x02; 20], IP))
            .await;
        assert!(w.sent.is_empty());
    }
}
