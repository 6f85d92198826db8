use crate::conn::{CloseSignal, Deadlines};
use crate::PacketConn;
use arp_rs_packets::HardwareAddr;
use futures::future::BoxFuture;
use std::{io, time::Instant};
use tokio::sync::{mpsc, Mutex};

type Datagram = (Vec<u8>, HardwareAddr);

/// One end of an in-memory link between two hosts. Everything sent from one end arrives at the
/// other, whatever link-layer address it is sent to, and is reported as coming from the sender's
/// address.
///
/// Dropping one end reads as end of file on the other once its queue is drained.
pub struct MemoryConn {
    local: HardwareAddr,
    tx: mpsc::UnboundedSender<Datagram>,
    rx: Mutex<mpsc::UnboundedReceiver<Datagram>>,
    closed: CloseSignal,
    deadlines: Deadlines,
}

/// Connects two hosts with the given hardware addresses.
pub fn pipe(a: HardwareAddr, b: HardwareAddr) -> (MemoryConn, MemoryConn) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (MemoryConn::new(a, a_tx, a_rx), MemoryConn::new(b, b_tx, b_rx))
}

impl MemoryConn {
    fn new(
        local: HardwareAddr,
        tx: mpsc::UnboundedSender<Datagram>,
        rx: mpsc::UnboundedReceiver<Datagram>,
    ) -> Self {
        MemoryConn {
            local,
            tx,
            rx: Mutex::new(rx),
            closed: CloseSignal::new(),
            deadlines: Deadlines::new(),
        }
    }

    pub fn local_addr(&self) -> &HardwareAddr {
        &self.local
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_closed()
    }
}

impl PacketConn for MemoryConn {
    fn recv_from<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> BoxFuture<'a, io::Result<(usize, HardwareAddr)>> {
        Box::pin(self.closed.guard_read(self.deadlines.read_within(async move {
            let mut rx = self.rx.lock().await;
            match rx.recv().await {
                Some((datagram, from)) => {
                    let n = datagram.len().min(buf.len());
                    buf[..n].copy_from_slice(&datagram[..n]);
                    Ok((n, from))
                }
                None => Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer hung up",
                )),
            }
        })))
    }

    fn send_to<'a>(
        &'a self,
        buf: &'a [u8],
        _addr: &'a HardwareAddr,
    ) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(self.closed.guard_write(self.deadlines.write_within(async move {
            self.tx
                .send((buf.to_vec(), self.local.clone()))
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer hung up"))?;
            Ok(buf.len())
        })))
    }

    fn close(&self) -> io::Result<()> {
        self.closed.close();
        Ok(())
    }

    fn set_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        self.deadlines.set(t);
        Ok(())
    }

    fn set_read_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        self.deadlines.set_read(t);
        Ok(())
    }

    fn set_write_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        self.deadlines.set_write(t);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> HardwareAddr {
        HardwareAddr::from(vec![0x02, 0, 0, 0, 0, last])
    }

    #[tokio::test]
    async fn delivers_to_peer_with_source() {
        let (a, b) = pipe(addr(1), addr(2));
        a.send_to(&[1, 2, 3, 4], &HardwareAddr::broadcast(6))
            .await
            .unwrap();

        let mut buf = [0; 2];
        let (n, from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(&from, a.local_addr());
    }

    #[tokio::test]
    async fn dropped_peer_reads_eof() {
        let (a, b) = pipe(addr(1), addr(2));
        drop(b);

        let mut buf = [0; 8];
        let err = a.recv_from(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = a.send_to(&buf, &addr(2)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
