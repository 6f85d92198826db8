use arp_rs_packets::HardwareAddr;
use futures::future::BoxFuture;
use std::{
    future::Future,
    io,
    sync::Arc,
    time::Instant,
};
use tokio::sync::watch;

/// A link-layer transport that moves whole frames.
///
/// `recv_from` and `send_to` take `&self`: one task may read while any number of others write.
/// Once `close` has been called, pending and future reads fail with
/// `io::ErrorKind::UnexpectedEof`. An expired deadline fails the affected operation with
/// `io::ErrorKind::TimedOut`; a deadline of `None` waits forever. Setting a deadline affects
/// operations that are already pending.
pub trait PacketConn: Send + Sync + 'static {
    /// Reads one frame into `buf`, returning its length and the hardware address it came from.
    /// Frames longer than `buf` are truncated.
    fn recv_from<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> BoxFuture<'a, io::Result<(usize, HardwareAddr)>>;

    /// Writes one frame, addressed to `addr` on the link.
    fn send_to<'a>(
        &'a self,
        buf: &'a [u8],
        addr: &'a HardwareAddr,
    ) -> BoxFuture<'a, io::Result<usize>>;

    fn close(&self) -> io::Result<()>;

    /// Sets both the read and the write deadline.
    fn set_deadline(&self, t: Option<Instant>) -> io::Result<()>;

    fn set_read_deadline(&self, t: Option<Instant>) -> io::Result<()>;

    fn set_write_deadline(&self, t: Option<Instant>) -> io::Result<()>;
}

impl<C: PacketConn + ?Sized> PacketConn for Arc<C> {
    fn recv_from<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> BoxFuture<'a, io::Result<(usize, HardwareAddr)>> {
        (**self).recv_from(buf)
    }

    fn send_to<'a>(
        &'a self,
        buf: &'a [u8],
        addr: &'a HardwareAddr,
    ) -> BoxFuture<'a, io::Result<usize>> {
        (**self).send_to(buf, addr)
    }

    fn close(&self) -> io::Result<()> {
        (**self).close()
    }

    fn set_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(t)
    }

    fn set_read_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(t)
    }

    fn set_write_deadline(&self, t: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(t)
    }
}

/// Read and write deadlines for a `PacketConn` implementation. Changing a deadline applies to
/// operations already waiting in `read_within` or `write_within`, not only to later ones.
#[derive(Debug)]
pub struct Deadlines {
    read_tx: watch::Sender<Option<Instant>>,
    read_rx: watch::Receiver<Option<Instant>>,
    write_tx: watch::Sender<Option<Instant>>,
    write_rx: watch::Receiver<Option<Instant>>,
}

impl Deadlines {
    pub fn new() -> Self {
        let (read_tx, read_rx) = watch::channel(None);
        let (write_tx, write_rx) = watch::channel(None);
        Deadlines {
            read_tx,
            read_rx,
            write_tx,
            write_rx,
        }
    }

    pub fn set(&self, t: Option<Instant>) {
        self.set_read(t);
        self.set_write(t);
    }

    pub fn set_read(&self, t: Option<Instant>) {
        // We hold a receiver, so this cannot fail.
        let _ = self.read_tx.send(t);
    }

    pub fn set_write(&self, t: Option<Instant>) {
        let _ = self.write_tx.send(t);
    }

    pub fn read(&self) -> Option<Instant> {
        *self.read_rx.borrow()
    }

    pub fn write(&self) -> Option<Instant> {
        *self.write_rx.borrow()
    }

    /// Runs a read, failing with `TimedOut` if the read deadline passes first.
    pub async fn read_within<F, T>(&self, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        within(self.read_rx.clone(), fut).await
    }

    /// Runs a write, failing with `TimedOut` if the write deadline passes first.
    pub async fn write_within<F, T>(&self, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        within(self.write_rx.clone(), fut).await
    }
}

impl Default for Deadlines {
    fn default() -> Self {
        Self::new()
    }
}

async fn within<F, T>(mut deadline: watch::Receiver<Option<Instant>>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    tokio::pin!(fut);
    loop {
        let current = *deadline.borrow();
        let expired = async move {
            match current {
                Some(t) => tokio::time::sleep_until(tokio::time::Instant::from_std(t)).await,
                None => futures::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            result = &mut fut => return result,
            _ = expired => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "i/o deadline exceeded",
                ));
            }
            changed = deadline.changed() => {
                if changed.is_err() {
                    return fut.await;
                }
            }
        }
    }
}

/// Close state for a `PacketConn` implementation. Closing wakes every operation waiting in
/// `guard_read` or `guard_write`.
#[derive(Debug)]
pub struct CloseSignal {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CloseSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        CloseSignal { tx, rx }
    }

    /// Marks the connection closed. Closing twice is harmless.
    pub fn close(&self) {
        // We hold a receiver, so this cannot fail.
        let _ = self.tx.send(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Runs a read until it completes or the connection is closed. Reads on a closed connection
    /// fail with `UnexpectedEof`.
    pub async fn guard_read<F, T>(&self, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        self.guard(fut, io::ErrorKind::UnexpectedEof).await
    }

    /// Runs a write until it completes or the connection is closed. Writes on a closed
    /// connection fail with `BrokenPipe`.
    pub async fn guard_write<F, T>(&self, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        self.guard(fut, io::ErrorKind::BrokenPipe).await
    }

    async fn guard<F, T>(&self, fut: F, kind: io::ErrorKind) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        let mut rx = self.rx.clone();
        if self.is_closed() {
            return Err(closed(kind));
        }
        tokio::select! {
            result = fut => result,
            _ = wait_closed(&mut rx) => Err(closed(kind)),
        }
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_closed(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn closed(kind: io::ErrorKind) -> io::Error {
    io::Error::new(kind, "use of closed connection")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn read_deadline_expires() {
        let deadlines = Deadlines::new();
        deadlines.set_read(Some(Instant::now() + Duration::from_millis(20)));

        let err = deadlines
            .read_within(futures::future::pending::<io::Result<()>>())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn cleared_deadline_waits() {
        let deadlines = Deadlines::new();
        deadlines.set(Some(Instant::now()));
        deadlines.set(None);
        assert_eq!(deadlines.read(), None);
        assert_eq!(deadlines.write(), None);

        let n = deadlines.write_within(async { Ok(3) }).await.unwrap();
        assert_eq!(n, 3);
    }

    #[tokio::test]
    async fn deadline_set_while_reading_applies() {
        let deadlines = Arc::new(Deadlines::new());
        let reader = {
            let deadlines = deadlines.clone();
            tokio::spawn(async move {
                deadlines
                    .read_within(futures::future::pending::<io::Result<()>>())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        deadlines.set_read(Some(Instant::now() + Duration::from_millis(20)));

        let err = tokio::time::timeout(Duration::from_secs(5), reader)
            .await
            .expect("pending read ignored the new deadline")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn extended_deadline_lets_write_finish() {
        let deadlines = Arc::new(Deadlines::new());
        deadlines.set_write(Some(Instant::now() + Duration::from_millis(50)));
        let writer = {
            let deadlines = deadlines.clone();
            tokio::spawn(async move {
                deadlines
                    .write_within(async {
                        tokio::time::sleep(Duration::from_millis(120)).await;
                        Ok(7)
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        deadlines.set_write(None);
        assert_eq!(writer.await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn close_wakes_pending_read() {
        let signal = Arc::new(CloseSignal::new());
        let reader = {
            let signal = signal.clone();
            tokio::spawn(async move {
                signal
                    .guard_read(futures::future::pending::<io::Result<()>>())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.close();
        signal.close();

        let err = reader.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(signal.is_closed());

        let err = signal.guard_write(async { Ok(()) }).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
