#![cfg(target_os = "linux")]

use arp_rs_afpacket::{interface_by_name, AfPacketConn};
use arp_rs_packets::HardwareAddr;
use arp_rs_runtime::{Client, PacketConn, Responder, Server};
use std::{
    net::Ipv4Addr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio;

const CLIENT_MAC: [u8; 6] = [0x02, 0x00, 0x5e, 0x00, 0x00, 0x01];
const SERVER_MAC: [u8; 6] = [0x02, 0x00, 0x5e, 0x00, 0x00, 0x02];
const SERVER_IP: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 2);

// This test is marked as #[ignore] because it needs to be able to open
// a socket. Opening a socket requires CAP_NET_RAW.
// To run this test on a Linux machine, run the test binary like so:
// > sudo target/<path to test executable> --ignored --test-threads=1
#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn resolve_over_loopback() {
    // Loopback has no hardware address of its own, so borrow one for each side.
    let mut ifi = interface_by_name("lo").unwrap();
    ifi.hardware_addr = HardwareAddr::from(&CLIENT_MAC[..]);

    let server_conn = Arc::new(AfPacketConn::bind("lo").unwrap());
    let server = Server::new(Responder::new(
        HardwareAddr::from(&SERVER_MAC[..]),
        SERVER_IP,
    ));
    let serving = tokio::spawn({
        let conn = server_conn.clone();
        async move { server.serve(conn).await }
    });

    let client = Client::new(&ifi, AfPacketConn::bind("lo").unwrap()).unwrap();
    client
        .set_deadline(Some(Instant::now() + Duration::from_secs(1)))
        .unwrap();
    let hw = client.resolve(SERVER_IP).await.unwrap();
    assert_eq!(hw.as_bytes(), &SERVER_MAC[..]);

    client.close().unwrap();
    server_conn.close().unwrap();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
#[ignore]
async fn closed_conn_stops_reading() {
    let conn = Arc::new(AfPacketConn::bind("lo").unwrap());
    let reader = {
        let conn = conn.clone();
        tokio::spawn(async move {
            let mut buf = vec![0; 1500];
            conn.recv_from(&mut buf).await.map(|(n, _)| n)
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    conn.close().unwrap();
    let err = reader.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    assert!(conn.is_closed());
}
