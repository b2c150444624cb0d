use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tungstenite::protocol::Message as WsMessage;

use wsrelay::config::Settings;
use wsrelay::hub::{Hub, HubHandle};
use wsrelay::transport::serve;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(2);

async fn start_relay(settings: Settings) -> (SocketAddr, HubHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let hub = Hub::spawn(&settings.hub);
    tokio::spawn(serve(listener, hub.clone(), Arc::new(settings)));
    (addr, hub)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("handshake failed");
    ws
}

async fn wait_for_members(hub: &HubHandle, count: usize) {
    for _ in 0..200 {
        if hub.members().await.expect("hub running").len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached {count} sessions");
}

async fn next_payload(client: &mut Client) -> Bytes {
    loop {
        let msg = timeout(READ_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a relayed message")
            .expect("connection closed")
            .expect("read failed");
        match msg {
            WsMessage::Binary(payload) => return payload,
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

async fn assert_nothing_pending(client: &mut Client) {
    let next = timeout(Duration::from_millis(200), client.next()).await;
    assert!(next.is_err(), "unexpected extra frame: {next:?}");
}

#[tokio::test]
async fn hello_reaches_every_client_exactly_once() {
    let (addr, hub) = start_relay(Settings::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_members(&hub, 3).await;

    a.send(WsMessage::Binary(Bytes::from_static(b"hello")))
        .await
        .expect("send");

    for client in [&mut a, &mut b, &mut c] {
        assert_eq!(next_payload(client).await, Bytes::from_static(b"hello"));
    }
    for client in [&mut a, &mut b, &mut c] {
        assert_nothing_pending(client).await;
    }
    assert_eq!(hub.members().await.expect("hub running").len(), 3);
}

#[tokio::test]
async fn messages_from_one_sender_arrive_in_order() {
    let (addr, hub) = start_relay(Settings::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_members(&hub, 2).await;

    for i in 0..50u8 {
        a.send(WsMessage::Binary(Bytes::from(vec![i])))
            .await
            .expect("send");
    }
    for i in 0..50u8 {
        assert_eq!(&next_payload(&mut b).await[..], &[i]);
    }
}

#[tokio::test]
async fn oversize_frame_only_drops_its_sender() {
    let mut settings = Settings::default();
    settings.session.max_message_size = 4 * 1024;
    let (addr, hub) = start_relay(settings).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_members(&hub, 3).await;

    a.send(WsMessage::Binary(Bytes::from(vec![0u8; 8 * 1024])))
        .await
        .expect("send");
    wait_for_members(&hub, 2).await;

    b.send(WsMessage::Binary(Bytes::from_static(b"still here")))
        .await
        .expect("send");
    assert_eq!(next_payload(&mut b).await, Bytes::from_static(b"still here"));
    assert_eq!(next_payload(&mut c).await, Bytes::from_static(b"still here"));
}

#[tokio::test]
async fn disconnected_client_leaves_the_registry() {
    let (addr, hub) = start_relay(Settings::default()).await;
    let mut a = connect(addr).await;
    let b = connect(addr).await;
    wait_for_members(&hub, 2).await;

    drop(b);
    wait_for_members(&hub, 1).await;

    a.send(WsMessage::text("after leave")).await.expect("send");
    assert_eq!(next_payload(&mut a).await, Bytes::from_static(b"after leave"));
}

#[tokio::test]
async fn late_joiner_gets_no_history() {
    let (addr, hub) = start_relay(Settings::default()).await;
    let mut a = connect(addr).await;
    wait_for_members(&hub, 1).await;

    a.send(WsMessage::Binary(Bytes::from_static(b"early")))
        .await
        .expect("send");
    assert_eq!(next_payload(&mut a).await, Bytes::from_static(b"early"));

    let mut late = connect(addr).await;
    wait_for_members(&hub, 2).await;
    assert_nothing_pending(&mut late).await;
}

#[tokio::test]
async fn closing_client_gets_close_handshake() {
    let (addr, hub) = start_relay(Settings::default()).await;
    let mut a = connect(addr).await;
    wait_for_members(&hub, 1).await;

    a.close(None).await.expect("close");
    wait_for_members(&hub, 0).await;
}
