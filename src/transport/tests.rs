use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::{HeaderValue, StatusCode};

use super::serve;
use crate::config::Settings;
use crate::hub::{Hub, HubHandle};

async fn spawn_server(settings: Settings) -> (SocketAddr, HubHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = Hub::spawn(&settings.hub);
    tokio::spawn(serve(listener, hub.clone(), Arc::new(settings)));
    (addr, hub)
}

async fn wait_for_members(hub: &HubHandle, count: usize) {
    for _ in 0..100 {
        if hub.members().await.unwrap().len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached {count} sessions");
}

fn expect_status(result: Result<impl std::fmt::Debug, tungstenite::Error>, status: StatusCode) {
    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), status),
        other => panic!("expected HTTP {status}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upgrade_on_configured_path() {
    let (addr, hub) = spawn_server(Settings::default()).await;

    let (_ws, response) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("handshake failed");
    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);

    wait_for_members(&hub, 1).await;
}

#[tokio::test]
async fn test_other_paths_are_not_found() {
    let (addr, hub) = spawn_server(Settings::default()).await;

    expect_status(
        connect_async(format!("ws://{addr}/elsewhere")).await,
        StatusCode::NOT_FOUND,
    );
    assert!(hub.members().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_origin_policy_is_enforced() {
    let mut settings = Settings::default();
    settings.server.allowed_origins = vec!["https://app.test".to_string()];
    let (addr, hub) = spawn_server(settings).await;

    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", HeaderValue::from_static("https://evil.test"));
    expect_status(connect_async(request).await, StatusCode::FORBIDDEN);

    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", HeaderValue::from_static("https://app.test"));
    let (_allowed, _) = connect_async(request).await.expect("allowed origin rejected");

    // Non-browser clients send no Origin at all.
    let (_native, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("origin-less client rejected");

    wait_for_members(&hub, 2).await;
}
