//! WebSocket transport
//!
//! Accepts TCP connections, upgrades the ones that ask for the configured path
//! from an allowed origin, and hands each resulting socket to a new session.
//! Handshake failures are logged and dropped; they never reach the hub.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async_with_config;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::http::header::ORIGIN;
use tungstenite::protocol::WebSocketConfig;

use crate::config::{ServerSettings, SessionSettings, Settings};
use crate::hub::HubHandle;
use crate::session::Session;
use crate::utils::Result;

type UpgradeResult<T> = std::result::Result<T, ErrorResponse>;

/// Codec limits for accepted sockets: oversize messages and frames are
/// rejected with a read error.
pub fn websocket_config(settings: &SessionSettings) -> WebSocketConfig {
    WebSocketConfig::default()
        .max_message_size(Some(settings.max_message_size))
        .max_frame_size(Some(settings.max_message_size))
}

/// Binds the configured listen address and serves connections forever.
pub async fn start_websocket_server(settings: Arc<Settings>, hub: HubHandle) -> Result<()> {
    let listener = TcpListener::bind(settings.listen_addr()).await?;
    info!(
        "WebSocket relay listening on ws://{}{}",
        listener.local_addr()?,
        settings.server.path
    );

    serve(listener, hub, settings).await;
    Ok(())
}

pub async fn serve(listener: TcpListener, hub: HubHandle, settings: Arc<Settings>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "failed to accept connection");
                continue;
            }
        };

        let hub = hub.clone();
        let settings = Arc::clone(&settings);
        tokio::spawn(async move {
            if let Err(err) = accept_connection(stream, peer, hub, &settings).await {
                warn!(peer = %peer, error = %err, "connection dropped before session start");
            }
        });
    }
}

async fn accept_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: HubHandle,
    settings: &Settings,
) -> Result<()> {
    let server = settings.server.clone();
    let check = move |request: &Request, response: Response| -> UpgradeResult<Response> {
        check_upgrade(&server, request).map(|()| response)
    };

    let socket =
        accept_hdr_async_with_config(stream, check, Some(websocket_config(&settings.session)))
            .await?;
    let session = Session::start(socket, hub, &settings.session).await?;
    debug!(peer = %peer, session = %session.id, "session started");
    Ok(())
}

fn check_upgrade(server: &ServerSettings, request: &Request) -> UpgradeResult<()> {
    if request.uri().path() != server.path {
        return Err(reject(StatusCode::NOT_FOUND, "not found"));
    }

    let origin = request
        .headers()
        .get(ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());
    if !server.origin_allowed(origin) {
        return Err(reject(StatusCode::FORBIDDEN, "origin not allowed"));
    }

    Ok(())
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}
