//! A minimal relay client, used by the `client` subcommand for smoke tests:
//! connect, send one message, wait for the relay to hand a message back.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tracing::{debug, info};
use tungstenite::protocol::Message as WsMessage;

use crate::utils::{RelayError, Result};

pub async fn run_client(url: &str, message: &str, wait: Duration) -> Result<Bytes> {
    let (mut ws_stream, _response) = connect_async(url).await?;
    info!("connected to {url}");

    ws_stream
        .send(WsMessage::Binary(Bytes::copy_from_slice(message.as_bytes())))
        .await?;

    let relayed = tokio::time::timeout(wait, next_data(&mut ws_stream))
        .await
        .map_err(|_| RelayError::NoReply(wait))??
        .ok_or(RelayError::NoReply(wait))?;

    let _ = ws_stream.close(None).await;
    Ok(relayed)
}

/// Reads until the next text or binary frame; `None` once the stream ends.
async fn next_data<S>(stream: &mut S) -> Result<Option<Bytes>>
where
    S: Stream<Item = std::result::Result<WsMessage, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        let msg = msg?;
        if msg.is_binary() || msg.is_text() {
            return Ok(Some(msg.into_data()));
        }
        debug!(?msg, "skipping control frame");
    }
    Ok(None)
}
