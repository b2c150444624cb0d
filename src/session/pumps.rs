//! The two loops that drive one connection.
//!
//! `read_loop` forwards every inbound data frame to the hub. `write_loop`
//! drains the session mailbox into the socket and sends keepalive pings.
//! Either loop ending tears the whole session down: the reader always
//! unregisters from the hub, which closes the mailbox and stops the writer,
//! and the writer always raises the `closed` flag, which stops the reader.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::WebSocketStream;
use tracing::debug;
use tungstenite::protocol::Message as WsMessage;

use crate::hub::HubHandle;
use crate::session::SessionId;
use crate::utils::{RelayError, Result};

pub(crate) type WsSink<S> = SplitSink<WebSocketStream<S>, WsMessage>;
pub(crate) type WsSource<S> = SplitStream<WebSocketStream<S>>;

pub(crate) async fn read_loop<S>(
    id: SessionId,
    mut source: WsSource<S>,
    hub: HubHandle,
    mut closed: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reason = loop {
        let next = tokio::select! {
            next = source.next() => next,
            _ = closed.changed() => break "writer stopped",
        };

        match next {
            Some(Ok(msg)) if msg.is_binary() || msg.is_text() => {
                if hub.broadcast(msg.into_data()).await.is_err() {
                    break "hub closed";
                }
            }
            Some(Ok(WsMessage::Close(frame))) => {
                debug!(session = %id, ?frame, "peer sent close");
                break "peer closed";
            }
            // Pings are answered by the codec; pongs need nothing.
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                debug!(session = %id, error = %err, "read failed");
                break "read error";
            }
            None => break "stream ended",
        }
    };

    let _ = hub.unregister(id).await;
    debug!(session = %id, reason, "read loop finished");
}

pub(crate) async fn write_loop<S>(
    id: SessionId,
    mut sink: WsSink<S>,
    mut mailbox: mpsc::Receiver<Bytes>,
    closed: watch::Sender<bool>,
    ping_interval: Duration,
    write_wait: Duration,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result: Result<()> = async {
        loop {
            tokio::select! {
                payload = mailbox.recv() => match payload {
                    Some(payload) => {
                        write_frame(&mut sink, WsMessage::Binary(payload), write_wait).await?;
                    }
                    None => {
                        // Unregistered or evicted by the hub.
                        let _ = write_frame(&mut sink, WsMessage::Close(None), write_wait).await;
                        return Ok(());
                    }
                },
                _ = ticker.tick() => {
                    write_frame(&mut sink, WsMessage::Ping(Bytes::new()), write_wait).await?;
                }
            }
        }
    }
    .await;

    closed.send_replace(true);
    match result {
        Ok(()) => debug!(session = %id, "write loop finished"),
        Err(err) => debug!(session = %id, error = %err, "write loop failed"),
    }
}

async fn write_frame<S>(sink: &mut WsSink<S>, msg: WsMessage, deadline: Duration) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match tokio::time::timeout(deadline, sink.send(msg)).await {
        Ok(sent) => sent.map_err(RelayError::from),
        Err(_) => Err(RelayError::WriteTimeout(deadline)),
    }
}
