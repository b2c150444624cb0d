//! A session pairs one WebSocket connection with its private mailbox and the
//! two loops that move data between the socket and the hub.

mod handle;
mod pumps;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;

use crate::config::SessionSettings;
use crate::hub::HubHandle;
use crate::utils::Result;

pub use handle::{SessionHandle, SessionId, mailbox};

/// A started session: its id and the tasks running its two loops.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub reader: JoinHandle<()>,
    pub writer: JoinHandle<()>,
}

impl Session {
    /// Registers a new session for `socket` with the hub, then spawns the
    /// outbound and inbound loops.
    pub async fn start<S>(
        socket: WebSocketStream<S>,
        hub: HubHandle,
        settings: &SessionSettings,
    ) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (handle, mailbox) = handle::mailbox(settings.mailbox_capacity);
        let id = handle.id;
        hub.register(handle).await?;

        let (sink, source) = socket.split();
        let (closed_tx, closed_rx) = watch::channel(false);

        let writer = tokio::spawn(pumps::write_loop(
            id,
            sink,
            mailbox,
            closed_tx,
            settings.ping_interval(),
            settings.write_wait(),
        ));
        let reader = tokio::spawn(pumps::read_loop(id, source, hub, closed_rx));

        Ok(Self { id, reader, writer })
    }

    /// Waits for both loops to finish.
    pub async fn join(self) {
        let _ = self.writer.await;
        let _ = self.reader.await;
    }
}
