use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::session::{SessionHandle, SessionId};
use crate::utils::{RelayError, Result};

/// Everything the hub loop can be asked to do. Events are processed one at a
/// time, in the order they arrive on the hub's channel.
#[derive(Debug)]
pub enum HubEvent {
    Register(SessionHandle),
    Unregister(SessionId),
    Broadcast(Bytes),
    /// Reports the ids currently in the registry.
    Members(oneshot::Sender<Vec<SessionId>>),
}

/// Cloneable sending side of the hub. Sessions and the acceptor only ever
/// talk to the hub through one of these.
#[derive(Debug, Clone)]
pub struct HubHandle {
    events: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    pub(crate) fn new(events: mpsc::Sender<HubEvent>) -> Self {
        Self { events }
    }

    pub async fn register(&self, session: SessionHandle) -> Result<()> {
        self.send(HubEvent::Register(session)).await
    }

    pub async fn unregister(&self, id: SessionId) -> Result<()> {
        self.send(HubEvent::Unregister(id)).await
    }

    pub async fn broadcast(&self, payload: Bytes) -> Result<()> {
        self.send(HubEvent::Broadcast(payload)).await
    }

    pub async fn members(&self) -> Result<Vec<SessionId>> {
        let (tx, rx) = oneshot::channel();
        self.send(HubEvent::Members(tx)).await?;
        rx.await.map_err(|_| RelayError::HubClosed)
    }

    async fn send(&self, event: HubEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| RelayError::HubClosed)
    }
}
