use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identity of one connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// The hub's view of a session: its id and the sending half of its mailbox.
///
/// Not `Clone`: the registry entry is the only sender, so dropping it is what
/// closes the mailbox.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: SessionId,
    pub mailbox: mpsc::Sender<Bytes>,
}

/// Creates a session handle plus the receiving end its outbound loop drains.
///
/// `capacity` must be non-zero; `Settings::validate` enforces this.
pub fn mailbox(capacity: usize) -> (SessionHandle, mpsc::Receiver<Bytes>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        SessionHandle {
            id: SessionId::new(),
            mailbox: tx,
        },
        rx,
    )
}
