//! Hub engine
//!
//! The hub owns the registry of live sessions and is the only code that ever
//! touches it. Register, unregister and broadcast requests arrive as events
//! on a single channel and are handled strictly one after another, so the
//! registry needs no lock.
//!
//! Fan-out never blocks: each payload is offered to every mailbox with
//! `try_send`. A mailbox that is full belongs to a consumer that is not
//! keeping up, and that session is evicted on the spot. Removing a session
//! drops the registry's sender, which is the only one, so the session's
//! outbound loop sees its mailbox close and shuts the connection.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::HubSettings;
use crate::hub::event::{HubEvent, HubHandle};
use crate::session::{SessionHandle, SessionId};

#[derive(Debug)]
pub struct Hub {
    pub(crate) sessions: HashMap<SessionId, mpsc::Sender<Bytes>>,
    events: mpsc::Receiver<HubEvent>,
    status_interval: Option<Duration>,
}

impl Hub {
    pub fn new(settings: &HubSettings) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(settings.event_queue_capacity);
        let status_interval = match settings.status_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let hub = Self {
            sessions: HashMap::new(),
            events: rx,
            status_interval,
        };
        (hub, HubHandle::new(tx))
    }

    /// Creates a hub and runs its loop on a background task.
    pub fn spawn(settings: &HubSettings) -> HubHandle {
        let (hub, handle) = Self::new(settings);
        tokio::spawn(hub.run());
        handle
    }

    /// Processes events until every `HubHandle` has been dropped.
    pub async fn run(mut self) {
        let mut status = self.status_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = next_tick(&mut status) => {
                    info!(sessions = self.sessions.len(), "hub status");
                }
            }
        }

        debug!(sessions = self.sessions.len(), "hub loop finished");
    }

    pub fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Register(session) => self.register(session),
            HubEvent::Unregister(id) => self.unregister(&id),
            HubEvent::Broadcast(payload) => {
                self.broadcast(payload);
            }
            HubEvent::Members(reply) => {
                let _ = reply.send(self.sessions.keys().copied().collect());
            }
        }
    }

    pub fn register(&mut self, session: SessionHandle) {
        if self.sessions.contains_key(&session.id) {
            warn!(session = %session.id, "ignoring duplicate registration");
            return;
        }
        debug!(session = %session.id, "registered");
        self.sessions.insert(session.id, session.mailbox);
    }

    pub fn unregister(&mut self, id: &SessionId) {
        // Dropping the sender closes the mailbox.
        if self.sessions.remove(id).is_some() {
            debug!(session = %id, "unregistered");
        }
    }

    /// Offers `payload` to every registered mailbox and evicts the sessions
    /// that could not take it. Returns how many mailboxes accepted it.
    pub fn broadcast(&mut self, payload: Bytes) -> usize {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        for (id, mailbox) in &self.sessions {
            match mailbox.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(session = %id, "mailbox full, evicting slow consumer");
                    evicted.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(session = %id, "mailbox already closed");
                    evicted.push(*id);
                }
            }
        }

        for id in evicted {
            self.sessions.remove(&id);
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_registered(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
