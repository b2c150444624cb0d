//! The hub: single owner of the session registry and the fan-out logic.

pub mod engine;
pub mod event;

pub use engine::Hub;
pub use event::{HubEvent, HubHandle};
