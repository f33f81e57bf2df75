//! Domain Event Plumbing
//!
//! In-process publish/subscribe for the typed events in `shared::event`.
//! The bus is a broadcast channel; the router fans it out into per-concern
//! mpsc lanes for external consumers.

pub mod bus;
pub mod router;

pub use bus::EventBus;
pub use router::{EventChannels, EventRouter};
