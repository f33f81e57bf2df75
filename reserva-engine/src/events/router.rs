//! Event Router - per-concern fan-out
//!
//! Decouples the engine's broadcast bus from external consumers with
//! independent channels:
//!
//! ```text
//! EventBus (broadcast)
//!        │
//!        └── EventRouter
//!               ├── mpsc ──► audit lane (terminal facts only)  [blocking]
//!               └── mpsc ──► notify lane (all events)          [best-effort]
//! ```
//!
//! Terminal facts (reservation lifecycle, table releases) must not be lost,
//! so the audit lane blocks. The notify lane feeds UI/notification layers
//! and drops on overflow rather than stalling the engine.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use shared::event::DomainEvent;

/// Receiver set handed to the integrator.
pub struct EventChannels {
    /// Terminal facts only, nothing dropped.
    pub audit_rx: mpsc::Receiver<Arc<DomainEvent>>,
    /// Every event, best-effort delivery.
    pub notify_rx: mpsc::Receiver<Arc<DomainEvent>>,
}

/// Routes the broadcast stream into the per-concern lanes.
pub struct EventRouter {
    audit_tx: mpsc::Sender<Arc<DomainEvent>>,
    notify_tx: mpsc::Sender<Arc<DomainEvent>>,
}

impl EventRouter {
    pub fn new(audit_buffer: usize, notify_buffer: usize) -> (Self, EventChannels) {
        let (audit_tx, audit_rx) = mpsc::channel(audit_buffer);
        let (notify_tx, notify_rx) = mpsc::channel(notify_buffer);

        (
            Self {
                audit_tx,
                notify_tx,
            },
            EventChannels {
                audit_rx,
                notify_rx,
            },
        )
    }

    /// Run the router until the source channel closes.
    pub async fn run(self, mut source: broadcast::Receiver<DomainEvent>) {
        tracing::info!("Event router started");

        loop {
            match source.recv().await {
                Ok(event) => {
                    self.dispatch(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::error!(
                        skipped = n,
                        "Event router lagged, audit events may be lost"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Source channel closed, event router stopping");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, event: DomainEvent) {
        let event = Arc::new(event);

        // Audit lane first: blocking send, terminal facts must not be lost.
        if event.is_terminal() && self.audit_tx.send(Arc::clone(&event)).await.is_err() {
            tracing::error!("Audit channel closed, terminal event lost");
        }

        match self.notify_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(
                    event_type = ?ev.event_type,
                    "Notify channel full, event dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Notify channel closed");
            }
        }
    }
}
