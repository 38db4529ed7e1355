//! Hilfen fuer Handler-Tests: ein Hub ohne echten Transport
//!
//! Die Empfangs-Queues aus dem Broadcaster stehen fuer die Sockets.

use rendezvous_core::ConnectionId;
use rendezvous_observability::RendezvousMetrics;
use rendezvous_protocol::OutboundEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::server_state::{SignalingConfig, SignalingState};

pub(crate) struct TestClient {
    pub id: ConnectionId,
    pub rx: mpsc::Receiver<OutboundEvent>,
}

impl TestClient {
    /// Alle bisher eingereihten Events
    pub fn empfangen(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

pub(crate) fn test_state() -> Arc<SignalingState> {
    let metriken = RendezvousMetrics::neu().expect("Metriken");
    SignalingState::neu(SignalingConfig::default(), metriken)
}

pub(crate) fn verbinden(state: &SignalingState) -> TestClient {
    let id = ConnectionId::new();
    let rx = state.broadcaster.connection_registrieren(id);
    TestClient { id, rx }
}
