//! Message-Dispatcher – Routet eingehende Events an die richtigen Handler
//!
//! Der Dispatcher empfaengt dekodierte Events von einer ClientConnection
//! und ruft den passenden Handler auf. Antworten gehen nicht ueber einen
//! Rueckgabewert, sondern ueber die Send-Queues des Broadcasters.

use rendezvous_core::ConnectionId;
use rendezvous_protocol::InboundEvent;
use std::sync::Arc;

use crate::connection::DisconnectReason;
use crate::handlers::{call_handler, chat_handler, presence_handler, room_handler};
use crate::server_state::SignalingState;

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes Event der Verbindung `connection_id`
    pub fn dispatch(&self, event: InboundEvent, connection_id: ConnectionId) {
        self.state.metriken.event_empfangen(event.name());
        tracing::trace!(
            connection_id = %connection_id,
            event = event.name(),
            "Event empfangen"
        );

        let state = self.state.as_ref();
        match event {
            InboundEvent::RegisterUser(payload) => {
                presence_handler::handle_register(payload, connection_id, state)
            }
            InboundEvent::ChatMessage(payload) => {
                chat_handler::handle_chat(payload, connection_id, state)
            }
            InboundEvent::RoomJoin { payload, raw } => {
                room_handler::handle_room_join(payload, raw, connection_id, state)
            }
            InboundEvent::RoomLeave(payload) => {
                room_handler::handle_room_leave(payload, connection_id, state)
            }
            InboundEvent::UserCall(payload) => {
                call_handler::handle_user_call(payload, connection_id, state)
            }
            InboundEvent::CallAccepted(payload) => {
                call_handler::handle_call_accepted(payload, connection_id, state)
            }
            InboundEvent::PeerNegoNeeded(payload) => {
                call_handler::handle_nego_needed(payload, connection_id, state)
            }
            InboundEvent::PeerNegoDone(payload) => {
                call_handler::handle_nego_done(payload, connection_id, state)
            }
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    pub fn client_cleanup(&self, connection_id: ConnectionId, grund: DisconnectReason) {
        presence_handler::handle_deregister(connection_id, grund, &self.state);
        tracing::debug!(connection_id = %connection_id, "Verbindungs-Ressourcen bereinigt");
    }
}
