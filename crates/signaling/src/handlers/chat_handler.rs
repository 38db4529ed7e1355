//! Chat-Handler – gezielte Weiterleitung an eine Identitaet

use rendezvous_core::ConnectionId;
use rendezvous_protocol::events::ChatPayload;
use rendezvous_protocol::OutboundEvent;

use crate::server_state::SignalingState;

/// Verarbeitet `chat-message`
///
/// `msg` geht unveraendert an die aktuelle Verbindung der Ziel-Identitaet.
/// Ist das Ziel nicht online, wird die Nachricht verworfen.
pub fn handle_chat(payload: ChatPayload, connection_id: ConnectionId, state: &SignalingState) {
    let ChatPayload { msg, email } = payload;

    // Lookup und Einreihen unter demselben Lock, sonst kann eine
    // Re-Registrierung dazwischen liegen
    let presence = state.presence.lock();
    match presence.connection_von(&email) {
        Some(ziel) => {
            state.senden_an(&ziel, OutboundEvent::ChatMessage(msg));
            tracing::debug!(
                von = %connection_id,
                an = %email,
                "Chat-Nachricht weitergeleitet"
            );
        }
        None => {
            tracing::debug!(
                von = %connection_id,
                an = %email,
                "Chat-Ziel nicht online, Nachricht verworfen"
            );
        }
    }
}
