//! Presence-Handler – Registrieren und Abmelden von Identitaeten
//!
//! Registrierung:
//! 1. Identitaet an die Verbindung binden (veraltete Bindungen aufraeumen)
//! 2. `user:connected` an alle anderen Verbindungen
//! 3. `list:users` mit allen bisher bekannten Profilen an den Aufrufer
//! 4. Profil des Aufrufers speichern
//!
//! Abmeldung (Verbindung getrennt):
//! 1. Identitaet der Verbindung aufloesen (kann fehlen)
//! 2. `user:disconnected` an alle anderen Verbindungen
//! 3. Identitaet aus allen Maps entfernen

use rendezvous_core::{ConnectionId, Profile};
use rendezvous_protocol::events::RegisterPayload;
use rendezvous_protocol::{OutboundEvent, UserInfo};

use crate::connection::DisconnectReason;
use crate::server_state::SignalingState;

/// Verarbeitet `register:user`
pub fn handle_register(payload: RegisterPayload, connection_id: ConnectionId, state: &SignalingState) {
    let RegisterPayload {
        email,
        name,
        avatar,
    } = payload;

    let mut presence = state.presence.lock();

    let bindung = presence.binden(email.clone(), connection_id);
    if let Some(alte) = bindung.alte_connection {
        tracing::info!(
            email = %email,
            alte_connection = %alte,
            neue_connection = %connection_id,
            "Identitaet unter neuer Verbindung registriert"
        );
    }
    if let Some(verdraengt) = bindung.verdraengte_identity {
        tracing::info!(
            connection_id = %connection_id,
            email = %verdraengt,
            "Verbindung wechselt die Identitaet"
        );
        state.senden_an_alle_ausser(
            &connection_id,
            OutboundEvent::UserDisconnected(Some(verdraengt)),
        );
    }

    state.senden_an_alle_ausser(
        &connection_id,
        OutboundEvent::UserConnected(UserInfo {
            email: email.clone(),
            name: name.clone(),
            avatar: avatar.clone(),
        }),
    );

    let bekannte = presence.schnappschuss(&email);
    state.senden_an(&connection_id, OutboundEvent::ListUsers(bekannte));

    presence.profil_setzen(email.clone(), Profile::new(name, avatar));
    state.gauges_aktualisieren(&presence);

    tracing::info!(
        connection_id = %connection_id,
        email = %email,
        online = presence.online_anzahl(),
        "Identitaet registriert"
    );
}

/// Raeumt eine getrennte Verbindung auf
pub fn handle_deregister(connection_id: ConnectionId, grund: DisconnectReason, state: &SignalingState) {
    let mut presence = state.presence.lock();

    let identity = presence.identity_von(&connection_id).cloned();
    state.senden_an_alle_ausser(
        &connection_id,
        OutboundEvent::UserDisconnected(identity.clone()),
    );

    presence.verbindung_entfernen(&connection_id);
    state.broadcaster.connection_entfernen(&connection_id);
    state.gauges_aktualisieren(&presence);

    match identity {
        Some(email) => tracing::info!(
            connection_id = %connection_id,
            email = %email,
            grund = %grund,
            "Identitaet abgemeldet"
        ),
        None => tracing::debug!(
            connection_id = %connection_id,
            grund = %grund,
            "Nicht registrierte Verbindung getrennt"
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
