//! Raum-Handler – Beitreten und Verlassen von Call-Raeumen
//!
//! Reihenfolge beim Beitritt:
//! 1. `user:joined` an alle bisherigen Mitglieder
//! 2. Aufrufer wird Mitglied
//! 3. Echo des Original-Payloads als `room:join` an den Aufrufer
//!
//! Der Aufrufer erhaelt seine eigene Ankuendigung nie.

use rendezvous_core::ConnectionId;
use rendezvous_protocol::events::{RoomJoinPayload, RoomLeavePayload};
use rendezvous_protocol::OutboundEvent;
use serde_json::Value;

use crate::server_state::SignalingState;

/// Verarbeitet `room:join`
pub fn handle_room_join(
    payload: RoomJoinPayload,
    raw: Value,
    connection_id: ConnectionId,
    state: &SignalingState,
) {
    let RoomJoinPayload { email, room } = payload;

    // Event-Lock: Ankuendigung und Beitritt sind atomar
    let _presence = state.presence.lock();

    let angekuendigt = state.senden_an_raum_ausser(
        &room,
        &connection_id,
        OutboundEvent::UserJoined {
            email: email.clone(),
            id: connection_id,
        },
    );
    let neu = state.broadcaster.raum_beitreten(connection_id, room.clone());
    state.senden_an(&connection_id, OutboundEvent::RoomJoined(raw));

    tracing::info!(
        connection_id = %connection_id,
        email = %email,
        raum = %room,
        angekuendigt,
        erneut = !neu,
        "Raum beigetreten"
    );
}

/// Verarbeitet `room:leave`
///
/// Mit Raum wird nur dieser verlassen, ohne Raum alle Raeume der Verbindung.
pub fn handle_room_leave(payload: RoomLeavePayload, connection_id: ConnectionId, state: &SignalingState) {
    let _presence = state.presence.lock();

    match payload.room {
        Some(raum) => {
            if state.broadcaster.raum_verlassen(&connection_id, &raum) {
                tracing::info!(connection_id = %connection_id, raum = %raum, "Raum verlassen");
            } else {
                tracing::debug!(
                    connection_id = %connection_id,
                    raum = %raum,
                    "Verbindung war nicht Mitglied des Raums"
                );
            }
        }
        None => {
            let raeume = state.broadcaster.alle_raeume_verlassen(&connection_id);
            tracing::info!(
                connection_id = %connection_id,
                anzahl = raeume.len(),
                "Alle Raeume verlassen"
            );
        }
    }
}
