//! Call-Handler – Weiterleitung der Offer/Answer-Aushandlung
//!
//! Reine Weiterleitungen ohne Zustandsaenderung: `{to, payload}` wird als
//! `{from: Aufrufer, payload}` an `to` zugestellt. Ein unbekanntes oder
//! fehlendes Ziel ist ein No-Op.
//!
//! | Eingehend          | Ausgehend          |
//! |--------------------|--------------------|
//! | `user:call`        | `incomming:call`   |
//! | `call:accepted`    | `call:accepted`    |
//! | `peer:nego:needed` | `peer:nego:needed` |
//! | `peer:nego:done`   | `peer:nego:final`  |

use rendezvous_core::ConnectionId;
use rendezvous_protocol::events::{AnswerPayload, OfferPayload};
use rendezvous_protocol::OutboundEvent;

use crate::server_state::SignalingState;

/// Verarbeitet `user:call`
pub fn handle_user_call(payload: OfferPayload, connection_id: ConnectionId, state: &SignalingState) {
    let OfferPayload { to, offer } = payload;
    weiterleiten(
        to,
        connection_id,
        OutboundEvent::IncomingCall {
            from: connection_id,
            offer,
        },
        state,
    );
}

/// Verarbeitet `call:accepted`
pub fn handle_call_accepted(payload: AnswerPayload, connection_id: ConnectionId, state: &SignalingState) {
    let AnswerPayload { to, ans } = payload;
    weiterleiten(
        to,
        connection_id,
        OutboundEvent::CallAccepted {
            from: connection_id,
            ans,
        },
        state,
    );
}

/// Verarbeitet `peer:nego:needed`
pub fn handle_nego_needed(payload: OfferPayload, connection_id: ConnectionId, state: &SignalingState) {
    let OfferPayload { to, offer } = payload;
    weiterleiten(
        to,
        connection_id,
        OutboundEvent::PeerNegoNeeded {
            from: connection_id,
            offer,
        },
        state,
    );
}

/// Verarbeitet `peer:nego:done`
pub fn handle_nego_done(payload: AnswerPayload, connection_id: ConnectionId, state: &SignalingState) {
    let AnswerPayload { to, ans } = payload;
    weiterleiten(
        to,
        connection_id,
        OutboundEvent::PeerNegoFinal {
            from: connection_id,
            ans,
        },
        state,
    );
}

fn weiterleiten(
    to: Option<ConnectionId>,
    von: ConnectionId,
    event: OutboundEvent,
    state: &SignalingState,
) {
    let name = event.name();
    let Some(ziel) = to else {
        tracing::debug!(von = %von, event = name, "Weiterleitung ohne gueltiges Ziel");
        return;
    };
    if state.senden_an(&ziel, event) {
        tracing::debug!(von = %von, an = %ziel, event = name, "Weitergeleitet");
    } else {
        tracing::debug!(von = %von, an = %ziel, event = name, "Ziel nicht erreichbar");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, verbinden};
    use serde_json::json;

    #[tokio::test]
    async fn anruf_erreicht_genau_das_ziel() {
        let state = test_state();
        let mut a = verbinden(&state);
        let mut b = verbinden(&state);
        let mut c = verbinden(&state);

        handle_user_call(
            OfferPayload {
                to: Some(b.id),
                offer: json!({"type": "offer", "sdp": "v=0"}),
            },
            a.id,
            &state,
        );

        assert_eq!(
            b.empfangen(),
            vec![OutboundEvent::IncomingCall {
                from: a.id,
                offer: json!({"type": "offer", "sdp": "v=0"}),
            }]
        );
        assert!(a.empfangen().is_empty());
        assert!(c.empfangen().is_empty());
    }

    #[tokio::test]
    async fn vollstaendige_aushandlung() {
        let state = test_state();
        let mut a = verbinden(&state);
        let mut b = verbinden(&state);

        handle_call_accepted(
            AnswerPayload {
                to: Some(a.id),
                ans: json!("antwort"),
            },
            b.id,
            &state,
        );
        handle_nego_needed(
            OfferPayload {
                to: Some(b.id),
                offer: json!("neu"),
            },
            a.id,
            &state,
        );
        handle_nego_done(
            AnswerPayload {
                to: Some(a.id),
                ans: json!("fertig"),
            },
            b.id,
            &state,
        );

        assert_eq!(
            a.empfangen(),
            vec![
                OutboundEvent::CallAccepted {
                    from: b.id,
                    ans: json!("antwort"),
                },
                OutboundEvent::PeerNegoFinal {
                    from: b.id,
                    ans: json!("fertig"),
                },
            ]
        );
        assert_eq!(
            b.empfangen(),
            vec![OutboundEvent::PeerNegoNeeded {
                from: a.id,
                offer: json!("neu"),
            }]
        );
    }

    #[tokio::test]
    async fn unbekanntes_oder_fehlendes_ziel_ist_no_op() {
        let state = test_state();
        let mut a = verbinden(&state);

        handle_user_call(
            OfferPayload {
                to: Some(ConnectionId::new()),
                offer: json!({}),
            },
            a.id,
            &state,
        );
        handle_nego_done(AnswerPayload::default(), a.id, &state);

        assert!(a.empfangen().is_empty());
        assert_eq!(state.presence.lock().online_anzahl(), 0);
        assert_eq!(
            state
                .metriken
                .relays_dropped_total
                .with_label_values(&["incomming:call"])
                .get(),
            1
        );
    }
}
