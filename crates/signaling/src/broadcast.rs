//! Event-Broadcaster – Sendet Events an die richtigen Verbindungen
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller offenen
//! Verbindungen und die Raum-Mitgliedschaften. Alle Sendungen sind
//! fire-and-forget: volle oder geschlossene Queues verwerfen das Event.
//!
//! ## Selektives Broadcasting
//! - An eine Verbindung: `an_connection_senden`
//! - An alle ausser einer: `an_alle_ausser_senden`
//! - An einen Raum ausser einer Verbindung: `an_raum_ausser_senden`

use dashmap::DashMap;
use rendezvous_core::{ConnectionId, RoomId};
use rendezvous_protocol::OutboundEvent;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer offenen Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub connection_id: ConnectionId,
    pub tx: mpsc::Sender<OutboundEvent>,
}

impl ClientSender {
    /// Sendet ein Event nicht-blockierend an die Verbindung
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: OutboundEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    event = event.name(),
                    "Send-Queue voll – Event verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "Send-Queue geschlossen (Verbindung getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle offenen Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Send-Queues, indiziert nach ConnectionId
    clients: DashMap<ConnectionId, ClientSender>,
    /// Raum -> Mitglieder
    raum_mitglieder: DashMap<RoomId, HashSet<ConnectionId>>,
    /// Verbindung -> beigetretene Raeume
    connection_raeume: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl EventBroadcaster {
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                raum_mitglieder: DashMap::new(),
                connection_raeume: DashMap::new(),
            }),
        }
    }

    /// Registriert eine neue Verbindung und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und schreibt auf den Socket.
    pub fn connection_registrieren(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<OutboundEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { connection_id, tx };
        self.inner.clients.insert(connection_id, sender);
        tracing::debug!(connection_id = %connection_id, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung samt aller Raum-Mitgliedschaften
    pub fn connection_entfernen(&self, connection_id: &ConnectionId) {
        self.inner.clients.remove(connection_id);
        self.alle_raeume_verlassen(connection_id);
        tracing::debug!(connection_id = %connection_id, "Verbindung aus Broadcaster entfernt");
    }

    /// Fuegt eine Verbindung einem Raum hinzu
    ///
    /// Gibt `false` zurueck wenn sie bereits Mitglied war.
    pub fn raum_beitreten(&self, connection_id: ConnectionId, raum: RoomId) -> bool {
        let neu = self
            .inner
            .raum_mitglieder
            .entry(raum.clone())
            .or_default()
            .insert(connection_id);
        self.inner
            .connection_raeume
            .entry(connection_id)
            .or_default()
            .insert(raum);
        neu
    }

    /// Entfernt eine Verbindung aus einem Raum
    ///
    /// Gibt `false` zurueck wenn sie nicht Mitglied war.
    pub fn raum_verlassen(&self, connection_id: &ConnectionId, raum: &RoomId) -> bool {
        let war_mitglied = match self.inner.raum_mitglieder.get_mut(raum) {
            Some(mut mitglieder) => mitglieder.remove(connection_id),
            None => false,
        };
        // Leere Raeume aufraeumen
        self.inner
            .raum_mitglieder
            .remove_if(raum, |_, mitglieder| mitglieder.is_empty());

        if let Some(mut raeume) = self.inner.connection_raeume.get_mut(connection_id) {
            raeume.remove(raum);
        }
        self.inner
            .connection_raeume
            .remove_if(connection_id, |_, raeume| raeume.is_empty());

        war_mitglied
    }

    /// Entfernt eine Verbindung aus allen Raeumen und gibt diese zurueck
    pub fn alle_raeume_verlassen(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let raeume: Vec<RoomId> = match self.inner.connection_raeume.remove(connection_id) {
            Some((_, raeume)) => raeume.into_iter().collect(),
            None => return Vec::new(),
        };
        for raum in &raeume {
            if let Some(mut mitglieder) = self.inner.raum_mitglieder.get_mut(raum) {
                mitglieder.remove(connection_id);
            }
            self.inner
                .raum_mitglieder
                .remove_if(raum, |_, mitglieder| mitglieder.is_empty());
        }
        raeume
    }

    /// Sendet ein Event an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung gefunden und das Event eingereiht wurde.
    pub fn an_connection_senden(&self, connection_id: &ConnectionId, event: OutboundEvent) -> bool {
        match self.inner.clients.get(connection_id) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(connection_id = %connection_id, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet ein Event an alle Mitglieder eines Raums ausser einem
    ///
    /// Nuetzlich um Join-Events zu verteilen ohne den Ausloeser zu informieren.
    pub fn an_raum_ausser_senden(
        &self,
        raum: &RoomId,
        ausgeschlossen: &ConnectionId,
        event: OutboundEvent,
    ) -> usize {
        let mitglieder = self.mitglieder_von(raum);

        let mut gesendet = 0;
        for connection_id in &mitglieder {
            if connection_id == ausgeschlossen {
                continue;
            }
            if let Some(sender) = self.inner.clients.get(connection_id) {
                if sender.senden(event.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Sendet ein Event an alle offenen Verbindungen ausser einer
    pub fn an_alle_ausser_senden(
        &self,
        ausgeschlossen: &ConnectionId,
        event: OutboundEvent,
    ) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|entry| {
            if entry.key() == ausgeschlossen {
                return;
            }
            if entry.value().senden(event.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Anzahl der registrierten Verbindungen
    pub fn connection_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.clients.contains_key(connection_id)
    }

    /// Alle Mitglieder eines Raums
    pub fn mitglieder_von(&self, raum: &RoomId) -> Vec<ConnectionId> {
        self.inner
            .raum_mitglieder
            .get(raum)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Alle Raeume einer Verbindung
    pub fn raeume_von(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.inner
            .connection_raeume
            .get(connection_id)
            .map(|raeume| raeume.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_event(n: u64) -> OutboundEvent {
        OutboundEvent::ChatMessage(json!(n))
    }

    #[tokio::test]
    async fn registrieren_und_senden() {
        let broadcaster = EventBroadcaster::neu();
        let c = ConnectionId::new();

        let mut rx = broadcaster.connection_registrieren(c);
        assert!(broadcaster.ist_registriert(&c));

        assert!(broadcaster.an_connection_senden(&c, test_event(1)));
        assert_eq!(rx.try_recv().unwrap(), test_event(1));
    }

    #[test]
    fn senden_an_unbekannte_verbindung() {
        let broadcaster = EventBroadcaster::neu();
        assert!(!broadcaster.an_connection_senden(&ConnectionId::new(), test_event(1)));
    }

    #[tokio::test]
    async fn an_raum_ausser_senden() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::from("1");
        let c1 = ConnectionId::new();
        let c2 = ConnectionId::new();

        let mut rx1 = broadcaster.connection_registrieren(c1);
        let mut rx2 = broadcaster.connection_registrieren(c2);
        broadcaster.raum_beitreten(c1, raum.clone());
        broadcaster.raum_beitreten(c2, raum.clone());

        assert_eq!(broadcaster.an_raum_ausser_senden(&raum, &c1, test_event(30)), 1);
        assert!(rx1.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn an_alle_ausser_senden() {
        let broadcaster = EventBroadcaster::neu();
        let c1 = ConnectionId::new();
        let c2 = ConnectionId::new();

        let mut rx1 = broadcaster.connection_registrieren(c1);
        let mut rx2 = broadcaster.connection_registrieren(c2);

        assert_eq!(broadcaster.an_alle_ausser_senden(&c1, test_event(20)), 1);
        assert!(rx1.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn volle_queue_verwirft() {
        let broadcaster = EventBroadcaster::neu();
        let c = ConnectionId::new();
        let _rx = broadcaster.connection_registrieren(c);

        for i in 0..SEND_QUEUE_GROESSE {
            assert!(broadcaster.an_connection_senden(&c, test_event(i as u64)));
        }
        assert!(!broadcaster.an_connection_senden(&c, test_event(0)));
    }

    #[test]
    fn geschlossene_queue_verwirft() {
        let broadcaster = EventBroadcaster::neu();
        let c = ConnectionId::new();
        drop(broadcaster.connection_registrieren(c));
        assert!(!broadcaster.an_connection_senden(&c, test_event(1)));
    }

    #[test]
    fn raum_verlassen_raeumt_auf() {
        let broadcaster = EventBroadcaster::neu();
        let c = ConnectionId::new();
        let raum = RoomId::from("1");
        let _rx = broadcaster.connection_registrieren(c);

        assert!(broadcaster.raum_beitreten(c, raum.clone()));
        assert!(!broadcaster.raum_beitreten(c, raum.clone()));
        assert_eq!(broadcaster.raeume_von(&c), vec![raum.clone()]);

        assert!(broadcaster.raum_verlassen(&c, &raum));
        assert!(!broadcaster.raum_verlassen(&c, &raum));
        assert!(broadcaster.mitglieder_von(&raum).is_empty());
        assert!(broadcaster.raeume_von(&c).is_empty());
    }

    #[test]
    fn entfernen_bereinigt_raum_zugehoerigkeit() {
        let broadcaster = EventBroadcaster::neu();
        let c = ConnectionId::new();
        let _rx = broadcaster.connection_registrieren(c);

        broadcaster.raum_beitreten(c, RoomId::from("a"));
        broadcaster.raum_beitreten(c, RoomId::from("b"));
        assert_eq!(broadcaster.raeume_von(&c).len(), 2);

        broadcaster.connection_entfernen(&c);
        assert!(!broadcaster.ist_registriert(&c));
        assert!(broadcaster.mitglieder_von(&RoomId::from("a")).is_empty());
        assert!(broadcaster.mitglieder_von(&RoomId::from("b")).is_empty());
    }
}
