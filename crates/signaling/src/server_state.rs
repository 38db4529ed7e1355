//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Presence-Registry, Broadcaster und Metriken, die zwischen allen
//! Verbindungs-Tasks geteilt werden.
//!
//! ## Atomaritaet
//! Die Registry liegt hinter einem einzigen `parking_lot::Mutex`. Jeder
//! Handler, der Presence oder Raeume veraendert, haelt diesen Lock fuer
//! die gesamte Dauer des Events (inklusive der Broadcasts). Gesendet wird
//! ausschliesslich per `try_send`, der Lock wird also nie ueber einen
//! `.await` gehalten.

use parking_lot::Mutex;
use rendezvous_core::{ConnectionId, RoomId};
use rendezvous_observability::RendezvousMetrics;
use rendezvous_protocol::OutboundEvent;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::broadcast::EventBroadcaster;
use crate::presence::PresenceRegistry;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Maximale gleichzeitige Verbindungen
    pub max_verbindungen: usize,
    /// Intervall fuer WebSocket-Pings in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer Verbindungen ohne eingehenden Frame in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Maximale Groesse eines eingehenden Frames in Bytes
    pub max_frame_groesse: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            max_verbindungen: 1024,
            keepalive_sek: 25,
            verbindungs_timeout_sek: 60,
            max_frame_groesse: rendezvous_protocol::wire::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    pub config: Arc<SignalingConfig>,
    /// Presence-Registry, zugleich Event-Lock
    pub presence: Mutex<PresenceRegistry>,
    pub broadcaster: EventBroadcaster,
    pub metriken: RendezvousMetrics,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
    /// Ein Permit pro offener Verbindung, begrenzt auf `max_verbindungen`
    verbindungs_slots: Arc<Semaphore>,
}

impl SignalingState {
    pub fn neu(config: SignalingConfig, metriken: RendezvousMetrics) -> Arc<Self> {
        let verbindungs_slots = Arc::new(Semaphore::new(config.max_verbindungen));
        Arc::new(Self {
            config: Arc::new(config),
            presence: Mutex::new(PresenceRegistry::neu()),
            broadcaster: EventBroadcaster::neu(),
            metriken,
            start_time: Instant::now(),
            verbindungs_slots,
        })
    }

    /// Reserviert einen Verbindungs-Slot, `None` wenn das Limit erreicht ist
    ///
    /// Der Slot bleibt belegt, bis das Permit gedroppt wird.
    pub fn slot_reservieren(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.verbindungs_slots).try_acquire_owned().ok()
    }

    /// Anzahl der noch freien Verbindungs-Slots
    pub fn freie_slots(&self) -> usize {
        self.verbindungs_slots.available_permits()
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Sendet an eine Verbindung und zaehlt Zustellung bzw. Verwurf
    pub(crate) fn senden_an(&self, ziel: &ConnectionId, event: OutboundEvent) -> bool {
        let name = event.name();
        let eingereiht = self.broadcaster.an_connection_senden(ziel, event);
        if eingereiht {
            self.metriken.event_zugestellt(name, 1);
        } else {
            self.metriken.relay_verworfen(name);
        }
        eingereiht
    }

    /// Sendet an alle Verbindungen ausser `ausser`
    pub(crate) fn senden_an_alle_ausser(&self, ausser: &ConnectionId, event: OutboundEvent) -> usize {
        let name = event.name();
        let gesendet = self.broadcaster.an_alle_ausser_senden(ausser, event);
        self.metriken.event_zugestellt(name, gesendet);
        gesendet
    }

    /// Sendet an alle Mitglieder eines Raums ausser `ausser`
    pub(crate) fn senden_an_raum_ausser(
        &self,
        raum: &RoomId,
        ausser: &ConnectionId,
        event: OutboundEvent,
    ) -> usize {
        let name = event.name();
        let gesendet = self.broadcaster.an_raum_ausser_senden(raum, ausser, event);
        self.metriken.event_zugestellt(name, gesendet);
        gesendet
    }

    /// Aktualisiert die Presence-Gauges
    pub(crate) fn gauges_aktualisieren(&self, presence: &PresenceRegistry) {
        self.metriken
            .identities_online
            .set(presence.online_anzahl() as i64);
        self.metriken
            .connections
            .set(self.broadcaster.connection_anzahl() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_mit_limit(max_verbindungen: usize) -> Arc<SignalingState> {
        let config = SignalingConfig {
            max_verbindungen,
            ..SignalingConfig::default()
        };
        SignalingState::neu(config, RendezvousMetrics::neu().unwrap())
    }

    #[test]
    fn slots_sind_auf_max_verbindungen_begrenzt() {
        let state = state_mit_limit(2);
        let a = state.slot_reservieren().expect("erster Slot");
        let _b = state.slot_reservieren().expect("zweiter Slot");
        assert_eq!(state.freie_slots(), 0);
        assert!(state.slot_reservieren().is_none());

        drop(a);
        assert_eq!(state.freie_slots(), 1);
        assert!(state.slot_reservieren().is_some());
    }

    #[test]
    fn gleichzeitige_reservierungen_ueberschreiten_limit_nicht() {
        let state = state_mit_limit(3);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || state.slot_reservieren())
            })
            .collect();
        let slots: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        assert_eq!(slots.iter().filter(|s| s.is_some()).count(), 3);
        assert_eq!(state.freie_slots(), 0);
    }
}
