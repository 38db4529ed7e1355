//! Presence-Registry – Wer ist unter welcher Verbindung erreichbar
//!
//! Haelt die drei Zuordnungen des Hubs im Speicher:
//!
//! ```text
//! identity_to_connection : Identity     -> ConnectionId
//! connection_to_identity : ConnectionId -> Identity
//! profiles               : Identity     -> Profile
//! ```
//!
//! Die beiden Richtungs-Maps sind immer exakte Inverse voneinander; jede
//! Aenderung erfolgt paarweise. Eine Identitaet ist "online" genau dann,
//! wenn sie in `identity_to_connection` steht.
//!
//! Die Registry selbst ist nicht synchronisiert. Der `SignalingState`
//! haelt sie hinter einem Mutex, damit jedes Event atomar gegenueber
//! allen anderen Events verarbeitet wird.

use rendezvous_core::{ConnectionId, Identity, Profile};
use rendezvous_protocol::UserInfo;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Bindung
// ---------------------------------------------------------------------------

/// Ergebnis von [`PresenceRegistry::binden`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindung {
    /// Vorherige Verbindung der Identitaet (Re-Registrierung)
    pub alte_connection: Option<ConnectionId>,
    /// Identitaet, die bisher an der aufrufenden Verbindung hing und
    /// durch die neue Bindung verdraengt wurde
    pub verdraengte_identity: Option<Identity>,
}

// ---------------------------------------------------------------------------
// PresenceRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    identity_to_connection: HashMap<Identity, ConnectionId>,
    connection_to_identity: HashMap<ConnectionId, Identity>,
    profiles: HashMap<Identity, Profile>,
}

impl PresenceRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Bindet `identity` an `connection` und raeumt veraltete Eintraege auf
    ///
    /// - Die alte Verbindung der Identitaet verliert ihren Rueckwaerts-Eintrag,
    ///   damit ihr spaeteres Trennen die Identitaet nicht mehr abmeldet.
    /// - War die Verbindung an eine andere Identitaet gebunden, wird diese
    ///   vollstaendig entfernt (inklusive Profil).
    pub fn binden(&mut self, identity: Identity, connection: ConnectionId) -> Bindung {
        let mut bindung = Bindung::default();

        if let Some(alt) = self.identity_to_connection.get(&identity).copied() {
            if alt != connection {
                self.connection_to_identity.remove(&alt);
                bindung.alte_connection = Some(alt);
            }
        }

        if let Some(vorher) = self.connection_to_identity.get(&connection) {
            if *vorher != identity {
                let vorher = vorher.clone();
                self.identity_to_connection.remove(&vorher);
                self.profiles.remove(&vorher);
                bindung.verdraengte_identity = Some(vorher);
            }
        }

        self.identity_to_connection
            .insert(identity.clone(), connection);
        self.connection_to_identity.insert(connection, identity);

        bindung
    }

    /// Setzt oder ueberschreibt das Profil einer Identitaet
    pub fn profil_setzen(&mut self, identity: Identity, profil: Profile) {
        self.profiles.insert(identity, profil);
    }

    /// Schnappschuss aller bekannten Profile ohne `ausser`
    ///
    /// Sortiert nach Identitaet, damit die Reihenfolge stabil ist.
    pub fn schnappschuss(&self, ausser: &Identity) -> Vec<UserInfo> {
        let mut liste: Vec<UserInfo> = self
            .profiles
            .iter()
            .filter(|(identity, _)| *identity != ausser)
            .map(|(identity, profil)| UserInfo {
                email: identity.clone(),
                name: profil.name.clone(),
                avatar: profil.avatar.clone(),
            })
            .collect();
        liste.sort_by(|a, b| a.email.cmp(&b.email));
        liste
    }

    /// Entfernt die Verbindung und die an ihr haengende Identitaet
    ///
    /// Gibt die aufgeloeste Identitaet zurueck. Fuer nie registrierte
    /// Verbindungen ist das ein No-Op und liefert `None`.
    pub fn verbindung_entfernen(&mut self, connection: &ConnectionId) -> Option<Identity> {
        let identity = self.connection_to_identity.remove(connection)?;
        self.identity_to_connection.remove(&identity);
        self.profiles.remove(&identity);
        Some(identity)
    }

    /// Aktuelle Verbindung einer Identitaet
    pub fn connection_von(&self, identity: &Identity) -> Option<ConnectionId> {
        self.identity_to_connection.get(identity).copied()
    }

    /// Identitaet einer Verbindung
    pub fn identity_von(&self, connection: &ConnectionId) -> Option<&Identity> {
        self.connection_to_identity.get(connection)
    }

    pub fn ist_online(&self, identity: &Identity) -> bool {
        self.identity_to_connection.contains_key(identity)
    }

    /// Anzahl der online Identitaeten
    pub fn online_anzahl(&self) -> usize {
        self.identity_to_connection.len()
    }

    /// Prueft die Invarianten der drei Maps
    ///
    /// - beide Richtungs-Maps sind Inverse voneinander
    /// - Profil-Tabelle und Presence stimmen in der Mitgliedschaft ueberein
    pub fn ist_konsistent(&self) -> bool {
        let gespiegelt = self.identity_to_connection.len() == self.connection_to_identity.len()
            && self.identity_to_connection.iter().all(|(identity, connection)| {
                self.connection_to_identity.get(connection) == Some(identity)
            });
        let profile_passen = self.profiles.len() == self.identity_to_connection.len()
            && self
                .profiles
                .keys()
                .all(|identity| self.identity_to_connection.contains_key(identity));
        gespiegelt && profile_passen
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
