//! rendezvous-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Rendezvous-Crates gemeinsam genutzt werden: Identifikations-Newtypes
//! fuer Verbindungen, Identitaeten und Raeume sowie das Benutzerprofil.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{CoreError, Result};
pub use types::{ConnectionId, Identity, Profile, RoomId};
