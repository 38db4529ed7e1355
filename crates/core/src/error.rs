//! Fehlertypen fuer Rendezvous
//!
//! Gemeinsamer Fehler-Enum fuer die Basistypen. Die uebrigen Crates
//! definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Rendezvous
pub type Result<T> = std::result::Result<T, CoreError>;

/// Fehler der Basistypen
#[derive(Debug, Error)]
pub enum CoreError {
    /// String ist keine gueltige Verbindungs-ID
    #[error("Ungueltige Verbindungs-ID: {0}")]
    UngueltigeConnectionId(String),
}
