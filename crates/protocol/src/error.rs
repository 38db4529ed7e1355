//! Fehlertypen fuer das Wire-Format

use thiserror::Error;

/// Fehler beim Dekodieren oder Kodieren eines Frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame ist kein gueltiges JSON oder hat die falsche Form
    #[error("Ungueltiger Frame: {0}")]
    UngueltigerFrame(#[from] serde_json::Error),

    /// Frame ueberschreitet die erlaubte Groesse
    #[error("Frame zu gross: {groesse} Bytes (max {max})")]
    FrameZuGross { groesse: usize, max: usize },

    /// Event-Name ist nicht Teil des Vokabulars
    #[error("Unbekanntes Event: {0}")]
    UnbekanntesEvent(String),

    /// Payload passt nicht zum Event
    #[error("Ungueltiger Payload fuer '{event}': {grund}")]
    UngueltigerPayload { event: &'static str, grund: String },
}

/// Result-Typ fuer das Protokoll-Crate
pub type ProtocolResult<T> = Result<T, ProtocolError>;
