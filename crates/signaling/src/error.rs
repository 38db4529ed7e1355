//! Fehlertypen fuer den Signaling-Service
//!
//! Fehler innerhalb einer Verbindung (ungueltige Frames, Lesefehler)
//! werden geloggt und beenden hoechstens diese Verbindung. Nur der
//! Listener selbst gibt Fehler nach aussen.

use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Listener, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Verbindungs-Limit erreicht
    #[error("Server ist voll")]
    ServerVoll,
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_fehler_wird_konvertiert() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "belegt");
        let e: SignalingError = io.into();
        assert!(e.to_string().contains("belegt"));
    }
}
