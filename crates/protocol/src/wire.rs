//! Wire-Format fuer WebSocket-Verbindungen
//!
//! Jedes Event reist als eigener WebSocket-Text-Frame mit einem
//! JSON-Umschlag:
//!
//! ```text
//! {"event": "<name>", "data": <beliebiges JSON>}
//! ```
//!
//! `data` darf fehlen und wird dann als `null` behandelt. Die maximale
//! Frame-Groesse ist konfigurierbar (Standard: 1 MB).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};
use crate::events::OutboundEvent;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (1 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// JSON-Umschlag eines einzelnen Events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event-Name, z.B. `register:user`
    pub event: String,
    /// Payload, wird nicht interpretiert
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Dekodiert einen Text-Frame mit Standard-Limit
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        Self::decode_mit_limit(text, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Dekodiert einen Text-Frame und prueft die Groesse vor dem Parsen
    pub fn decode_mit_limit(text: &str, max_frame_size: usize) -> ProtocolResult<Self> {
        if text.len() > max_frame_size {
            return Err(ProtocolError::FrameZuGross {
                groesse: text.len(),
                max: max_frame_size,
            });
        }
        Ok(serde_json::from_str(text)?)
    }
}

/// Kodiert ein ausgehendes Event direkt als Text-Frame
pub fn encode_event(event: &OutboundEvent) -> ProtocolResult<String> {
    Ok(serde_json::to_string(event)?)
}
