//! rendezvous-protocol – Event-Vokabular und Wire-Format
//!
//! Dieses Crate definiert alle Events, die zwischen Client und Hub
//! ueber die WebSocket-Verbindung ausgetauscht werden, sowie den
//! JSON-Umschlag `{"event": ..., "data": ...}` in dem sie reisen.

pub mod error;
pub mod events;
pub mod wire;

pub use error::{ProtocolError, ProtocolResult};
pub use events::{InboundEvent, OutboundEvent, UserInfo};
pub use wire::Envelope;
