//! rendezvous-signaling – Presence-Registry und Event-Relay
//!
//! Dieser Crate implementiert den Signaling-Hub fuer Rendezvous. Er nimmt
//! WebSocket-Verbindungen an, fuehrt Buch darueber welche Identitaet unter
//! welcher Verbindung erreichbar ist, und leitet Chat- und Call-Events
//! zwischen den Parteien weiter. Medien fliessen nie durch den Hub.
//!
//! ## Architektur
//!
//! ```text
//! axum Listener (SignalingServer, GET /ws)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  select!: Frames, Send-Queue, Keepalive, Shutdown
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- PresenceHandler (Register, Deregister)
//!     +-- ChatHandler     (gezielte Weiterleitung)
//!     +-- RoomHandler     (Join, Leave)
//!     +-- CallHandler     (Offer/Answer-Weiterleitung)
//!
//! PresenceRegistry – Identitaet <-> Verbindung, Profile
//! EventBroadcaster – Send-Queues und Raum-Mitgliedschaften
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod presence;
pub mod server_state;
pub mod ws;

#[cfg(test)]
mod test_support;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::{ClientConnection, DisconnectReason};
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use presence::PresenceRegistry;
pub use server_state::{SignalingConfig, SignalingState};
pub use ws::SignalingServer;
