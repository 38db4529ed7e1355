//! Event-Vokabular des Signaling-Hubs
//!
//! ## Eingehend (Client -> Hub)
//! | Event              | Payload            |
//! |--------------------|--------------------|
//! | `register:user`    | `{email,name,avatar}` |
//! | `chat-message`     | `{msg,email}`      |
//! | `room:join`        | `{email,room}`     |
//! | `room:leave`       | optional `{room}`  |
//! | `user:call`        | `{to,offer}`       |
//! | `call:accepted`    | `{to,ans}`         |
//! | `peer:nego:needed` | `{to,offer}`       |
//! | `peer:nego:done`   | `{to,ans}`         |
//!
//! ## Ausgehend (Hub -> Client)
//! Siehe [`OutboundEvent`]. Der Event-Name `incomming:call` ist so
//! geschrieben wie ihn die bestehenden Clients erwarten.
//!
//! Fehlende oder `null`-Felder werden mit leeren Werten belegt statt
//! die Nachricht abzulehnen.

use rendezvous_core::{ConnectionId, Identity, RoomId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::Envelope;

// ---------------------------------------------------------------------------
// Event-Namen
// ---------------------------------------------------------------------------

pub mod names {
    pub const REGISTER_USER: &str = "register:user";
    pub const CHAT_MESSAGE: &str = "chat-message";
    pub const ROOM_JOIN: &str = "room:join";
    pub const ROOM_LEAVE: &str = "room:leave";
    pub const USER_CALL: &str = "user:call";
    pub const CALL_ACCEPTED: &str = "call:accepted";
    pub const PEER_NEGO_NEEDED: &str = "peer:nego:needed";
    pub const PEER_NEGO_DONE: &str = "peer:nego:done";

    pub const USER_CONNECTED: &str = "user:connected";
    pub const LIST_USERS: &str = "list:users";
    pub const USER_DISCONNECTED: &str = "user:disconnected";
    pub const USER_JOINED: &str = "user:joined";
    pub const INCOMING_CALL: &str = "incomming:call";
    pub const PEER_NEGO_FINAL: &str = "peer:nego:final";
}

// ---------------------------------------------------------------------------
// Tolerante Deserialisierung
// ---------------------------------------------------------------------------

/// `null` wird wie ein fehlendes Feld behandelt
fn null_als_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ungueltige Verbindungs-IDs ergeben `None` (Ziel unbekannt)
fn tolerante_connection_id<'de, D>(deserializer: D) -> Result<Option<ConnectionId>, D::Error>
where
    D: Deserializer<'de>,
{
    let roh = Option::<Value>::deserialize(deserializer)?;
    Ok(match roh {
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

fn payload_parsen<T>(event: &'static str, data: Value) -> ProtocolResult<T>
where
    T: DeserializeOwned + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| ProtocolError::UngueltigerPayload {
        event,
        grund: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Eingehende Payloads
// ---------------------------------------------------------------------------

/// `register:user`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegisterPayload {
    #[serde(deserialize_with = "null_als_default")]
    pub email: Identity,
    #[serde(deserialize_with = "null_als_default")]
    pub name: String,
    #[serde(deserialize_with = "null_als_default")]
    pub avatar: String,
}

/// `chat-message`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatPayload {
    /// Wird unveraendert an den Empfaenger weitergereicht
    pub msg: Value,
    /// Empfaenger-Identitaet
    #[serde(deserialize_with = "null_als_default")]
    pub email: Identity,
}

/// `room:join`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoomJoinPayload {
    #[serde(deserialize_with = "null_als_default")]
    pub email: Identity,
    #[serde(deserialize_with = "null_als_default")]
    pub room: RoomId,
}

/// `room:leave` – ohne Raum werden alle Raeume verlassen
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoomLeavePayload {
    pub room: Option<RoomId>,
}

/// `user:call` und `peer:nego:needed`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OfferPayload {
    #[serde(deserialize_with = "tolerante_connection_id")]
    pub to: Option<ConnectionId>,
    pub offer: Value,
}

/// `call:accepted` und `peer:nego:done`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnswerPayload {
    #[serde(deserialize_with = "tolerante_connection_id")]
    pub to: Option<ConnectionId>,
    pub ans: Value,
}

// ---------------------------------------------------------------------------
// InboundEvent
// ---------------------------------------------------------------------------

/// Ein vom Client empfangenes Event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    RegisterUser(RegisterPayload),
    ChatMessage(ChatPayload),
    RoomJoin {
        payload: RoomJoinPayload,
        /// Original-Payload fuer das Echo an den Beitretenden
        raw: Value,
    },
    RoomLeave(RoomLeavePayload),
    UserCall(OfferPayload),
    CallAccepted(AnswerPayload),
    PeerNegoNeeded(OfferPayload),
    PeerNegoDone(AnswerPayload),
}

impl InboundEvent {
    /// Ordnet einen dekodierten Umschlag dem Vokabular zu
    pub fn from_envelope(envelope: Envelope) -> ProtocolResult<Self> {
        let Envelope { event, data } = envelope;
        let parsed = match event.as_str() {
            names::REGISTER_USER => {
                Self::RegisterUser(payload_parsen(names::REGISTER_USER, data)?)
            }
            names::CHAT_MESSAGE => Self::ChatMessage(payload_parsen(names::CHAT_MESSAGE, data)?),
            names::ROOM_JOIN => Self::RoomJoin {
                payload: payload_parsen(names::ROOM_JOIN, data.clone())?,
                raw: data,
            },
            names::ROOM_LEAVE => Self::RoomLeave(payload_parsen(names::ROOM_LEAVE, data)?),
            names::USER_CALL => Self::UserCall(payload_parsen(names::USER_CALL, data)?),
            names::CALL_ACCEPTED => {
                Self::CallAccepted(payload_parsen(names::CALL_ACCEPTED, data)?)
            }
            names::PEER_NEGO_NEEDED => {
                Self::PeerNegoNeeded(payload_parsen(names::PEER_NEGO_NEEDED, data)?)
            }
            names::PEER_NEGO_DONE => {
                Self::PeerNegoDone(payload_parsen(names::PEER_NEGO_DONE, data)?)
            }
            _ => return Err(ProtocolError::UnbekanntesEvent(event)),
        };
        Ok(parsed)
    }

    /// Dekodiert einen Text-Frame direkt zu einem Event
    pub fn decode(text: &str, max_frame_size: usize) -> ProtocolResult<Self> {
        Self::from_envelope(Envelope::decode_mit_limit(text, max_frame_size)?)
    }

    /// Event-Name (fuer Logging und Metriken)
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterUser(_) => names::REGISTER_USER,
            Self::ChatMessage(_) => names::CHAT_MESSAGE,
            Self::RoomJoin { .. } => names::ROOM_JOIN,
            Self::RoomLeave(_) => names::ROOM_LEAVE,
            Self::UserCall(_) => names::USER_CALL,
            Self::CallAccepted(_) => names::CALL_ACCEPTED,
            Self::PeerNegoNeeded(_) => names::PEER_NEGO_NEEDED,
            Self::PeerNegoDone(_) => names::PEER_NEGO_DONE,
        }
    }
}

// ---------------------------------------------------------------------------
// OutboundEvent
// ---------------------------------------------------------------------------

/// Oeffentliche Sicht auf einen registrierten Benutzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: Identity,
    pub name: String,
    pub avatar: String,
}

/// Ein an Clients gesendetes Event
///
/// Serialisiert direkt in den Umschlag `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    /// An alle ausser dem Registrierenden
    #[serde(rename = "user:connected")]
    UserConnected(UserInfo),

    /// Schnappschuss aller bekannten Profile, nur an den Registrierenden
    #[serde(rename = "list:users")]
    ListUsers(Vec<UserInfo>),

    /// Chat-Payload unveraendert
    #[serde(rename = "chat-message")]
    ChatMessage(Value),

    /// Identitaet der getrennten Verbindung, `null` wenn nie registriert
    #[serde(rename = "user:disconnected")]
    UserDisconnected(Option<Identity>),

    /// An bestehende Raum-Mitglieder
    #[serde(rename = "user:joined")]
    UserJoined { email: Identity, id: ConnectionId },

    /// Echo des urspruenglichen Join-Payloads
    #[serde(rename = "room:join")]
    RoomJoined(Value),

    #[serde(rename = "incomming:call")]
    IncomingCall { from: ConnectionId, offer: Value },

    #[serde(rename = "call:accepted")]
    CallAccepted { from: ConnectionId, ans: Value },

    #[serde(rename = "peer:nego:needed")]
    PeerNegoNeeded { from: ConnectionId, offer: Value },

    #[serde(rename = "peer:nego:final")]
    PeerNegoFinal { from: ConnectionId, ans: Value },
}

impl OutboundEvent {
    /// Event-Name (fuer Logging und Metriken)
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserConnected(_) => names::USER_CONNECTED,
            Self::ListUsers(_) => names::LIST_USERS,
            Self::ChatMessage(_) => names::CHAT_MESSAGE,
            Self::UserDisconnected(_) => names::USER_DISCONNECTED,
            Self::UserJoined { .. } => names::USER_JOINED,
            Self::RoomJoined(_) => names::ROOM_JOIN,
            Self::IncomingCall { .. } => names::INCOMING_CALL,
            Self::CallAccepted { .. } => names::CALL_ACCEPTED,
            Self::PeerNegoNeeded { .. } => names::PEER_NEGO_NEEDED,
            Self::PeerNegoFinal { .. } => names::PEER_NEGO_FINAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
