//! Handler fuer alle eingehenden Events
//!
//! Jeder Handler ist fuer einen bestimmten Event-Typ zustaendig
//! und hat Zugriff auf den gemeinsamen SignalingState. Handler sind
//! synchron, gesendet wird nur ueber nicht-blockierende Queues.

pub mod call_handler;
pub mod chat_handler;
pub mod presence_handler;
pub mod room_handler;
