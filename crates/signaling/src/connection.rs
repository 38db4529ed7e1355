//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede WebSocket-Verbindung bekommt eine `ClientConnection` in einem
//! eigenen tokio-Task. Der Task liest Frames, dispatcht sie und schreibt
//! die Events aus der Send-Queue auf den Socket.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen WebSocket-Ping
//! - Jeder eingehende Frame (auch Pong) zaehlt als Lebenszeichen
//! - Nach `verbindungs_timeout_sek` ohne Frame wird die Verbindung getrennt

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use rendezvous_core::ConnectionId;
use rendezvous_protocol::wire::encode_event;
use rendezvous_protocol::InboundEvent;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::dispatcher::MessageDispatcher;
use crate::server_state::SignalingState;

// ---------------------------------------------------------------------------
// DisconnectReason
// ---------------------------------------------------------------------------

/// Grund fuer das Ende einer Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Client hat einen Close-Frame gesendet
    ClientClosed,
    /// Stream ist ohne Close-Frame zu Ende gegangen
    TransportClose,
    /// Lese- oder Schreibfehler auf dem Socket
    TransportError,
    /// Kein Frame innerhalb des Timeouts
    PingTimeout,
    /// Server faehrt herunter
    ServerShutdown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ClientClosed => "client namespace disconnect",
            Self::TransportClose => "transport close",
            Self::TransportError => "transport error",
            Self::PingTimeout => "ping timeout",
            Self::ServerShutdown => "server shutting down",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    connection_id: ConnectionId,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection mit frischer ConnectionId
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self {
            state,
            connection_id: ConnectionId::new(),
            peer_addr,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht. Danach wird die Verbindung immer abgemeldet.
    pub async fn verarbeiten(self, socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        let connection_id = self.connection_id;
        let config = Arc::clone(&self.state.config);
        let keepalive_intervall = Duration::from_secs(config.keepalive_sek.max(1));
        let timeout_dauer = Duration::from_secs(config.verbindungs_timeout_sek);

        let mut sende_rx = self.state.broadcaster.connection_registrieren(connection_id);
        self.state
            .gauges_aktualisieren(&self.state.presence.lock());
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        tracing::info!(peer = %peer_addr, connection_id = %connection_id, "Neue Verbindung");

        let (mut ws_tx, mut ws_rx) = socket.split();

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();
        let mut keepalive = tokio::time::interval_at(
            tokio::time::Instant::now() + keepalive_intervall,
            keepalive_intervall,
        );

        let grund = loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            letzter_empfang = Instant::now();
                            match nachricht {
                                Message::Text(text) => {
                                    match InboundEvent::decode(&text, config.max_frame_groesse) {
                                        Ok(event) => dispatcher.dispatch(event, connection_id),
                                        Err(e) => {
                                            self.state.metriken.frames_rejected_total.inc();
                                            tracing::warn!(
                                                connection_id = %connection_id,
                                                fehler = %e,
                                                "Frame verworfen"
                                            );
                                        }
                                    }
                                }
                                Message::Binary(_) => {
                                    self.state.metriken.frames_rejected_total.inc();
                                    tracing::warn!(
                                        connection_id = %connection_id,
                                        "Binaer-Frame verworfen"
                                    );
                                }
                                Message::Close(_) => break DisconnectReason::ClientClosed,
                                // Pong beantwortet der Socket selbst
                                Message::Ping(_) | Message::Pong(_) => {}
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                connection_id = %connection_id,
                                fehler = %e,
                                "WebSocket-Lesefehler"
                            );
                            break DisconnectReason::TransportError;
                        }
                        None => break DisconnectReason::TransportClose,
                    }
                }

                // Ausgehendes Event aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    let text = match encode_event(&ausgehend) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(
                                connection_id = %connection_id,
                                event = ausgehend.name(),
                                fehler = %e,
                                "Event konnte nicht kodiert werden"
                            );
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        tracing::warn!(
                            connection_id = %connection_id,
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break DisconnectReason::TransportError;
                    }
                }

                // Keepalive-Ping und Timeout-Pruefung
                _ = keepalive.tick() => {
                    if letzter_empfang.elapsed() > timeout_dauer {
                        tracing::warn!(connection_id = %connection_id, "Verbindungs-Timeout");
                        break DisconnectReason::PingTimeout;
                    }
                    if let Err(e) = ws_tx.send(Message::Ping(Vec::new())).await {
                        tracing::warn!(
                            connection_id = %connection_id,
                            fehler = %e,
                            "Ping-Senden fehlgeschlagen"
                        );
                        break DisconnectReason::TransportError;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(
                            connection_id = %connection_id,
                            "Shutdown-Signal – Verbindung wird getrennt"
                        );
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break DisconnectReason::ServerShutdown;
                    }
                }
            }
        };

        // Cleanup beim Verbindungsende
        dispatcher.client_cleanup(connection_id, grund);

        tracing::info!(
            peer = %peer_addr,
            connection_id = %connection_id,
            grund = %grund,
            "Verbindungs-Task beendet"
        );
    }
}
