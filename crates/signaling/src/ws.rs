//! WebSocket-Listener – Bindet Socket, akzeptiert Upgrades
//!
//! Der `SignalingServer` stellt einen axum-Router bereit:
//! - `GET /`   – Lebenszeichen als Text
//! - `GET /ws` – WebSocket-Upgrade, pro Verbindung ein `ClientConnection`-Task
//!
//! Ist `max_verbindungen` erreicht, wird das Upgrade mit 503 abgelehnt.
//! Der Slot wird vor dem Upgrade reserviert und gilt fuer die gesamte
//! Lebensdauer der Verbindung.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use rendezvous_observability::request_timing_layer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::connection::ClientConnection;
use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Text fuer `GET /`
pub const LIVENESS_TEXT: &str = "rendezvous signaling hub";

/// Vielfaches von `max_frame_groesse`, ab dem der Socket selbst abbricht
pub const TRANSPORT_LIMIT_FAKTOR: usize = 4;

#[derive(Clone)]
struct WsKontext {
    state: Arc<SignalingState>,
    shutdown_rx: watch::Receiver<bool>,
}

/// WebSocket-Signaling-Server
pub struct SignalingServer {
    state: Arc<SignalingState>,
    bind_addr: SocketAddr,
}

impl SignalingServer {
    /// Erstellt einen neuen SignalingServer
    pub fn neu(state: Arc<SignalingState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Baut den HTTP-Router mit CORS und Request-Tracing
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        let kontext = WsKontext {
            state: Arc::clone(&self.state),
            shutdown_rx,
        };
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(liveness_handler))
            .route("/ws", get(ws_upgrade_handler))
            .with_state(kontext)
            .layer(cors)
            .layer(request_timing_layer())
    }

    /// Bindet den Listener und laeuft bis `shutdown_rx` `true` meldet
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> SignalingResult<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.mit_listener(listener, shutdown_rx).await
    }

    /// Wie [`starten`](Self::starten), aber mit bereits gebundenem Listener
    pub async fn mit_listener(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let lokale_addr = listener.local_addr()?;
        let app = self.router(shutdown_rx.clone());

        tracing::info!(adresse = %lokale_addr, "WebSocket Signaling-Server gestartet");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while shutdown_rx.changed().await.is_ok() {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
        })
        .await?;

        tracing::info!("WebSocket Signaling-Server gestoppt");
        Ok(())
    }
}

async fn liveness_handler() -> &'static str {
    LIVENESS_TEXT
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(kontext): State<WsKontext>,
) -> Response {
    let WsKontext { state, shutdown_rx } = kontext;

    // Slot vor dem Upgrade belegen, Freigabe mit Ende des Verbindungs-Tasks
    let Some(slot) = state.slot_reservieren() else {
        tracing::warn!(
            peer = %peer_addr,
            max = state.config.max_verbindungen,
            "Server voll – Verbindung abgelehnt"
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            SignalingError::ServerVoll.to_string(),
        )
            .into_response();
    };

    tracing::debug!(peer = %peer_addr, "WebSocket-Upgrade akzeptiert");
    let transport_limit = transport_limit(state.config.max_frame_groesse);
    ws.max_message_size(transport_limit)
        .max_frame_size(transport_limit)
        .on_upgrade(move |socket| async move {
            ClientConnection::neu(state, peer_addr)
                .verarbeiten(socket, shutdown_rx)
                .await;
            drop(slot);
        })
}

/// Harte Obergrenze fuer Frames auf Transport-Ebene
///
/// Liegt ueber `max_frame_groesse`, damit zu grosse Frames beim Dekodieren
/// verworfen werden und die Verbindung bestehen bleibt. Erst oberhalb
/// dieser Grenze trennt der Socket selbst.
pub fn transport_limit(max_frame_groesse: usize) -> usize {
    max_frame_groesse.saturating_mul(TRANSPORT_LIMIT_FAKTOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_protocol::wire::DEFAULT_MAX_FRAME_SIZE;

    #[test]
    fn transport_limit_liegt_ueber_frame_limit() {
        assert_eq!(transport_limit(256), 256 * TRANSPORT_LIMIT_FAKTOR);
        assert!(transport_limit(DEFAULT_MAX_FRAME_SIZE) > DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(transport_limit(usize::MAX), usize::MAX);
    }
}
