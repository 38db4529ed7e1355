//! rendezvous-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use rendezvous_observability::{observability_server_starten, RendezvousMetrics};
use rendezvous_signaling::{SignalingServer, SignalingState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Metriken-Registry anlegen
    /// 2. Observability-Server starten (falls aktiviert)
    /// 3. WebSocket-Signaling-Server starten
    /// 4. Auf Ctrl-C warten und alle Subsysteme per Watch-Kanal stoppen
    pub async fn starten(self) -> Result<()> {
        let signaling_addr: SocketAddr = self
            .config
            .signaling_bind_adresse()
            .parse()
            .context("Ungueltige Signaling-Bind-Adresse")?;

        tracing::info!(
            signaling = %signaling_addr,
            observability_aktiviert = self.config.observability.aktiviert,
            "Server startet"
        );

        let metriken = RendezvousMetrics::neu().context("Metriken konnten nicht angelegt werden")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let observability_task = if self.config.observability.aktiviert {
            let addr: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Bind-Adresse")?;
            let metriken = metriken.clone();
            let rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = observability_server_starten(addr, metriken, rx).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet mit Fehler");
                }
            }))
        } else {
            None
        };

        let state = SignalingState::neu(self.config.signaling_config(), metriken);
        let server = SignalingServer::neu(Arc::clone(&state), signaling_addr);
        let mut signaling_task = tokio::spawn(server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::select! {
            ergebnis = tokio::signal::ctrl_c() => {
                ergebnis.context("Ctrl-C-Handler konnte nicht installiert werden")?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            }
            ergebnis = &mut signaling_task => {
                // Listener ist vor dem Shutdown beendet, z.B. Port belegt
                let _ = shutdown_tx.send(true);
                ergebnis.context("Signaling-Task abgebrochen")??;
                return Ok(());
            }
        }

        let _ = shutdown_tx.send(true);
        signaling_task
            .await
            .context("Signaling-Task abgebrochen")??;
        if let Some(task) = observability_task {
            let _ = task.await;
        }

        tracing::info!(uptime_sek = state.uptime_sek(), "Server gestoppt");
        Ok(())
    }
}
