//! Prometheus-kompatible Metriken fuer Rendezvous
//!
//! Registrierte Metriken:
//! - `rendezvous_connections` – Gauge: Offene WebSocket-Verbindungen
//! - `rendezvous_identities_online` – Gauge: Registrierte Identitaeten
//! - `rendezvous_events_received_total` – Counter: Eingehende Events (event)
//! - `rendezvous_events_relayed_total` – Counter: Zugestellte Events (event)
//! - `rendezvous_relays_dropped_total` – Counter: Verworfene Relays (event)
//! - `rendezvous_frames_rejected_total` – Counter: Nicht dekodierbare Frames

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Rendezvous-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Metrik-Handles.
#[derive(Clone)]
pub struct RendezvousMetrics {
    pub registry: Arc<Registry>,

    pub connections: IntGauge,
    pub identities_online: IntGauge,
    pub events_received_total: IntCounterVec,
    pub events_relayed_total: IntCounterVec,
    pub relays_dropped_total: IntCounterVec,
    pub frames_rejected_total: IntCounter,
}

impl RendezvousMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connections = IntGauge::with_opts(Opts::new(
            "rendezvous_connections",
            "Anzahl offener WebSocket-Verbindungen",
        ))?;
        registry.register(Box::new(connections.clone()))?;

        let identities_online = IntGauge::with_opts(Opts::new(
            "rendezvous_identities_online",
            "Anzahl registrierter Identitaeten",
        ))?;
        registry.register(Box::new(identities_online.clone()))?;

        let events_received_total = IntCounterVec::new(
            Opts::new(
                "rendezvous_events_received_total",
                "Gesamtanzahl eingehender Events",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_received_total.clone()))?;

        let events_relayed_total = IntCounterVec::new(
            Opts::new(
                "rendezvous_events_relayed_total",
                "Gesamtanzahl eingereihter ausgehender Events",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_relayed_total.clone()))?;

        let relays_dropped_total = IntCounterVec::new(
            Opts::new(
                "rendezvous_relays_dropped_total",
                "Relays an unbekannte Empfaenger oder volle Queues",
            ),
            &["event"],
        )?;
        registry.register(Box::new(relays_dropped_total.clone()))?;

        let frames_rejected_total = IntCounter::with_opts(Opts::new(
            "rendezvous_frames_rejected_total",
            "Nicht dekodierbare oder unbekannte Frames",
        ))?;
        registry.register(Box::new(frames_rejected_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connections,
            identities_online,
            events_received_total,
            events_relayed_total,
            relays_dropped_total,
            frames_rejected_total,
        })
    }

    /// Zaehlt ein eingehendes Event
    pub fn event_empfangen(&self, event: &str) {
        self.events_received_total.with_label_values(&[event]).inc();
    }

    /// Zaehlt `anzahl` eingereihte Sendungen eines Events
    pub fn event_zugestellt(&self, event: &str, anzahl: usize) {
        if anzahl > 0 {
            self.events_relayed_total
                .with_label_values(&[event])
                .inc_by(anzahl as u64);
        }
    }

    /// Zaehlt ein verworfenes Relay
    pub fn relay_verworfen(&self, event: &str) {
        self.relays_dropped_total.with_label_values(&[event]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RendezvousMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<RendezvousMetrics>,
) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
