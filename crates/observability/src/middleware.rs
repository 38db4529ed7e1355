//! Request-Tracing fuer die HTTP-Endpunkte
//!
//! Jede HTTP-Anfrage (inklusive WebSocket-Upgrade) wird mit Methode,
//! Pfad, Statuscode und Dauer als Tracing-Span protokolliert.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;

/// Erstellt den Axum-Layer fuer Request-Tracing.
pub fn request_timing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
