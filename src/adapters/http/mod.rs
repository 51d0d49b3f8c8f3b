//! HTTP adapters - REST API and application router.
//!
//! `app_router` assembles every entry point the relay exposes:
//!
//! - `POST /produce` (and `POST /api/log`) - log one event
//! - `GET /health` - liveness and fan-out snapshot
//! - `GET /ws` - push channel upgrade

pub mod relay;

pub use relay::{relay_routes, RelayAppState};

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::websocket_router;

/// Build the full application router with tracing and CORS layers.
///
/// An empty `cors_origins` list allows any origin.
pub fn app_router(state: RelayAppState, cors_origins: &[String]) -> Router {
    let websocket = websocket_router().with_state(state.websocket());

    relay_routes()
        .with_state(state)
        .merge(websocket)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    if origins.is_empty() {
        return layer.allow_origin(tower_http::cors::Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
