//! HTTP adapter for the ingestion and health endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, ProduceResponse};
pub use handlers::{health, produce_event, RelayAppState};
pub use routes::relay_routes;
