//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod ingestion;

pub use ingestion::{
    IngestError, IngestEventCommand, IngestEventHandler, IngestEventResult, Transport,
};
