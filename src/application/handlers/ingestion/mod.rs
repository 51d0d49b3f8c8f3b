//! Ingestion handlers.

mod ingest_event;

pub use ingest_event::{
    IngestError, IngestEventCommand, IngestEventHandler, IngestEventResult, Transport,
};
