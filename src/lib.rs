//! Neo Analytics - Listening-event relay
//!
//! This crate ingests listening events from a music player, relays them
//! through a broker topic, and pushes them live to dashboard clients. It
//! also provides the per-session context engine that derives behavioral
//! metadata (play gaps, scrub distance, skip latency, volume deltas, like
//! latency) before an event is emitted.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
