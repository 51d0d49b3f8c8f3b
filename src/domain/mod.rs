//! Domain layer - listening events, their context and normalization.

pub mod context;
pub mod events;
pub mod foundation;
