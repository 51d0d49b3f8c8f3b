//! Events - the canonical record flowing through the relay.

mod event;
mod event_type;
mod normalize;

pub use event::Event;
pub use event_type::EventType;
pub use normalize::{normalize_event, normalize_keys, to_snake_case, NormalizeError};
