//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the listening-event domain.

mod clock;
mod errors;
mod ids;
mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{generate_session_id, ChannelId, ANONYMOUS_USER};
pub use timestamp::Timestamp;
