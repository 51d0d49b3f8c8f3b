//! Context enrichment - behavioral metadata derived at emission time.

mod session;
mod types;

pub use session::{SessionContext, DEFAULT_VOLUME};
pub use types::{
    EngagementContext, EventContext, PlayContext, PlaySource, ScrubContext, ScrubDirection,
    SkipContext, SkipDirection, SkipReason, VolumeContext,
};
