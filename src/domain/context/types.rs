//! Context objects attached to outgoing player events.

use serde::{Deserialize, Serialize};

/// What caused playback to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaySource {
    #[default]
    Manual,
    Autoplay,
    Skip,
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipDirection {
    Next,
    Prev,
}

/// Why a track was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[default]
    UserInitiated,
    TrackEnded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_track_id: Option<String>,
    /// Seconds since the previous play in this session.
    pub time_since_last_play: f64,
    pub is_autoplay: bool,
    pub source: PlaySource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrubContext {
    pub scrub_direction: ScrubDirection,
    /// Seconds between the scrub origin and target.
    pub scrub_distance: f64,
    pub was_playing_before_scrub: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipContext {
    pub skip_direction: SkipDirection,
    pub time_listened_before_skip: f64,
    #[serde(default)]
    pub skip_reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeContext {
    /// Volume (0..=1) in effect before this change.
    pub previous_volume: f64,
    /// Signed; negative when the volume went down.
    pub volume_change_amount: f64,
    pub is_mute_action: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementContext {
    /// Seconds from the start of like tracking to the like.
    pub time_to_like: f64,
}

/// The one context object an event may carry.
///
/// Each variant travels under its own key on the wire, see [`EventContext::wire_key`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventContext {
    Play(PlayContext),
    Scrub(ScrubContext),
    Skip(SkipContext),
    Volume(VolumeContext),
    Engagement(EngagementContext),
}

impl EventContext {
    /// Wire keys in precedence order.
    pub const WIRE_KEYS: [&'static str; 5] = [
        "play_context",
        "scrub_context",
        "skip_context",
        "volume_context",
        "engagement_context",
    ];

    /// Key under which this context is serialized inside an event.
    pub fn wire_key(&self) -> &'static str {
        match self {
            EventContext::Play(_) => "play_context",
            EventContext::Scrub(_) => "scrub_context",
            EventContext::Skip(_) => "skip_context",
            EventContext::Volume(_) => "volume_context",
            EventContext::Engagement(_) => "engagement_context",
        }
    }

    /// Serializes the inner context object.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            EventContext::Play(c) => serde_json::to_value(c),
            EventContext::Scrub(c) => serde_json::to_value(c),
            EventContext::Skip(c) => serde_json::to_value(c),
            EventContext::Volume(c) => serde_json::to_value(c),
            EventContext::Engagement(c) => serde_json::to_value(c),
        }
    }

    /// Parses the context stored under `key`.
    ///
    /// Returns `None` for an unknown key or a value that does not match
    /// the variant's shape.
    pub fn from_wire(key: &str, value: &serde_json::Value) -> Option<Self> {
        let value = value.clone();
        match key {
            "play_context" => serde_json::from_value(value).ok().map(EventContext::Play),
            "scrub_context" => serde_json::from_value(value).ok().map(EventContext::Scrub),
            "skip_context" => serde_json::from_value(value).ok().map(EventContext::Skip),
            "volume_context" => serde_json::from_value(value).ok().map(EventContext::Volume),
            "engagement_context" => serde_json::from_value(value)
                .ok()
                .map(EventContext::Engagement),
            _ => None,
        }
    }
}

impl From<PlayContext> for EventContext {
    fn from(c: PlayContext) -> Self {
        EventContext::Play(c)
    }
}

impl From<ScrubContext> for EventContext {
    fn from(c: ScrubContext) -> Self {
        EventContext::Scrub(c)
    }
}

impl From<SkipContext> for EventContext {
    fn from(c: SkipContext) -> Self {
        EventContext::Skip(c)
    }
}

impl From<VolumeContext> for EventContext {
    fn from(c: VolumeContext) -> Self {
        EventContext::Volume(c)
    }
}

impl From<EngagementContext> for EventContext {
    fn from(c: EngagementContext) -> Self {
        EventContext::Engagement(c)
    }
}
