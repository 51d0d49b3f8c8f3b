//! The canonical event record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::context::EventContext;
use crate::domain::foundation::{generate_session_id, Timestamp, ANONYMOUS_USER};

use super::normalize::normalize_event;
use super::EventType;

/// One normalized user-interaction record.
///
/// Known fields are typed. Anything else the origin sent is kept in
/// `extra` under a snake_case key. Serialization always produces the
/// canonical snake_case shape, and deserialization runs the full
/// normalization, so `Event` round-trips through JSON unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    /// Empty when the origin did not name a track.
    pub track_id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Client-assigned ISO-8601 time.
    pub timestamp: Option<String>,
    /// Gateway-assigned ISO-8601 time.
    pub server_timestamp: Option<String>,
    pub position: Option<f64>,
    pub duration: Option<f64>,
    pub volume: Option<f64>,
    pub from_timestamp: Option<f64>,
    pub to_timestamp: Option<f64>,
    pub liked: Option<bool>,
    pub in_playlist: Option<bool>,
    pub context: Option<EventContext>,
    pub extra: Map<String, Value>,
}

impl Event {
    /// Creates an event with only the required fields set.
    pub fn new(event_type: impl Into<EventType>, track_id: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            track_id: track_id.into(),
            user_id: None,
            session_id: None,
            timestamp: None,
            server_timestamp: None,
            position: None,
            duration: None,
            volume: None,
            from_timestamp: None,
            to_timestamp: None,
            liked: None,
            in_playlist: None,
            context: None,
            extra: Map::new(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attaches a derived context object, replacing any previous one.
    pub fn with_context(mut self, context: impl Into<EventContext>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Fills in the metadata the gateway owns.
    ///
    /// `server_timestamp` is always overwritten. `user_id` and
    /// `session_id` are only filled when absent or empty, and
    /// `timestamp` falls back to the server time when the client sent none.
    pub fn stamp(&mut self, now: Timestamp) {
        let now = now.to_iso_string();

        if self.user_id.as_deref().map_or(true, str::is_empty) {
            self.user_id = Some(ANONYMOUS_USER.to_string());
        }
        if self.session_id.as_deref().map_or(true, str::is_empty) {
            self.session_id = Some(generate_session_id());
        }
        if self.timestamp.as_deref().map_or(true, str::is_empty) {
            self.timestamp = Some(now.clone());
        }
        self.server_timestamp = Some(now);
    }

    /// Partition key for the topic.
    pub fn partition_key(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_USER)
    }

    /// Renders the canonical JSON object.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();

        // Extras first so a typed field always wins on a key clash.
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }

        map.insert("event_type".into(), Value::String(self.event_type.to_string()));
        map.insert("track_id".into(), Value::String(self.track_id.clone()));

        let strings = [
            ("user_id", &self.user_id),
            ("session_id", &self.session_id),
            ("timestamp", &self.timestamp),
            ("server_timestamp", &self.server_timestamp),
        ];
        for (key, value) in strings {
            if let Some(v) = value {
                map.insert(key.into(), Value::String(v.clone()));
            }
        }

        let numbers = [
            ("position", self.position),
            ("duration", self.duration),
            ("volume", self.volume),
            ("from_timestamp", self.from_timestamp),
            ("to_timestamp", self.to_timestamp),
        ];
        for (key, value) in numbers {
            if let Some(n) = value.and_then(serde_json::Number::from_f64) {
                map.insert(key.into(), Value::Number(n));
            }
        }

        let flags = [("liked", self.liked), ("in_playlist", self.in_playlist)];
        for (key, value) in flags {
            if let Some(b) = value {
                map.insert(key.into(), Value::Bool(b));
            }
        }

        if let Some(context) = &self.context {
            map.insert(context.wire_key().into(), context.to_value()?);
        }

        Ok(Value::Object(map))
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        normalize_event(value).map_err(serde::de::Error::custom)
    }
}
