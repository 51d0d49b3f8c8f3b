//! Field-name normalization and canonical event construction.
//!
//! Producers disagree on casing (`eventType` from the HTTP clients,
//! `event_type` from the player socket). Both the gateway and the topic
//! consumer run every payload through [`normalize_event`] so the rest of
//! the pipeline only ever sees snake_case keys.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::context::EventContext;
use crate::domain::foundation::ValidationError;

use super::{Event, EventType};

/// Errors produced while turning a raw payload into an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Event payload must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Converts a camelCase (or PascalCase) key to snake_case.
///
/// Keys that are already snake_case come back unchanged. Runs of capitals
/// are treated as one word (`userID` → `user_id`).
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                Some(_) => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Rewrites every key of `map` to snake_case.
///
/// When an alias and its canonical key are both present, the canonical
/// key's value is kept.
pub fn normalize_keys(map: Map<String, Value>) -> Map<String, Value> {
    let mut canonical = Map::with_capacity(map.len());
    let mut aliased = Vec::new();

    for (key, value) in map {
        let snake = to_snake_case(&key);
        if snake == key {
            canonical.insert(key, value);
        } else {
            aliased.push((snake, value));
        }
    }

    for (snake, value) in aliased {
        canonical.entry(snake).or_insert(value);
    }

    canonical
}

/// Builds the canonical [`Event`] from any JSON payload.
///
/// Only `event_type` is required. A known field must carry its documented
/// JSON type; string fields also accept numbers, which are stringified.
/// Unknown fields are kept in `extra`. Normalizing the serialized form of
/// an `Event` yields the same `Event`.
pub fn normalize_event(value: Value) -> Result<Event, NormalizeError> {
    let Value::Object(raw) = value else {
        return Err(NormalizeError::NotAnObject);
    };

    let mut fields = normalize_keys(raw);

    let event_type = match fields.remove("event_type") {
        None | Some(Value::Null) => return Err(ValidationError::missing_field("event_type").into()),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(ValidationError::empty_field("event_type").into())
        }
        Some(Value::String(s)) => EventType::from(s.trim()),
        Some(_) => {
            return Err(ValidationError::invalid_format("event_type", "expected a string").into())
        }
    };

    let track_id = take_string(&mut fields, "track_id")?.unwrap_or_default();
    let mut event = Event::new(event_type, track_id);

    event.user_id = take_string(&mut fields, "user_id")?;
    event.session_id = take_string(&mut fields, "session_id")?;
    event.timestamp = take_string(&mut fields, "timestamp")?;
    event.server_timestamp = take_string(&mut fields, "server_timestamp")?;

    event.position = take_number(&mut fields, "position")?;
    event.duration = take_number(&mut fields, "duration")?;
    event.volume = take_number(&mut fields, "volume")?;
    event.from_timestamp = take_number(&mut fields, "from_timestamp")?;
    event.to_timestamp = take_number(&mut fields, "to_timestamp")?;

    event.liked = take_bool(&mut fields, "liked")?;
    event.in_playlist = take_bool(&mut fields, "in_playlist")?;

    event.context = take_context(&mut fields);

    for (key, value) in fields {
        event.extra.insert(key, value);
    }

    Ok(event)
}

fn take_string(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ValidationError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ValidationError::invalid_format(key, "expected a string")),
    }
}

fn take_number(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, ValidationError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(ValidationError::invalid_format(key, "expected a number")),
    }
}

fn take_bool(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<bool>, ValidationError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(ValidationError::invalid_format(key, "expected a boolean")),
    }
}

/// Pulls the first parseable context object out of `fields`.
///
/// Context keys that lose or fail to parse stay in `fields` and end up in
/// `extra`.
fn take_context(fields: &mut Map<String, Value>) -> Option<EventContext> {
    for key in EventContext::WIRE_KEYS {
        let Some(value) = fields.get_mut(key) else {
            continue;
        };

        if let Value::Object(inner) = value {
            *inner = normalize_keys(std::mem::take(inner));
        }

        if let Some(context) = EventContext::from_wire(key, value) {
            fields.remove(key);
            return Some(context);
        }

        tracing::debug!(context = key, "Unparseable context object, keeping as extra");
    }
    None
}
