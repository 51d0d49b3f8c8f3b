//! Event type enumeration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Kind of user interaction an event records.
///
/// The player emits the named variants. Any other non-empty type is
/// carried through unchanged as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Play,
    Pause,
    Scrub,
    Skip,
    Replay,
    Like,
    Unlike,
    AddToPlaylist,
    RemoveFromPlaylist,
    VolumeChange,
    ViewLyrics,
    ViewArtist,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Play => "play",
            EventType::Pause => "pause",
            EventType::Scrub => "scrub",
            EventType::Skip => "skip",
            EventType::Replay => "replay",
            EventType::Like => "like",
            EventType::Unlike => "unlike",
            EventType::AddToPlaylist => "add_to_playlist",
            EventType::RemoveFromPlaylist => "remove_from_playlist",
            EventType::VolumeChange => "volume_change",
            EventType::ViewLyrics => "view_lyrics",
            EventType::ViewArtist => "view_artist",
            EventType::Other(s) => s,
        }
    }
}

impl FromStr for EventType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "play" => EventType::Play,
            "pause" => EventType::Pause,
            "scrub" => EventType::Scrub,
            "skip" => EventType::Skip,
            "replay" => EventType::Replay,
            "like" => EventType::Like,
            "unlike" => EventType::Unlike,
            "add_to_playlist" => EventType::AddToPlaylist,
            "remove_from_playlist" => EventType::RemoveFromPlaylist,
            "volume_change" => EventType::VolumeChange,
            "view_lyrics" => EventType::ViewLyrics,
            "view_artist" => EventType::ViewArtist,
            other => EventType::Other(other.to_string()),
        })
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::from(s.as_str()))
    }
}
