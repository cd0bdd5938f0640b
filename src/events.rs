//! Print lifecycle events as delivered by the host, and the recorded event
//! log format replayed by `autopark-host`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintEvent {
    Paused,
    Resumed,
    Done,
    Failed,
    /// Any other host event. Auto-park ignores these.
    Other(String),
}

impl PrintEvent {
    pub fn from_name(name: &str) -> Self {
        match name {
            "PrintPaused" => Self::Paused,
            "PrintResumed" => Self::Resumed,
            "PrintDone" => Self::Done,
            "PrintFailed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Paused => "PrintPaused",
            Self::Resumed => "PrintResumed",
            Self::Done => "PrintDone",
            Self::Failed => "PrintFailed",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PrintEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PrintEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

impl Serialize for PrintEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Head position reported with an event. The host reports `null` for axes it
/// does not know.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct HeadPosition {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl HeadPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x: Some(x), y: Some(y), z: Some(z) }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct EventPayload {
    #[serde(default)]
    pub position: Option<HeadPosition>,
}

impl EventPayload {
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self { position: Some(HeadPosition::new(x, y, z)) }
    }
}

/// One line of a recorded event log.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventRecord {
    pub event: PrintEvent,
    #[serde(default)]
    pub payload: EventPayload,
}

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parses a JSON-lines event log. Blank lines and lines starting with `#` are skipped.
pub fn parse_event_log(contents: &str) -> Result<Vec<EventRecord>, EventLogError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|source| EventLogError::Parse { line: index + 1, source })
        })
        .collect()
}
