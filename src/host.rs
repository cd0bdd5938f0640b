// Trait-based interfaces to the host application. The host owns the printer
// connection, the user notifications and the event bus; auto-park only calls into them.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// G-code that blocks until every queued move has finished.
pub const DRAIN_MOTION_QUEUE: &str = "M400";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Printer is not connected")]
    NotConnected,
    #[error("Printer rejected command: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Per-axis jog amounts. Unset axes are not moved.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct JogTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl JogTarget {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), z: None }
    }

    pub fn z(z: f64) -> Self {
        Self { z: Some(z), ..Self::default() }
    }

    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Motion primitives of the connected printer. Speeds are in mm/min.
pub trait PrinterControl {
    /// Moves the given axes, by `target` if `relative`, else to `target`.
    fn jog(&mut self, target: JogTarget, relative: bool, speed: f64) -> Result<(), HostError>;
    /// Sends a raw G-code line.
    fn commands(&mut self, command: &str) -> Result<(), HostError>;
    fn home(&mut self, axes: &[Axis]) -> Result<(), HostError>;
    fn cancel_print(&mut self) -> Result<(), HostError>;
}

/// User-facing alerts.
pub trait NotificationSink {
    fn notify(&mut self, severity: Severity, title: &str, message: &str);
}

/// The host's generic event bus.
pub trait EventBus {
    fn fire(&mut self, name: &str, data: serde_json::Value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jog_target_builders() {
        let lift = JogTarget::z(5.0);
        assert_eq!(lift.get(Axis::Z), Some(5.0));
        assert_eq!(lift.get(Axis::X), None);
        let planar = JogTarget::xy(1.0, 2.0);
        assert_eq!((planar.x, planar.y, planar.z), (Some(1.0), Some(2.0), None));
    }

    #[test]
    fn jog_target_serializes_set_axes_only() {
        let json = serde_json::to_value(JogTarget::z(5.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "z": 5.0 }));
    }
}
