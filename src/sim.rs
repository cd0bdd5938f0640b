//! Simulated host collaborators.
//!
//! `SimulatedPrinter` tracks the head position the way firmware would and keeps
//! a history of every call it received. The notifier and event bus just record.

use serde::Serialize;

use crate::host::{Axis, EventBus, HostError, JogTarget, NotificationSink, PrinterControl, Severity};

/// A call made to the simulated printer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    Jog { target: JogTarget, relative: bool, speed: f64 },
    Command { command: String },
    Home { axes: Vec<Axis> },
    CancelPrint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimPrintState {
    Printing,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SimulatedPrinter {
    position: [f64; 3], // X, Y, Z
    print_state: SimPrintState,
    connected: bool,
    history: Vec<HostCall>,
}

impl Default for SimulatedPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPrinter {
    pub fn new() -> Self {
        Self::at([0.0, 0.0, 0.0])
    }

    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position,
            print_state: SimPrintState::Printing,
            connected: true,
            history: Vec::new(),
        }
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn print_state(&self) -> SimPrintState {
        self.print_state
    }

    /// While disconnected every call fails with [`HostError::NotConnected`] and is not recorded.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn history(&self) -> &[HostCall] {
        &self.history
    }

    pub fn jogs(&self) -> Vec<&HostCall> {
        self.history
            .iter()
            .filter(|call| matches!(call, HostCall::Jog { .. }))
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn ensure_connected(&self) -> Result<(), HostError> {
        if self.connected { Ok(()) } else { Err(HostError::NotConnected) }
    }
}

impl PrinterControl for SimulatedPrinter {
    fn jog(&mut self, target: JogTarget, relative: bool, speed: f64) -> Result<(), HostError> {
        self.ensure_connected()?;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(HostError::Rejected(format!("invalid jog speed {}", speed)));
        }
        for (index, axis) in [Axis::X, Axis::Y, Axis::Z].into_iter().enumerate() {
            if let Some(value) = target.get(axis) {
                if relative {
                    self.position[index] += value;
                } else {
                    self.position[index] = value;
                }
            }
        }
        tracing::debug!(
            "sim: jog {:?} relative={} speed={} -> {:?}",
            target,
            relative,
            speed,
            self.position
        );
        self.history.push(HostCall::Jog { target, relative, speed });
        Ok(())
    }

    fn commands(&mut self, command: &str) -> Result<(), HostError> {
        self.ensure_connected()?;
        tracing::debug!("sim: command {}", command);
        self.history.push(HostCall::Command { command: command.to_string() });
        Ok(())
    }

    fn home(&mut self, axes: &[Axis]) -> Result<(), HostError> {
        self.ensure_connected()?;
        for axis in axes {
            let index = match axis {
                Axis::X => 0,
                Axis::Y => 1,
                Axis::Z => 2,
            };
            self.position[index] = 0.0;
        }
        self.history.push(HostCall::Home { axes: axes.to_vec() });
        Ok(())
    }

    fn cancel_print(&mut self) -> Result<(), HostError> {
        self.ensure_connected()?;
        tracing::info!("sim: print cancelled");
        self.print_state = SimPrintState::Cancelled;
        self.history.push(HostCall::CancelPrint);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notifications: Vec<Notification>,
}

impl NotificationSink for RecordingNotifier {
    fn notify(&mut self, severity: Severity, title: &str, message: &str) {
        tracing::warn!("notify [{:?}] {}: {}", severity, title, message);
        self.notifications.push(Notification {
            severity,
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

#[derive(Debug, Default)]
pub struct RecordingEventBus {
    pub fired: Vec<(String, serde_json::Value)>,
}

impl EventBus for RecordingEventBus {
    fn fire(&mut self, name: &str, data: serde_json::Value) {
        self.fired.push((name.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jogs_track_position() {
        let mut printer = SimulatedPrinter::at([10.0, 20.0, 5.0]);
        printer.jog(JogTarget::z(5.0), true, 600.0).unwrap();
        assert_eq!(printer.position(), [10.0, 20.0, 10.0]);
        printer.jog(JogTarget::xy(100.0, 100.0), false, 3000.0).unwrap();
        assert_eq!(printer.position(), [100.0, 100.0, 10.0]);
        printer.home(&[Axis::X, Axis::Y]).unwrap();
        assert_eq!(printer.position(), [0.0, 0.0, 10.0]);
        assert_eq!(printer.jogs().len(), 2);
        assert_eq!(printer.history().len(), 3);
    }

    #[test]
    fn disconnected_printer_rejects_calls() {
        let mut printer = SimulatedPrinter::new();
        printer.set_connected(false);
        assert!(matches!(printer.commands("M400"), Err(HostError::NotConnected)));
        assert!(printer.history().is_empty());
    }

    #[test]
    fn history_serializes_tagged() {
        let call = HostCall::Jog { target: JogTarget::z(5.0), relative: true, speed: 600.0 };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "call": "jog", "target": { "z": 5.0 }, "relative": true, "speed": 600.0 })
        );
    }
}
