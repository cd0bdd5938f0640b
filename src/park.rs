//! # Park controller
//!
//! Moves the print head clear of the part when a print pauses, finishes or
//! fails, and puts it back where it was when a paused print resumes.
//!
//! The controller is driven by [`ParkController::handle_event`], one call per
//! host lifecycle event, on the host's event thread. Every public entry point
//! reports success as a `bool`; failures are logged and surfaced to the user
//! through the notification sink or the event bus, never propagated.

use thiserror::Error;

use crate::config::{AutoParkConfig, ParkLocation, ParkSpeed, ProfileMode};
use crate::events::{EventPayload, PrintEvent};
use crate::host::{
    Axis, DRAIN_MOTION_QUEUE, EventBus, HostError, JogTarget, NotificationSink, PrinterControl,
    Severity,
};
use crate::profile::{PrinterProfile, ProfileProvider};

#[derive(Debug, Error)]
pub enum ParkError {
    #[error("pause position is invalid, missing {}", format_axes(.missing))]
    InvalidPausePosition { missing: Vec<Axis> },
    #[error("no printer profile is selected")]
    NoProfile,
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

fn format_axes(axes: &[Axis]) -> String {
    axes.iter().map(Axis::to_string).collect::<Vec<_>>().join(", ")
}

/// Head position captured when the print paused.
///
/// Only usable when all three axes are set; see [`PausePosition::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PausePosition {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl PausePosition {
    pub fn missing_axes(&self) -> Vec<Axis> {
        [(Axis::X, self.x), (Axis::Y, self.y), (Axis::Z, self.z)]
            .into_iter()
            .filter_map(|(axis, value)| value.is_none().then_some(axis))
            .collect()
    }

    pub fn validate(&self) -> Result<(f64, f64, f64), ParkError> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Ok((x, y, z)),
            _ => Err(ParkError::InvalidPausePosition { missing: self.missing_axes() }),
        }
    }

    pub fn is_set(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Resolves the XY park target for the configured location.
///
/// An unrecognized location is logged and parks at the origin.
pub fn compute_park_position(config: &AutoParkConfig, profile: &PrinterProfile) -> (f64, f64) {
    let width = profile.volume.width;
    let depth = profile.volume.depth;
    match &config.park_location {
        ParkLocation::Custom => (config.park_pos_x, config.park_pos_y),
        ParkLocation::Center => (width / 2.0, depth / 2.0),
        ParkLocation::MinMin => (0.0, 0.0),
        ParkLocation::MinMax => (0.0, depth),
        ParkLocation::MaxMin => (width, 0.0),
        ParkLocation::MaxMax => (width, depth),
        ParkLocation::Unrecognized(raw) => {
            tracing::error!("Invalid park location = {}", raw);
            (0.0, 0.0)
        }
    }
}

/// Resolves `(xy_speed, z_speed)` in mm/min.
pub fn compute_park_speeds(config: &AutoParkConfig, profile: &PrinterProfile) -> (f64, f64) {
    match config.park_speed {
        ParkSpeed::Auto => (
            profile.axes.x.speed.min(profile.axes.y.speed),
            profile.axes.z.speed,
        ),
        ParkSpeed::Custom => (
            config.park_speed_xy * config.park_speed_xy_unit,
            config.park_speed_z * config.park_speed_z_unit,
        ),
    }
}

/// Whether auto-park applies to the given printer profile. Fails closed in
/// select mode when there is no profile or it has no id.
pub fn is_enabled_for_profile(config: &AutoParkConfig, profile: Option<&PrinterProfile>) -> bool {
    match config.profile_mode {
        ProfileMode::All => true,
        ProfileMode::Select => profile
            .and_then(PrinterProfile::id)
            .is_some_and(|id| config.selected_profiles.iter().any(|selected| selected == id)),
    }
}

fn needs_profile(config: &AutoParkConfig) -> bool {
    config.park_location != ParkLocation::Custom || config.park_speed == ParkSpeed::Auto
}

pub struct ParkController<P, R, N, B> {
    config: AutoParkConfig,
    printer: P,
    profiles: R,
    notifier: N,
    event_bus: B,
    pause_position: PausePosition,
}

impl<P, R, N, B> ParkController<P, R, N, B>
where
    P: PrinterControl,
    R: ProfileProvider,
    N: NotificationSink,
    B: EventBus,
{
    pub fn new(config: AutoParkConfig, printer: P, profiles: R, notifier: N, event_bus: B) -> Self {
        Self {
            config,
            printer,
            profiles,
            notifier,
            event_bus,
            pause_position: PausePosition::default(),
        }
    }

    pub fn config(&self) -> &AutoParkConfig {
        &self.config
    }

    /// Replaces the live settings. A stored pause position is kept.
    pub fn update_config(&mut self, config: AutoParkConfig) {
        tracing::info!(
            "Auto-park settings updated (location = {}, speed = {})",
            config.park_location,
            config.speed_summary()
        );
        self.config = config;
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    pub fn printer_mut(&mut self) -> &mut P {
        &mut self.printer
    }

    pub fn profiles_mut(&mut self) -> &mut R {
        &mut self.profiles
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn event_bus(&self) -> &B {
        &self.event_bus
    }

    pub fn pause_position(&self) -> PausePosition {
        self.pause_position
    }

    pub fn record_pause_position(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.pause_position = PausePosition { x, y, z };
    }

    pub fn clear_pause_position(&mut self) {
        self.pause_position = PausePosition::default();
    }

    /// Reacts to one host lifecycle event. Returns true if a park or unpark was run.
    pub fn handle_event(&mut self, event: &PrintEvent, payload: &EventPayload) -> bool {
        if matches!(event, PrintEvent::Other(_)) {
            return false;
        }

        let profile = self.profiles.current_profile();
        if !is_enabled_for_profile(&self.config, profile.as_ref()) {
            tracing::debug!("Auto-park disabled for current printer profile, ignoring {}", event);
            return false;
        }
        if !self.config.any_trigger_enabled() {
            tracing::debug!("All park triggers disabled, ignoring {}", event);
            return false;
        }

        match event {
            PrintEvent::Done if self.config.park_after_done => {
                self.park(event, payload);
                true
            }
            PrintEvent::Failed if self.config.park_after_fail => {
                self.park(event, payload);
                true
            }
            PrintEvent::Paused if self.config.park_after_pause => {
                self.park(event, payload);
                true
            }
            PrintEvent::Resumed if self.config.park_after_pause => {
                self.unpark(event, payload);
                true
            }
            _ => false,
        }
    }

    /// Captures the head position from `payload`, lifts Z and moves to the park target.
    pub fn park(&mut self, event: &PrintEvent, payload: &EventPayload) -> bool {
        let reported = payload.position.unwrap_or_default();
        self.record_pause_position(reported.x, reported.y, reported.z);

        match self.try_park(event) {
            Ok(()) => true,
            Err(ParkError::InvalidPausePosition { missing }) => {
                let mut text = vec![
                    "Unable to park because some of the pause position is invalid!".to_string(),
                ];
                for axis in &missing {
                    tracing::error!("Unable to park: pause position {} is not set", axis);
                    text.push(format!("{} is not set!", axis));
                }
                self.notifier.notify(Severity::Error, "Unable to Park!", &text.join("\n"));
                false
            }
            Err(e) => {
                tracing::error!("Unable to park print head on {}: {}", event, e);
                self.notifier.notify(Severity::Error, "Unable to Park!", &e.to_string());
                false
            }
        }
    }

    fn try_park(&mut self, event: &PrintEvent) -> Result<(), ParkError> {
        self.pause_position.validate()?;
        let profile = self.resolve_profile()?;
        tracing::info!("Parking print head on {}", event);

        let (park_x, park_y) = compute_park_position(&self.config, &profile);
        let (speed_xy, speed_z) = compute_park_speeds(&self.config, &profile);

        self.printer.jog(JogTarget::z(self.config.park_lift_z), true, speed_z)?;
        self.printer.jog(JogTarget::xy(park_x, park_y), false, speed_xy)?;
        self.printer.commands(DRAIN_MOTION_QUEUE)?;
        Ok(())
    }

    /// Returns the head to the stored pause position. Cancels the print if
    /// there is no valid stored position or the speeds cannot be resolved.
    pub fn unpark(&mut self, event: &PrintEvent, _payload: &EventPayload) -> bool {
        match self.try_unpark(event) {
            Ok(()) => {
                self.clear_pause_position();
                true
            }
            Err(e @ ParkError::Host(_)) => {
                tracing::error!("Unable to unpark print head on {}: {}", event, e);
                self.notifier.notify(Severity::Error, "Unable to Unpark!", &e.to_string());
                false
            }
            Err(e) => {
                let message = match &e {
                    ParkError::InvalidPausePosition { .. } => {
                        let PausePosition { x, y, z } = self.pause_position;
                        tracing::error!(
                            "Unable to unpark because some of the pause position is invalid! \
                             [{:?}, {:?}, {:?}]",
                            x,
                            y,
                            z
                        );
                        "\nUnable to unpark the print head, the stored position is invalid!"
                            .to_string()
                    }
                    _ => {
                        tracing::error!("Unable to unpark print head on {}: {}", event, e);
                        format!("\nUnable to unpark the print head: {}", e)
                    }
                };
                self.abort_print(message);
                false
            }
        }
    }

    // Fires the bus error and cancels the print.
    fn abort_print(&mut self, message: String) {
        self.event_bus.fire("Error", serde_json::json!({ "error": message }));
        if let Err(cancel_err) = self.printer.cancel_print() {
            tracing::error!("Failed to cancel print after unpark failure: {}", cancel_err);
        }
    }

    fn try_unpark(&mut self, event: &PrintEvent) -> Result<(), ParkError> {
        let (x, y, z) = self.pause_position.validate()?;
        let profile = self.resolve_profile()?;
        tracing::info!("Unparking print head on {}", event);

        let (speed_xy, speed_z) = compute_park_speeds(&self.config, &profile);

        if self.config.home_before_unpark {
            self.printer.home(&[Axis::X, Axis::Y])?;
        }
        self.printer.jog(JogTarget::xy(x, y), false, speed_xy)?;
        self.printer.jog(JogTarget::z(z), false, speed_z)?;
        self.printer.commands(DRAIN_MOTION_QUEUE)?;
        Ok(())
    }

    // Custom location with custom speeds works without a profile.
    fn resolve_profile(&self) -> Result<PrinterProfile, ParkError> {
        match self.profiles.current_profile() {
            Some(profile) => Ok(profile),
            None if !needs_profile(&self.config) => Ok(PrinterProfile::default()),
            None => Err(ParkError::NoProfile),
        }
    }
}
