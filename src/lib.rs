// autopark: parks the print head on pause/done/failure and restores it on resume

pub mod config;
pub mod events;
pub mod host;
pub mod park;
pub mod profile;
pub mod sim;

// Re-export main types for easier use in integration tests and the host binary
pub use config::{AutoParkConfig, ConfigError, ConfigManager, ParkLocation, ParkSpeed, ProfileMode};
pub use events::{EventPayload, EventRecord, HeadPosition, PrintEvent};
pub use host::{Axis, EventBus, HostError, JogTarget, NotificationSink, PrinterControl, Severity};
pub use park::{ParkController, ParkError, PausePosition};
pub use profile::{PrinterProfile, ProfileManager, ProfileProvider};
