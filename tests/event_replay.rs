// Replays the recorded demo session the same way autopark-host does

use autopark::config;
use autopark::events::parse_event_log;
use autopark::sim::{HostCall, RecordingEventBus, RecordingNotifier, SimulatedPrinter};
use autopark::{JogTarget, ParkController, ProfileManager};

const SETTINGS: &str = include_str!("../demos/autopark.toml");
const PROFILES: &str = include_str!("../demos/profiles.toml");
const EVENTS: &str = include_str!("../demos/pause_resume.jsonl");

#[test]
fn demo_session() {
    let settings = config::parse_config(SETTINGS).unwrap();
    let profiles = ProfileManager::from_toml(PROFILES).unwrap();
    let records = parse_event_log(EVENTS).unwrap();
    assert_eq!(records.len(), 5);

    let mut controller = ParkController::new(
        settings,
        SimulatedPrinter::new(),
        profiles,
        RecordingNotifier::default(),
        RecordingEventBus::default(),
    );
    let handled: Vec<bool> = records
        .iter()
        .map(|record| controller.handle_event(&record.event, &record.payload))
        .collect();
    assert_eq!(handled, vec![false, true, false, true, true]);

    let jog = |target, relative, speed| HostCall::Jog { target, relative, speed };
    let drain = || HostCall::Command { command: "M400".to_string() };
    assert_eq!(
        controller.printer().history(),
        &[
            // pause
            jog(JogTarget::z(10.0), true, 600.0),
            jog(JogTarget::xy(220.0, 220.0), false, 9000.0),
            drain(),
            // resume
            jog(JogTarget::xy(10.0, 20.0), false, 9000.0),
            jog(JogTarget::z(5.0), false, 600.0),
            drain(),
            // done
            jog(JogTarget::z(10.0), true, 600.0),
            jog(JogTarget::xy(220.0, 220.0), false, 9000.0),
            drain(),
        ]
    );
    assert!(controller.notifier().notifications.is_empty());
    assert!(controller.pause_position().is_set());
}

#[test]
fn demo_session_for_unselected_profile() {
    let settings = config::parse_config(SETTINGS).unwrap();
    let mut profiles = ProfileManager::from_toml(PROFILES).unwrap();
    profiles.select("mk3s").unwrap();

    let mut controller = ParkController::new(
        settings,
        SimulatedPrinter::new(),
        profiles,
        RecordingNotifier::default(),
        RecordingEventBus::default(),
    );
    for record in parse_event_log(EVENTS).unwrap() {
        assert!(!controller.handle_event(&record.event, &record.payload));
    }
    assert!(controller.printer().history().is_empty());
}
