// src/main.rs - replays a recorded printer event log through the park controller
use std::path::PathBuf;

use clap::Parser;

use autopark::config::{self, AutoParkConfig};
use autopark::events;
use autopark::sim::{RecordingEventBus, RecordingNotifier, SimulatedPrinter};
use autopark::{ParkController, ProfileManager};

#[derive(Debug, Parser)]
#[command(name = "autopark-host", version, about = "Replay print lifecycle events through auto-park")]
struct Args {
    /// Auto-park settings (TOML). Defaults are used when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Printer profile library (TOML). The stock profile is used when omitted.
    #[arg(long)]
    profiles: Option<PathBuf>,
    /// Id of the profile to make current.
    #[arg(long)]
    profile: Option<String>,
    /// Event log, one JSON object per line.
    #[arg(long)]
    events: PathBuf,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let settings = match &args.settings {
        Some(path) => {
            tracing::info!("Loading settings from: {}", path.display());
            config::load_config(path)?
        }
        None => AutoParkConfig::default(),
    };

    let mut profiles = match &args.profiles {
        Some(path) => ProfileManager::load(path)?,
        None => ProfileManager::with_default_profile(),
    };
    if let Some(id) = &args.profile {
        profiles.select(id)?;
    }

    let contents = std::fs::read_to_string(&args.events).map_err(|e| {
        tracing::error!("Failed to read event log '{}': {}", args.events.display(), e);
        e
    })?;
    let records = events::parse_event_log(&contents)?;
    tracing::info!("Replaying {} events", records.len());

    let mut controller = ParkController::new(
        settings,
        SimulatedPrinter::new(),
        profiles,
        RecordingNotifier::default(),
        RecordingEventBus::default(),
    );

    let settings = controller.config();
    tracing::info!(
        "Auto-park: location = {}, speed = {}, lift = {} mm, triggers pause/done/fail = {}/{}/{}",
        settings.park_location,
        settings.speed_summary(),
        settings.park_lift_z,
        settings.park_after_pause,
        settings.park_after_done,
        settings.park_after_fail
    );

    let mut handled = 0;
    for record in &records {
        if controller.handle_event(&record.event, &record.payload) {
            handled += 1;
        }
    }

    for call in controller.printer().history() {
        println!("{}", serde_json::to_string(call)?);
    }

    tracing::info!(
        "Done: {} of {} events triggered auto-park, {} notifications, {} bus events, \
         final head position {:?}",
        handled,
        records.len(),
        controller.notifier().notifications.len(),
        controller.event_bus().fired.len(),
        controller.printer().position()
    );
    Ok(())
}
