// Settings and profile files on disk

use std::fs;

use autopark::config::{self, ConfigError};
use autopark::{AutoParkConfig, ConfigManager, ParkLocation, ParkSpeed, ProfileManager, ProfileProvider};
use tempfile::tempdir;

#[test]
fn save_then_reload_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autopark.toml");

    let settings = AutoParkConfig {
        park_location: ParkLocation::MaxMin,
        park_speed: ParkSpeed::Custom,
        park_lift_z: 12.0,
        selected_profiles: vec!["ender3".to_string()],
        ..AutoParkConfig::default()
    };
    let manager = ConfigManager::new(settings.clone(), &path);
    manager.save().unwrap();

    let loaded = ConfigManager::load(&path).unwrap();
    assert_eq!(loaded.get_config(), &settings);
    assert_eq!(loaded.path(), path.as_path());
    assert!(fs::read_to_string(&path).unwrap().contains("park_location = \"max_min\""));
}

#[test]
fn reload_picks_up_edits_and_keeps_settings_on_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autopark.toml");
    fs::write(&path, "park_after_pause = true\n").unwrap();

    let mut manager = ConfigManager::load(&path).unwrap();
    assert!(manager.get_config().park_after_pause);

    fs::write(&path, "parkAfterPause = false\nparkLiftZ = 2.5\n").unwrap();
    let reloaded = manager.reload().unwrap();
    assert!(!reloaded.park_after_pause);
    assert_eq!(reloaded.park_lift_z, 2.5);

    fs::write(&path, "park_lift_z = -3.0\n").unwrap();
    let err = manager.reload().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert_eq!(manager.get_config().park_lift_z, 2.5);
}

#[test]
fn missing_settings_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = config::load_config(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn load_profile_library() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profiles.toml");
    fs::write(
        &path,
        r#"
current = "mini"

[[profile]]
id = "mini"
name = "Mini"
volume = { width = 180.0, depth = 180.0, height = 180.0 }
axes = { x = { speed = 9000.0 }, y = { speed = 9000.0 }, z = { speed = 1000.0 } }
"#,
    )
    .unwrap();

    let profiles = ProfileManager::load(&path).unwrap();
    let current = profiles.current_profile().unwrap();
    assert_eq!(current.name.as_deref(), Some("Mini"));
    assert_eq!(current.volume.width, 180.0);
    assert_eq!(current.axes.z.speed, 1000.0);
}
