// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = HeadConfig::load_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, HeadConfig::default());
    assert!(!config.is_clustered());
    assert_eq!(config.abort_grace_period, Duration::from_secs(10));
    assert_eq!(config.delayed_poll_interval, Duration::from_millis(500));
    assert_eq!(config.feedback_channel, "feedbacks");
}

#[test]
fn fields_override_defaults() {
    let file = write_config(
        r#"
redis_url = "redis://127.0.0.1:6379"
broadcast_channel = "broadcast"
abort_grace_period = "1m 30s"
delayed_poll_interval = "250ms"
launch_sequence = "scheduled"
log_path = "/var/log/cm/head.log"
"#,
    );

    let config = HeadConfig::load_from(file.path()).unwrap();

    assert!(config.is_clustered());
    assert_eq!(config.broadcast_channel, "broadcast");
    assert_eq!(config.feedback_channel, "feedbacks");
    assert_eq!(config.abort_grace_period, Duration::from_secs(90));
    assert_eq!(config.delayed_poll_interval, Duration::from_millis(250));
    assert_eq!(config.launch_sequence, LaunchSequence::Scheduled);
    assert_eq!(config.log_path, PathBuf::from("/var/log/cm/head.log"));
}

#[test]
fn invalid_file_names_its_path() {
    let file = write_config("abort_grace_period = \"soon\"\n");

    let err = HeadConfig::load_from(file.path()).unwrap_err();

    assert!(matches!(err, LifecycleError::Config { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn unknown_fields_are_rejected() {
    let file = write_config("redis = \"redis://localhost\"\n");
    assert!(HeadConfig::load_from(file.path()).is_err());
}
