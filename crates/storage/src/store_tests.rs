// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gst_manager_core::InstanceId;
use tempfile::tempdir;

fn sample(id: &str, name: &str) -> Instance {
    let now = Utc::now();
    let mut inst = Instance::new(InstanceId::from_string(id), name, "videotestsrc ! fakesink", now);
    inst.status = gst_manager_core::InstanceStatus::Running;
    inst.pid = Some(1234);
    inst
}

#[test]
fn save_then_load_all_round_trips_and_resets_runtime_fields() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let inst = sample("aaaaaaaa", "Camera");
    store.save(&inst).expect("save");

    let loaded = store.load_all().expect("load_all");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, inst.id);
    assert_eq!(loaded[0].status, gst_manager_core::InstanceStatus::Stopped);
    assert_eq!(loaded[0].pid, None);
}

#[test]
fn save_twice_creates_one_history_snapshot() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let mut inst = sample("bbbbbbbb", "Camera");
    store.save(&inst).expect("save 1");

    inst.name = "Camera Renamed".to_string();
    store.save(&inst).expect("save 2");

    let history = store.history(&inst.id).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].name, "Camera");
}

#[test]
fn history_trims_to_retention_bound() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path()).with_max_history_files(2);
    let mut inst = sample("cccccccc", "Camera");
    for i in 0..5 {
        inst.name = format!("Camera {i}");
        store.save(&inst).expect("save");
    }
    let history = store.history(&inst.id).expect("history");
    assert_eq!(history.len(), 2);
}

#[test]
fn load_all_skips_missing_current() {
    let dir = tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("instances/dddddddd")).expect("mkdir");
    let store = Store::new(dir.path());
    let loaded = store.load_all().expect("load_all");
    assert!(loaded.is_empty());
}

#[test]
fn load_all_skips_corrupt_current() {
    let dir = tempdir().expect("tempdir");
    let inst_dir = dir.path().join("instances/eeeeeeee");
    std::fs::create_dir_all(&inst_dir).expect("mkdir");
    std::fs::write(inst_dir.join("current"), b"not json").expect("write");
    let store = Store::new(dir.path());
    let loaded = store.load_all().expect("load_all");
    assert!(loaded.is_empty());
}

#[test]
fn delete_removes_current_and_history() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let inst = sample("ffffffff", "Camera");
    store.save(&inst).expect("save");
    store.delete(&inst.id).expect("delete");
    assert!(store.load_all().expect("load_all").is_empty());
}

#[test]
fn export_strips_runtime_fields_and_import_round_trips() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let inst = sample("11111111", "Camera");
    store.save(&inst).expect("save");

    let exported = store.export(&inst.id).expect("export").expect("some");
    store.delete(&inst.id).expect("delete");

    let new_id = store.import(&exported).expect("import");
    assert_eq!(new_id, inst.id);
    let loaded = store.load_all().expect("load_all");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "Camera");
}

#[test]
fn import_colliding_id_gets_fresh_id_and_copy_suffix() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let inst = sample("22222222", "Camera");
    store.save(&inst).expect("save");

    let exported = store.export(&inst.id).expect("export").expect("some");
    let new_id = store.import(&exported).expect("import");

    assert_ne!(new_id, inst.id);
    let loaded = store.load_all().expect("load_all");
    assert_eq!(loaded.len(), 2);
    assert!(loaded.iter().any(|i| i.name == "Camera"));
    assert!(loaded.iter().any(|i| i.name == "Camera (copy)"));
}

#[test]
fn export_missing_instance_returns_none() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let result = store.export(&InstanceId::from_string("33333333")).expect("export");
    assert!(result.is_none());
}

#[test]
fn auto_config_blob_round_trips() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    assert!(store.load_auto_config().expect("load").is_none());

    let blob = serde_json::json!({"bitrate_kbps": 4000});
    store.save_auto_config(&blob).expect("save");
    assert_eq!(store.load_auto_config().expect("load"), Some(blob));

    store.delete_auto_config().expect("delete");
    assert!(store.load_auto_config().expect("load").is_none());
}

#[test]
fn daemon_config_defaults_when_absent() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    assert_eq!(store.load_daemon_config().expect("load"), crate::DaemonSettings::default());
}

#[test]
fn daemon_config_round_trips() {
    let dir = tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    let settings = crate::DaemonSettings { bus_name: Some("org.example.Test1".into()), ..Default::default() };
    store.save_daemon_config(&settings).expect("save");
    assert_eq!(store.load_daemon_config().expect("load"), settings);
}
