// tests/snapshot_io.rs
//
// Snapshot file write/load and seed fallback.

use chrono::{TimeZone, Utc};
use robotics_daily::snapshot::{
    assemble, load_from, load_with_fallback, write_to, FallbackPolicy, Origin,
};
use robotics_daily::{Item, ItemType, Query, Snapshot, TimeWindow};

fn sample() -> Snapshot {
    let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    assemble(
        vec![Item {
            id: "https://x.test/a".into(),
            title: "Robot arm".into(),
            url: "https://x.test/a".into(),
            published_at: Some(t),
            summary: "Arm demo.".into(),
            source: "Test".into(),
            item_type: ItemType::Video,
            tags: vec!["Robotics".into()],
        }],
        t,
    )
}

#[test]
fn written_snapshot_loads_back_as_live() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/items.json");

    let snap = sample();
    write_to(&snap, &path).expect("write");
    assert!(!dir.path().join("nested/items.json.tmp").exists());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(raw["generatedAt"], "2024-06-01T08:00:00.000Z");
    assert_eq!(raw["count"], 1);
    assert_eq!(raw["items"][0]["type"], "video");

    assert_eq!(load_from(&path).expect("load"), snap);

    let loaded = load_with_fallback(&path, &FallbackPolicy::default());
    assert_eq!(loaded.origin, Origin::Live);
    assert_eq!(loaded.window_override, None);
}

#[test]
fn missing_file_serves_seed_with_widened_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = load_with_fallback(&dir.path().join("absent.json"), &FallbackPolicy::default());

    assert_eq!(loaded.origin, Origin::Seed);
    assert!(loaded.snapshot.count > 0);
    let q = loaded.effective_query(Query::default().with_window(TimeWindow::Days7));
    assert_eq!(q.window, TimeWindow::Years5);
}

#[test]
fn empty_or_garbled_file_falls_back_and_policy_can_keep_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let empty = dir.path().join("empty.json");
    write_to(&Snapshot::empty(Utc::now()), &empty).expect("write");
    let garbled = dir.path().join("garbled.json");
    std::fs::write(&garbled, "{ not json").expect("write");

    for p in [&empty, &garbled] {
        let loaded = load_with_fallback(p, &FallbackPolicy::keep_window());
        assert!(loaded.is_fallback());
        let q = loaded.effective_query(Query::default().with_window(TimeWindow::Days7));
        assert_eq!(q.window, TimeWindow::Days7);
    }
}
