use std::sync::Arc;

use chrono::Utc;
use gateman::error::Error;
use gateman::policy::AccessMode;
use gateman::store::{SqliteStore, Store};
use gateman::types::{AssetFile, DeliveryFilter, NewAsset, ProgressFlags, QuotaPolicy, SourceKind};
use tempfile::TempDir;

fn setup_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = SqliteStore::new(dir.path().join("gateman.db")).expect("open store");
    store.initialize().expect("initialize schema");
    (dir, store)
}

fn sample_files() -> Vec<AssetFile> {
    vec![AssetFile {
        id: "a".to_string(),
        name: "file.png".to_string(),
        size: 1,
        url: "https://cdn.example/file.png".to_string(),
        content_type: Some("image/png".to_string()),
    }]
}

fn sample_asset(mode: AccessMode, password_hash: Option<&str>) -> NewAsset {
    NewAsset {
        guild_id: "1".to_string(),
        owner_user_id: "u1".to_string(),
        gate_channel_id: "c1".to_string(),
        source_kind: SourceKind::Upload,
        source_channel_id: Some("c1".to_string()),
        source_message_id: None,
        source_url: None,
        access_mode: mode,
        passcode_enabled: password_hash.is_some(),
        password_hash: password_hash.map(str::to_string),
        quota_policy: QuotaPolicy::DailyLimited,
        statement_text: Some("for personal study only".to_string()),
        files: sample_files(),
    }
}

#[test]
fn test_create_asset_and_bind_gate_message() {
    let (_dir, store) = setup_store();

    let asset = store
        .create_asset(&sample_asset(AccessMode::ReactionOrComment, Some("hash")))
        .expect("create asset");

    assert!(asset.gate_message_id.is_none());
    assert!(asset.id.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(asset.access_mode, AccessMode::ReactionOrComment);
    assert!(asset.passcode_enabled);
    assert_eq!(asset.quota_policy, QuotaPolicy::DailyLimited);
    assert!(asset.statement_enabled);
    assert_eq!(asset.files.len(), 1);

    let updated = store
        .bind_gate_message(&asset.id, "gate123")
        .expect("bind gate message");
    assert_eq!(updated.gate_message_id.as_deref(), Some("gate123"));

    let queried = store
        .get_asset_by_gate_message("gate123")
        .expect("query by gate message")
        .expect("asset present");
    assert_eq!(queried.id, asset.id);
}

#[test]
fn test_create_asset_rejects_passcode_without_secret() {
    let (_dir, store) = setup_store();

    let mut input = sample_asset(AccessMode::Reaction, None);
    input.passcode_enabled = true;

    let err = store.create_asset(&input).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    input.password_hash = Some("   ".to_string());
    let err = store.create_asset(&input).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_bind_gate_message_is_one_time() {
    let (_dir, store) = setup_store();

    let first = store
        .create_asset(&sample_asset(AccessMode::Reaction, None))
        .expect("create first");
    let second = store
        .create_asset(&sample_asset(AccessMode::Reaction, None))
        .expect("create second");

    store
        .bind_gate_message(&first.id, "gate1")
        .expect("bind first");

    // Repeat with the same value is a no-op.
    let rebound = store
        .bind_gate_message(&first.id, "gate1")
        .expect("idempotent rebind");
    assert_eq!(rebound.gate_message_id.as_deref(), Some("gate1"));

    // A different asset cannot claim the same reference.
    let err = store.bind_gate_message(&second.id, "gate1").unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // A bound asset cannot move to another reference.
    let err = store.bind_gate_message(&first.id, "gate2").unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let err = store.bind_gate_message("999", "gate3").unwrap_err();
    assert!(matches!(err, Error::NotFound));
}

#[test]
fn test_progress_merge_keeps_concurrent_flags() {
    let (_dir, store) = setup_store();

    // Two signals landing in either order must both survive.
    store
        .merge_progress(
            "gate1",
            "user1",
            &ProgressFlags {
                reaction_met: true,
                ..Default::default()
            },
        )
        .expect("save reaction");

    let merged = store
        .merge_progress(
            "gate1",
            "user1",
            &ProgressFlags {
                password_met: true,
                ..Default::default()
            },
        )
        .expect("save password");

    assert!(merged.flags.reaction_met);
    assert!(merged.flags.password_met);
    assert!(!merged.flags.comment_met);

    // Flags never reset once true, even if a stale snapshot is written.
    let merged = store
        .merge_progress("gate1", "user1", &ProgressFlags::default())
        .expect("save stale snapshot");
    assert!(merged.flags.reaction_met);
    assert!(merged.flags.password_met);
}

#[test]
fn test_daily_usage_accumulates() {
    let (_dir, store) = setup_store();

    assert_eq!(store.get_daily_usage("user1", "2026-02-09").unwrap(), 0);
    assert_eq!(
        store.increment_daily_usage("user1", "2026-02-09", 1).unwrap(),
        1
    );
    assert_eq!(
        store.increment_daily_usage("user1", "2026-02-09", 2).unwrap(),
        3
    );
    assert_eq!(store.get_daily_usage("user1", "2026-02-09").unwrap(), 3);

    // Other users and other days stay independent.
    assert_eq!(store.get_daily_usage("user2", "2026-02-09").unwrap(), 0);
    assert_eq!(store.get_daily_usage("user1", "2026-02-10").unwrap(), 0);
}

#[test]
fn test_delete_asset_cascades_progress() {
    let (_dir, store) = setup_store();

    let asset = store
        .create_asset(&sample_asset(AccessMode::Reaction, None))
        .expect("create asset");
    store
        .bind_gate_message(&asset.id, "gate1")
        .expect("bind gate message");
    store
        .merge_progress(
            "gate1",
            "user1",
            &ProgressFlags {
                reaction_met: true,
                ..Default::default()
            },
        )
        .expect("save progress");

    assert!(store.delete_asset(&asset.id).expect("delete asset"));
    assert!(store.get_asset_by_id(&asset.id).unwrap().is_none());
    assert!(store.get_progress("gate1", "user1").unwrap().is_none());

    // Unknown ids are a no-op, not an error.
    assert!(!store.delete_asset(&asset.id).expect("repeat delete"));
    assert!(!store.delete_asset("999").expect("delete unknown"));
}

#[test]
fn test_id_allocation_is_dense_and_skips_collisions() {
    let (_dir, store) = setup_store();

    assert_eq!(store.allocate_asset_id().unwrap(), "1");
    assert_eq!(store.allocate_asset_id().unwrap(), "2");

    // Simulate a manually inserted row colliding with the counter.
    store
        .connection()
        .execute(
            "INSERT INTO assets (
                id, guild_id, owner_user_id, gate_channel_id,
                source_kind, unlock_mode, files_json, created_at
             ) VALUES ('3', 'g', 'u', 'c', 'upload', 'reaction', '[]', ?1)",
            [Utc::now().to_rfc3339()],
        )
        .expect("insert colliding row");

    assert_eq!(store.allocate_asset_id().unwrap(), "4");
}

#[test]
fn test_concurrent_id_allocation_yields_distinct_ids() {
    let (_dir, store) = setup_store();
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            (0..4)
                .map(|_| store.allocate_asset_id().expect("allocate"))
                .collect::<Vec<_>>()
        }));
    }

    let mut ids: Vec<String> = handles
        .into_iter()
        .flat_map(|handle| handle.join().expect("join"))
        .collect();

    ids.sort_by_key(|id| id.parse::<i64>().unwrap());
    ids.dedup();
    assert_eq!(ids.len(), 32, "all allocated ids are distinct");
    assert_eq!(ids.first().map(String::as_str), Some("1"));
    assert_eq!(ids.last().map(String::as_str), Some("32"));
}

#[test]
fn test_record_delivery_is_idempotent() {
    let (_dir, store) = setup_store();

    let first_at = Utc::now();
    let record = store
        .record_delivery("gate1", "user1", "2026-02-09", first_at)
        .expect("first delivery");
    assert!(!record.already_delivered);
    assert_eq!(record.used_today, 1);

    let repeat = store
        .record_delivery("gate1", "user1", "2026-02-09", Utc::now())
        .expect("repeat delivery");
    assert!(repeat.already_delivered);
    assert_eq!(repeat.used_today, 1, "counter untouched on redelivery");

    // The original timestamp survives the redelivery.
    let progress = store
        .get_progress("gate1", "user1")
        .unwrap()
        .expect("progress present");
    assert_eq!(
        progress.delivered_at.map(|at| at.timestamp()),
        Some(first_at.timestamp())
    );
}

#[test]
fn test_record_delivery_preserves_existing_flags() {
    let (_dir, store) = setup_store();

    store
        .merge_progress(
            "gate1",
            "user1",
            &ProgressFlags {
                reaction_met: true,
                password_met: true,
                ..Default::default()
            },
        )
        .expect("save progress");

    store
        .record_delivery("gate1", "user1", "2026-02-09", Utc::now())
        .expect("record delivery");

    let progress = store
        .get_progress("gate1", "user1")
        .unwrap()
        .expect("progress present");
    assert!(progress.flags.reaction_met);
    assert!(progress.flags.password_met);
    assert!(progress.delivered_at.is_some());
}

#[test]
fn test_legacy_mode_rows_are_translated_at_read() {
    let (_dir, store) = setup_store();

    let rows = [
        ("10", "comment_password", AccessMode::ReactionOrComment, true),
        ("11", "reaction_comment", AccessMode::ReactionOrComment, false),
        ("12", "password", AccessMode::None, true),
        ("13", "reaction", AccessMode::Reaction, false),
    ];

    for (id, unlock_mode, _, _) in &rows {
        store
            .connection()
            .execute(
                "INSERT INTO assets (
                    id, guild_id, owner_user_id, gate_channel_id,
                    source_kind, unlock_mode, password_hash, files_json, created_at
                 ) VALUES (?1, 'g', 'u', 'c', 'upload', ?2, 'hash', '[]', ?3)",
                rusqlite::params![id, unlock_mode, Utc::now().to_rfc3339()],
            )
            .expect("insert legacy row");
    }

    for (id, unlock_mode, mode, passcode) in rows {
        let asset = store
            .get_asset_by_id(id)
            .unwrap()
            .unwrap_or_else(|| panic!("asset {id} present"));
        assert_eq!(asset.access_mode, mode, "unlock_mode={unlock_mode}");
        assert_eq!(
            asset.passcode_enabled, passcode,
            "unlock_mode={unlock_mode}"
        );
    }
}

#[test]
fn test_list_assets_by_gate_channel_only_bound() {
    let (_dir, store) = setup_store();

    let bound = store
        .create_asset(&sample_asset(AccessMode::Reaction, None))
        .expect("create bound");
    store
        .bind_gate_message(&bound.id, "gate1")
        .expect("bind gate message");

    store
        .create_asset(&sample_asset(AccessMode::Reaction, None))
        .expect("create unbound");

    let listed = store
        .list_assets_by_gate_channel("c1", 25)
        .expect("list assets");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, bound.id);

    assert!(
        store
            .list_assets_by_gate_channel("other", 25)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_list_deliveries_filters() {
    let (_dir, store) = setup_store();

    let asset = store
        .create_asset(&sample_asset(AccessMode::Reaction, None))
        .expect("create asset");
    store
        .bind_gate_message(&asset.id, "gate1")
        .expect("bind gate message");

    store
        .record_delivery("gate1", "user1", "2026-02-09", Utc::now())
        .expect("deliver to user1");
    store
        .record_delivery("gate1", "user2", "2026-02-09", Utc::now())
        .expect("deliver to user2");

    let all = store.list_deliveries(&DeliveryFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].file_names, vec!["file.png".to_string()]);

    let filtered = store
        .list_deliveries(&DeliveryFilter {
            user_id: Some("user1".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].user_id, "user1");

    let none = store
        .list_deliveries(&DeliveryFilter {
            asset_id: Some("999".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(none.is_empty());
}
