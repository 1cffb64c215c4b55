//! Integration tests for the keychain: lifecycle, persistence and items.

use std::fs;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cloudkeychain::errors::KeychainError;
use cloudkeychain::keychain::{
    AutoLockWatchdog, Keychain, KeychainSettings, LockEvent, NewItem, State,
};
use tempfile::TempDir;

/// Low iteration count keeps the tests fast.
fn settings() -> KeychainSettings {
    KeychainSettings {
        iterations: 100,
        ..KeychainSettings::default()
    }
}

fn login(title: &str) -> NewItem {
    NewItem {
        title: title.to_string(),
        username: "alice".to_string(),
        password: "correct horse".to_string(),
        url: Some("https://example.com".to_string()),
        notes: Some("remember me".to_string()),
        tags: Vec::new(),
    }
}

fn titles(keychain: &Keychain) -> Vec<String> {
    keychain
        .list_items()
        .iter()
        .map(|item| item.title().unwrap_or_default().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Lock / unlock
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_create_lock_unlock() {
    let mut keychain = Keychain::create(b"hunter2", &settings()).unwrap();
    let uuid = keychain
        .create_item(&NewItem {
            title: "Example".to_string(),
            ..NewItem::default()
        })
        .unwrap();

    keychain.lock(false);
    assert_eq!(keychain.state(), State::Locked);

    assert!(keychain.unlock(b"hunter2").unwrap());
    let item = keychain.get_item(&uuid).unwrap();
    assert_eq!(item.title(), Some("Example"));
}

#[test]
fn wrong_password_leaves_no_caches() {
    let mut keychain = Keychain::create(b"hunter2", &settings()).unwrap();
    let uuid = keychain.create_item(&login("Example")).unwrap();
    keychain.item_details(&uuid).unwrap();
    keychain.lock(false);

    assert!(!keychain.unlock(b"wrong").unwrap());
    assert_eq!(keychain.state(), State::Locked);

    let item = keychain.get_item(&uuid).unwrap();
    assert!(!item.has_decrypted_fields());
    assert!(!item.details_cached());
    assert!(item.title().is_none());
}

#[test]
fn wrong_password_is_rejected_while_unlocked() {
    let mut keychain = Keychain::create(b"hunter2", &settings()).unwrap();
    let uuid = keychain
        .create_item(&NewItem {
            title: "Example".to_string(),
            ..NewItem::default()
        })
        .unwrap();
    keychain.lock(false);

    assert!(keychain.unlock(b"hunter2").unwrap());
    assert!(!keychain.unlock(b"wrong").unwrap());

    // A failed check does not lock an unlocked keychain.
    assert_eq!(keychain.state(), State::Unlocked);
    assert_eq!(keychain.get_item(&uuid).unwrap().title(), Some("Example"));
    assert!(keychain.unlock(b"hunter2").unwrap());
}

#[test]
fn lock_twice_is_a_no_op() {
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    keychain.on_lock_event(move |event| sink.lock().unwrap().push(event));

    keychain.lock(false);
    keychain.lock(false);

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            LockEvent::BeforeLock { automatic: false },
            LockEvent::AfterLock { automatic: false },
        ]
    );
}

#[test]
fn locked_keychain_refuses_item_writes_and_details() {
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    let uuid = keychain.create_item(&login("Bank")).unwrap();
    keychain.lock(false);

    assert!(matches!(
        keychain.create_item(&login("Other")),
        Err(KeychainError::Locked)
    ));
    assert!(matches!(
        keychain.item_details(&uuid),
        Err(KeychainError::Locked)
    ));
}

#[test]
fn details_decrypt_lazily_with_the_item_key() {
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    let uuid = keychain.create_item(&login("Mail")).unwrap();
    keychain.lock(false);
    assert!(keychain.unlock(b"pw").unwrap());

    assert!(!keychain.get_item(&uuid).unwrap().details_cached());
    let details = keychain.item_details(&uuid).unwrap();
    assert_eq!(details["fields"][0]["value"], "alice");
    assert_eq!(details["fields"][1]["value"], "correct horse");
    assert_eq!(details["notesPlain"], "remember me");
    assert!(keychain.get_item(&uuid).unwrap().details_cached());
}

// ---------------------------------------------------------------------------
// Auto-lock
// ---------------------------------------------------------------------------

#[test]
fn auto_lock_fires_after_window() {
    let mut keychain = Keychain::create(
        b"pw",
        &KeychainSettings {
            auto_lock: Duration::from_secs(60),
            ..settings()
        },
    )
    .unwrap();

    let now = Instant::now();
    assert!(keychain.check_auto_lock_at(now));
    assert!(keychain.check_auto_lock_at(now + Duration::from_secs(30)));
    assert!(!keychain.check_auto_lock_at(now + Duration::from_secs(120)));
    assert_eq!(keychain.state(), State::Locked);
    assert!(keychain.auto_lock_deadline().is_none());
}

#[test]
fn auto_lock_reports_automatic_events() {
    let mut keychain = Keychain::create(
        b"pw",
        &KeychainSettings {
            auto_lock: Duration::from_millis(1),
            ..settings()
        },
    )
    .unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    keychain.on_lock_event(move |event| sink.lock().unwrap().push(event));

    assert!(!keychain.check_auto_lock_at(Instant::now() + Duration::from_secs(1)));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            LockEvent::BeforeLock { automatic: true },
            LockEvent::AfterLock { automatic: true },
        ]
    );
}

#[test]
fn oversized_auto_lock_window_never_locks() {
    let mut keychain = Keychain::create(
        b"pw",
        &KeychainSettings {
            auto_lock: Duration::from_secs(i64::MAX as u64),
            ..settings()
        },
    )
    .unwrap();
    assert_eq!(keychain.state(), State::Unlocked);
    assert!(keychain.auto_lock_deadline().is_none());

    keychain.lock(false);
    assert!(keychain.unlock(b"pw").unwrap());
    assert!(keychain.check_auto_lock_at(Instant::now() + Duration::from_secs(86_400 * 365)));
    assert_eq!(keychain.state(), State::Unlocked);
}

#[test]
fn watchdog_cancel_does_not_wait_for_held_guard() {
    let keychain = Arc::new(Mutex::new(Keychain::create(b"pw", &settings()).unwrap()));
    let watchdog =
        AutoLockWatchdog::spawn_with_interval(Arc::clone(&keychain), Duration::from_millis(10));

    let guard = keychain.lock().unwrap();
    thread::sleep(Duration::from_millis(100));

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        watchdog.cancel();
        let _ = done_tx.send(());
    });
    let cancelled = done_rx.recv_timeout(Duration::from_secs(3)).is_ok();
    drop(guard);

    assert!(cancelled, "cancel blocked while the keychain mutex was held");
    assert_eq!(keychain.lock().unwrap().state(), State::Unlocked);
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

#[test]
fn change_password_keeps_items_readable() {
    let tmp = TempDir::new().unwrap();
    let mut keychain = Keychain::create(b"old-password", &settings()).unwrap();
    let uuid = keychain.create_item(&login("Example")).unwrap();

    keychain
        .change_password(b"old-password", b"new-password")
        .unwrap();
    keychain.save(tmp.path()).unwrap();

    let mut reloaded = Keychain::load(tmp.path()).unwrap();
    assert!(!reloaded.unlock(b"old-password").unwrap());
    assert!(reloaded.unlock(b"new-password").unwrap());
    assert_eq!(reloaded.item_details(&uuid).unwrap()["fields"][0]["value"], "alice");
}

#[test]
fn change_password_with_wrong_old_password_fails() {
    let mut keychain = Keychain::create(b"right", &settings()).unwrap();
    let before = keychain.export_profile().unwrap();

    assert!(matches!(
        keychain.change_password(b"wrong", b"whatever"),
        Err(KeychainError::WrongPassword)
    ));
    assert_eq!(keychain.export_profile().unwrap(), before);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn save_and_load_round_trip() {
    let tmp = TempDir::new().unwrap();
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    keychain.create_item(&login("Zebra")).unwrap();
    keychain.create_item(&login("apple")).unwrap();
    keychain.save(tmp.path()).unwrap();

    let profile_dir = tmp.path().join("default");
    assert!(profile_dir.join("profile.js").is_file());
    let profile_text = fs::read_to_string(profile_dir.join("profile.js")).unwrap();
    assert!(profile_text.starts_with("var profile="));
    assert!(profile_text.trim_end().ends_with(';'));

    let mut reloaded = Keychain::load(tmp.path()).unwrap();
    assert_eq!(reloaded.state(), State::Locked);
    assert_eq!(reloaded.uuid(), keychain.uuid());
    assert_eq!(reloaded.item_count(), 2);

    assert!(reloaded.unlock(b"pw").unwrap());
    assert_eq!(titles(&reloaded), vec!["apple", "Zebra"]);
}

#[test]
fn from_artifacts_matches_exported_text() {
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    let uuid = keychain.create_item(&login("Example")).unwrap();

    let profile = keychain.export_profile().unwrap();
    let bands: Vec<String> = keychain.export_bands().unwrap().into_values().collect();
    assert_eq!(bands.len(), 1);
    assert!(bands[0].starts_with("ld("));

    let mut copy = Keychain::from_artifacts(&profile, &bands).unwrap();
    assert!(copy.unlock(b"pw").unwrap());
    assert_eq!(copy.get_item(&uuid).unwrap().title(), Some("Example"));
}

#[test]
fn load_missing_profile_is_not_found() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        Keychain::load(tmp.path()),
        Err(KeychainError::NotFound(_))
    ));
}

#[test]
fn garbage_profile_is_a_format_error() {
    assert!(matches!(
        Keychain::from_artifacts::<&str>("var profile={not json};", &[]),
        Err(KeychainError::Format(_))
    ));
    assert!(matches!(
        Keychain::from_artifacts::<&str>("{}", &[]),
        Err(KeychainError::Format(_))
    ));
}

#[test]
fn removing_last_item_in_band_deletes_the_band_file() {
    let tmp = TempDir::new().unwrap();
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    let uuid = keychain.create_item(&login("Gone")).unwrap();
    keychain.save(tmp.path()).unwrap();

    let band = tmp
        .path()
        .join("default")
        .join(format!("band_{}.js", &uuid[..1]));
    assert!(band.is_file());

    keychain.remove_item(&uuid).unwrap();
    keychain.save(tmp.path()).unwrap();
    assert!(!band.exists());
}

#[test]
fn attachments_are_listed_but_not_read() {
    let tmp = TempDir::new().unwrap();
    let keychain = Keychain::create(b"pw", &settings()).unwrap();
    keychain.save(tmp.path()).unwrap();

    let name = format!("{}_{}.attachment", "A".repeat(32), "B".repeat(32));
    fs::write(tmp.path().join("default").join(&name), b"\x00\x01binary").unwrap();

    let reloaded = Keychain::load(tmp.path()).unwrap();
    assert_eq!(reloaded.attachments(), &[name]);
}

// ---------------------------------------------------------------------------
// Trash
// ---------------------------------------------------------------------------

#[test]
fn trashed_items_are_listed_separately() {
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    let keep = keychain.create_item(&login("Keep")).unwrap();
    let bin = keychain.create_item(&login("Bin")).unwrap();

    keychain.set_trashed(&bin, true).unwrap();
    assert_eq!(titles(&keychain), vec!["Keep"]);
    let trashed: Vec<&str> = keychain
        .trashed_items()
        .into_iter()
        .map(|item| item.uuid())
        .collect();
    assert_eq!(trashed, vec![bin.as_str()]);

    keychain.set_trashed(&bin, false).unwrap();
    assert_eq!(titles(&keychain), vec!["Bin", "Keep"]);
    assert!(keychain.get_item(&keep).is_ok());
}

#[test]
fn unknown_item_is_reported() {
    let mut keychain = Keychain::create(b"pw", &settings()).unwrap();
    assert!(matches!(
        keychain.set_trashed("0123456789ABCDEF0123456789ABCDEF", true),
        Err(KeychainError::ItemNotFound(_))
    ));
}
