//! The keychain: lifecycle, lock state and the item collection.
//!
//! ```text
//!   create ──────────────────────────────┐
//!                                        ▼
//!   load / from_artifacts ──▶ Locked ◀──▶ Unlocked
//!                                 unlock    lock / auto-lock
//! ```
//!
//! Key material only ever lives in [`KeyState::Unlocked`].  Locking drops
//! it (zeroizing on drop) and wipes every decrypted item cache; the
//! encrypted item records stay in memory so a later unlock can decrypt
//! them again without reloading.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::band;
use super::files;
use super::item::{new_uuid, Item, ItemRecord, NewItem};
use super::profile::Profile;
use super::session::{Session, DEFAULT_AUTO_LOCK};
use crate::crypto::hierarchy::{self, UnlockedKeys};
use crate::crypto::kdf::{derive_key_pair, generate_salt, DEFAULT_ITERATIONS};
use crate::errors::{KeychainError, Result};

/// Name of the profile folder used when none is given.
pub const DEFAULT_PROFILE: &str = "default";

/// Options for [`Keychain::create`].
#[derive(Debug, Clone)]
pub struct KeychainSettings {
    pub iterations: u32,
    pub profile_name: String,
    pub password_hint: String,
    pub last_updated_by: String,
    pub auto_lock: Duration,
}

impl Default for KeychainSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            profile_name: DEFAULT_PROFILE.to_string(),
            password_hint: String::new(),
            last_updated_by: "cloudkeychain".to_string(),
            auto_lock: DEFAULT_AUTO_LOCK,
        }
    }
}

/// Public view of the lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Locked,
    Unlocked,
}

/// Lifecycle notifications delivered to [`Keychain::on_lock_event`]
/// listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    Unlocked,
    BeforeLock { automatic: bool },
    AfterLock { automatic: bool },
}

type Listener = Box<dyn FnMut(LockEvent) + Send>;

enum KeyState {
    Locked,
    Unlocked(UnlockedKeys),
}

/// A cloud keychain profile and its items.
pub struct Keychain {
    profile: Profile,
    items: BTreeMap<String, Item>,
    attachments: Vec<String>,
    keys: KeyState,
    session: Session,
    listeners: Vec<Listener>,
}

impl Keychain {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new keychain protected by `password`.
    ///
    /// The new keychain starts out unlocked: the master and overview keys
    /// were just generated, so there is nothing to unwrap.
    pub fn create(password: &[u8], settings: &KeychainSettings) -> Result<Self> {
        let salt = generate_salt();
        let super_keys = derive_key_pair(password, &salt, settings.iterations)?;
        let (wrapped, keys) = hierarchy::create(&super_keys)?;
        drop(super_keys);

        let now = Utc::now().timestamp();
        let profile = Profile {
            uuid: new_uuid(),
            salt: salt.to_vec(),
            created_at: now,
            updated_at: now,
            iterations: settings.iterations,
            profile_name: settings.profile_name.clone(),
            password_hint: settings.password_hint.clone(),
            last_updated_by: settings.last_updated_by.clone(),
            master_key: wrapped.master_key,
            overview_key: wrapped.overview_key,
        };

        let mut session = Session::new(settings.auto_lock);
        session.arm(Instant::now());

        info!(uuid = %profile.uuid, iterations = profile.iterations, "keychain created");

        Ok(Self {
            profile,
            items: BTreeMap::new(),
            attachments: Vec::new(),
            keys: KeyState::Unlocked(keys),
            session,
            listeners: Vec::new(),
        })
    }

    /// Load the default profile of the keychain folder at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_profile(path, DEFAULT_PROFILE)
    }

    /// Load `<path>/<profile_name>/`.  The result is locked.
    pub fn load_profile(path: &Path, profile_name: &str) -> Result<Self> {
        let artifacts = files::read_profile_dir(path, profile_name)?;
        let mut keychain = Self::from_artifacts(&artifacts.profile, &artifacts.bands)?;
        keychain.attachments = artifacts.attachments;

        info!(
            path = %path.display(),
            items = keychain.items.len(),
            attachments = keychain.attachments.len(),
            "keychain loaded"
        );
        Ok(keychain)
    }

    /// Build a locked keychain from already-read profile and band text.
    pub fn from_artifacts<S: AsRef<str>>(profile_text: &str, band_texts: &[S]) -> Result<Self> {
        let profile = Profile::parse(profile_text)?;

        let mut items = BTreeMap::new();
        for text in band_texts {
            for record in band::parse(text.as_ref())? {
                items.insert(record.uuid.clone(), Item::from_record(record));
            }
        }

        Ok(Self {
            profile,
            items,
            attachments: Vec::new(),
            keys: KeyState::Locked,
            session: Session::default(),
            listeners: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Lock state
    // ------------------------------------------------------------------

    /// Unlock with `password`.
    ///
    /// Returns `Ok(false)` when the password is wrong; the lock state is
    /// left as it was.  Any other failure (a corrupted profile, an item
    /// overview that does not decrypt under verified keys) is an error.
    ///
    /// The password is checked even when the keychain is already
    /// unlocked; only the overview decryption is skipped then.
    pub fn unlock(&mut self, password: &[u8]) -> Result<bool> {
        let super_keys = derive_key_pair(password, &self.profile.salt, self.profile.iterations)?;
        let raw = match hierarchy::unwrap(&super_keys, &self.profile.wrapped_keys()) {
            Ok(raw) => raw,
            Err(KeychainError::Integrity) => {
                warn!(uuid = %self.profile.uuid, "unlock failed: wrong password");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        drop(super_keys);

        if self.is_unlocked() {
            debug!("keychain already unlocked");
            self.reschedule();
            return Ok(true);
        }

        let keys = raw.unlocked_keys();
        drop(raw);

        let decoded = self
            .items
            .values_mut()
            .try_for_each(|item| item.unlock_overview(&keys.overview));
        if let Err(e) = decoded {
            self.items.values_mut().for_each(Item::lock);
            return Err(e);
        }

        self.keys = KeyState::Unlocked(keys);
        self.session.arm(Instant::now());
        self.emit(LockEvent::Unlocked);

        info!(uuid = %self.profile.uuid, items = self.items.len(), "keychain unlocked");
        Ok(true)
    }

    /// Discard all key material and decrypted item data.
    ///
    /// Locking an already locked keychain does nothing.
    pub fn lock(&mut self, automatic: bool) {
        if !self.is_unlocked() {
            return;
        }

        self.emit(LockEvent::BeforeLock { automatic });

        self.keys = KeyState::Locked;
        self.items.values_mut().for_each(Item::lock);
        self.session.disarm();

        self.emit(LockEvent::AfterLock { automatic });
        info!(uuid = %self.profile.uuid, automatic, "keychain locked");
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.keys, KeyState::Unlocked(_))
    }

    pub fn state(&self) -> State {
        match self.keys {
            KeyState::Locked => State::Locked,
            KeyState::Unlocked(_) => State::Unlocked,
        }
    }

    /// Re-wrap the master and overview keys under a new password.
    ///
    /// Items are not touched, so this costs two key derivations no matter
    /// how many items the keychain holds.  The lock state is unchanged.
    pub fn change_password(&mut self, old_password: &[u8], new_password: &[u8]) -> Result<()> {
        let old_keys = derive_key_pair(old_password, &self.profile.salt, self.profile.iterations)?;
        let raw = match hierarchy::unwrap(&old_keys, &self.profile.wrapped_keys()) {
            Ok(raw) => raw,
            Err(KeychainError::Integrity) => {
                warn!(uuid = %self.profile.uuid, "password change rejected: wrong password");
                return Err(KeychainError::WrongPassword);
            }
            Err(e) => return Err(e),
        };
        drop(old_keys);

        let new_keys = derive_key_pair(new_password, &self.profile.salt, self.profile.iterations)?;
        let wrapped = hierarchy::rewrap(&new_keys, &raw)?;

        self.profile.set_wrapped_keys(wrapped);
        self.profile.updated_at = Utc::now().timestamp();

        info!(uuid = %self.profile.uuid, "master password changed");
        Ok(())
    }

    /// Register a listener for unlock/lock notifications.
    pub fn on_lock_event<F>(&mut self, listener: F)
    where
        F: FnMut(LockEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: LockEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    // ------------------------------------------------------------------
    // Auto-lock
    // ------------------------------------------------------------------

    /// Push the auto-lock deadline forward.  Call on every user-driven
    /// access; item accessors on this type already do.
    pub fn reschedule(&mut self) {
        self.session.reschedule(Instant::now());
    }

    /// Lock if the inactivity window has elapsed.
    ///
    /// Returns `true` while the keychain is still unlocked, so a periodic
    /// checker knows whether to keep going.
    pub fn check_auto_lock(&mut self) -> bool {
        self.check_auto_lock_at(Instant::now())
    }

    /// [`check_auto_lock`](Self::check_auto_lock) against an explicit clock.
    pub fn check_auto_lock_at(&mut self, now: Instant) -> bool {
        if !self.is_unlocked() {
            return false;
        }
        if self.session.is_expired(now) {
            info!(uuid = %self.profile.uuid, "auto-lock timer expired");
            self.lock(true);
            return false;
        }
        true
    }

    /// When the keychain will lock itself.  `None` while locked, or when
    /// the window is too large to ever expire.
    pub fn auto_lock_deadline(&self) -> Option<Instant> {
        self.session.deadline()
    }

    pub fn auto_lock_window(&self) -> Duration {
        self.session.window()
    }

    pub fn set_auto_lock_window(&mut self, window: Duration) {
        self.session.set_window(window);
        self.reschedule();
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn unlocked_keys(&self) -> Result<&UnlockedKeys> {
        match &self.keys {
            KeyState::Unlocked(keys) => Ok(keys),
            KeyState::Locked => Err(KeychainError::Locked),
        }
    }

    /// Encrypt and add a new login item.  Returns its uuid.
    pub fn create_item(&mut self, data: &NewItem) -> Result<String> {
        let item = Item::create(data, self.unlocked_keys()?, Utc::now().timestamp())?;
        let uuid = item.uuid().to_string();
        self.items.insert(uuid.clone(), item);
        self.reschedule();

        debug!(item = %uuid, "item created");
        Ok(uuid)
    }

    /// Replace an item's overview and details.
    pub fn update_item(&mut self, uuid: &str, data: &NewItem) -> Result<()> {
        let KeyState::Unlocked(keys) = &self.keys else {
            return Err(KeychainError::Locked);
        };
        let item = self
            .items
            .get_mut(uuid)
            .ok_or_else(|| KeychainError::ItemNotFound(uuid.to_string()))?;
        item.update(data, keys, Utc::now().timestamp())?;
        self.reschedule();
        Ok(())
    }

    /// Add an already-encrypted record (e.g. from another band).
    ///
    /// If the keychain is unlocked the overview is decrypted right away.
    pub fn add_item(&mut self, record: ItemRecord) -> Result<()> {
        band::band_id(&record.uuid)?;
        let mut item = Item::from_record(record);
        if let KeyState::Unlocked(keys) = &self.keys {
            item.unlock_overview(&keys.overview)?;
        }
        if let Some(mut previous) = self.items.insert(item.uuid().to_string(), item) {
            previous.lock();
        }
        Ok(())
    }

    /// Remove an item, returning its encrypted record.
    pub fn remove_item(&mut self, uuid: &str) -> Result<ItemRecord> {
        let mut item = self
            .items
            .remove(uuid)
            .ok_or_else(|| KeychainError::ItemNotFound(uuid.to_string()))?;
        item.lock();
        Ok(item.record().clone())
    }

    /// Move an item to or from the trash.
    pub fn set_trashed(&mut self, uuid: &str, trashed: bool) -> Result<()> {
        let item = self
            .items
            .get_mut(uuid)
            .ok_or_else(|| KeychainError::ItemNotFound(uuid.to_string()))?;
        item.set_trashed(trashed, Utc::now().timestamp());
        self.reschedule();
        Ok(())
    }

    /// Look up an item by uuid, trashed or not.
    pub fn get_item(&mut self, uuid: &str) -> Result<&Item> {
        self.reschedule();
        self.items
            .get(uuid)
            .ok_or_else(|| KeychainError::ItemNotFound(uuid.to_string()))
    }

    /// The decrypted details of an item, decrypting them on first access.
    pub fn item_details(&mut self, uuid: &str) -> Result<&Value> {
        self.session.reschedule(Instant::now());
        let KeyState::Unlocked(keys) = &self.keys else {
            return Err(KeychainError::Locked);
        };
        let item = self
            .items
            .get_mut(uuid)
            .ok_or_else(|| KeychainError::ItemNotFound(uuid.to_string()))?;
        item.details(keys)
    }

    /// Items not in the trash, sorted by title (uuid while locked).
    pub fn list_items(&self) -> Vec<&Item> {
        self.sorted_items(|item| !item.is_trashed())
    }

    /// Items in the trash, sorted like [`list_items`](Self::list_items).
    pub fn trashed_items(&self) -> Vec<&Item> {
        self.sorted_items(Item::is_trashed)
    }

    fn sorted_items<F>(&self, keep: F) -> Vec<&Item>
    where
        F: Fn(&Item) -> bool,
    {
        let mut list: Vec<&Item> = self.items.values().filter(|item| keep(*item)).collect();
        list.sort_by(|a, b| {
            let key_a = a.title().unwrap_or(a.uuid()).to_lowercase();
            let key_b = b.title().unwrap_or(b.uuid()).to_lowercase();
            key_a.cmp(&key_b)
        });
        list
    }

    /// Every item, trashed or not, in uuid order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Attachment file names found by [`load`](Self::load).  Never decoded.
    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// The text of `profile.js`.
    pub fn export_profile(&self) -> Result<String> {
        self.profile.to_text()
    }

    /// Band file name → band file text for every non-empty shard.
    pub fn export_bands(&self) -> Result<BTreeMap<String, String>> {
        band::export(self.items.values().map(Item::record))
    }

    /// Write `<path>/<profile_name>/profile.js` and the band files.
    pub fn save(&self, path: &Path) -> Result<()> {
        let profile = self.export_profile()?;
        let bands = self.export_bands()?;
        files::write_profile_dir(path, &self.profile.profile_name, &profile, &bands)?;

        debug!(path = %path.display(), bands = bands.len(), "keychain saved");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn uuid(&self) -> &str {
        &self.profile.uuid
    }

    pub fn profile_name(&self) -> &str {
        &self.profile.profile_name
    }

    pub fn password_hint(&self) -> &str {
        &self.profile.password_hint
    }

    pub fn iterations(&self) -> u32 {
        self.profile.iterations
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> Option<&UnlockedKeys> {
        match &self.keys {
            KeyState::Unlocked(keys) => Some(keys),
            KeyState::Locked => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn fast_settings() -> KeychainSettings {
        KeychainSettings {
            iterations: 10,
            ..KeychainSettings::default()
        }
    }

    fn example() -> NewItem {
        NewItem {
            title: "Example".into(),
            username: "user".into(),
            password: "secret".into(),
            ..NewItem::default()
        }
    }

    #[test]
    fn created_keychain_is_unlocked_and_armed() {
        let kc = Keychain::create(b"hunter2", &fast_settings()).unwrap();
        assert_eq!(kc.state(), State::Unlocked);
        assert!(kc.auto_lock_deadline().is_some());
        assert_eq!(kc.profile().salt.len(), 16);
        assert_eq!(kc.profile_name(), "default");
    }

    #[test]
    fn change_password_keeps_key_hierarchy() {
        let mut kc = Keychain::create(b"old-pass", &fast_settings()).unwrap();
        kc.create_item(&example()).unwrap();
        kc.lock(false);
        assert!(kc.unlock(b"old-pass").unwrap());
        let master_before = kc.keys().unwrap().master.enc_key().to_vec();
        let overview_before = kc.keys().unwrap().overview.hmac_key().to_vec();

        kc.change_password(b"old-pass", b"new-pass").unwrap();
        kc.lock(false);

        assert!(!kc.unlock(b"old-pass").unwrap());
        assert!(kc.unlock(b"new-pass").unwrap());
        assert_eq!(kc.keys().unwrap().master.enc_key().to_vec(), master_before);
        assert_eq!(kc.keys().unwrap().overview.hmac_key().to_vec(), overview_before);
    }

    #[test]
    fn change_password_with_wrong_old_password_fails() {
        let mut kc = Keychain::create(b"right", &fast_settings()).unwrap();
        let before = kc.profile().clone();

        let err = kc.change_password(b"wrong", b"new").unwrap_err();
        assert!(matches!(err, KeychainError::WrongPassword));
        assert_eq!(kc.profile(), &before);
    }

    #[test]
    fn auto_lock_fires_after_window() {
        let mut kc = Keychain::create(b"pw", &fast_settings()).unwrap();
        let uuid = kc.create_item(&example()).unwrap();
        kc.item_details(&uuid).unwrap();

        let deadline = kc.auto_lock_deadline().unwrap();
        assert!(kc.check_auto_lock_at(deadline - Duration::from_millis(1)));
        assert!(!kc.check_auto_lock_at(deadline + Duration::from_secs(1)));

        assert_eq!(kc.state(), State::Locked);
        assert!(kc.auto_lock_deadline().is_none());
        assert!(kc.items().all(|item| !item.has_decrypted_fields()));
    }

    #[test]
    fn listeners_see_lock_events_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let mut kc = Keychain::create(b"pw", &fast_settings()).unwrap();
        kc.on_lock_event(move |event| sink.lock().unwrap().push(event));

        kc.lock(false);
        kc.lock(false);
        assert!(kc.unlock(b"pw").unwrap());
        kc.check_auto_lock_at(Instant::now() + Duration::from_secs(3600));

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                LockEvent::BeforeLock { automatic: false },
                LockEvent::AfterLock { automatic: false },
                LockEvent::Unlocked,
                LockEvent::BeforeLock { automatic: true },
                LockEvent::AfterLock { automatic: true },
            ]
        );
    }

    #[test]
    fn item_operations_require_unlock() {
        let mut kc = Keychain::create(b"pw", &fast_settings()).unwrap();
        let uuid = kc.create_item(&example()).unwrap();
        kc.lock(false);

        assert!(matches!(kc.create_item(&example()), Err(KeychainError::Locked)));
        assert!(matches!(kc.item_details(&uuid), Err(KeychainError::Locked)));
        assert!(matches!(
            kc.update_item(&uuid, &example()),
            Err(KeychainError::Locked)
        ));
        // Lookup by uuid still works on the encrypted record.
        assert_eq!(kc.get_item(&uuid).unwrap().uuid(), uuid);
    }

    #[test]
    fn corrupt_overview_fails_unlock_hard() {
        let mut kc = Keychain::create(b"pw", &fast_settings()).unwrap();
        let uuid = kc.create_item(&example()).unwrap();
        let mut record = kc.remove_item(&uuid).unwrap();
        let last = record.overview.len() - 1;
        record.overview[last] ^= 0xFF;
        kc.lock(false);
        kc.add_item(record).unwrap();

        let err = kc.unlock(b"pw").unwrap_err();
        assert!(matches!(err, KeychainError::CorruptItem { .. }));
        assert_eq!(kc.state(), State::Locked);
    }
}
