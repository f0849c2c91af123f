//! Editor for the launcher's `launcher_profiles.json`.
//!
//! The file belongs to the launcher, so the whole document is kept as a JSON
//! value and only `profiles.<id>` objects are touched. Everything else
//! (settings, auth data, fields other tools added to a profile) is written
//! back as it was read.
//!
//! # Writing
//!
//! Every mutating call re-reads the file first, then writes in steps:
//!
//! 1. Check the file is a writable regular file
//! 2. Copy it to `backup_launcher_profiles.json` (left behind afterwards)
//! 3. Write the new document to `new_launcher_profiles.json`
//! 4. Copy that over the original and remove it
//!
//! There is no locking. Two processes writing at once race, and the last
//! copy wins.

pub mod names;
pub mod types;

pub use types::{ProfileRecord, CUSTOM_PROFILE_TYPE};

use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::paths;

/// Profile id the Forge installer writes its own profile under.
pub const FORGE_PROFILE_ID: &str = "forge";

/// How many times to re-roll a random id or name that is already taken.
pub const MAX_UNIQUE_RETRIES: usize = 1000;

const PROFILES_KEY: &str = "profiles";

/// In-memory snapshot of a launcher profiles file.
#[derive(Debug)]
pub struct ProfileRegistry {
    path: PathBuf,
    document: Map<String, Value>,
    profiles: BTreeMap<String, ProfileRecord>,
}

impl ProfileRegistry {
    /// Load and parse the registry at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut registry = Self {
            path: path.to_path_buf(),
            document: Map::new(),
            profiles: BTreeMap::new(),
        };
        registry.refresh()?;
        Ok(registry)
    }

    /// Open `<dot_minecraft>/launcher_profiles.json`.
    pub fn open_in(dot_minecraft: &Path) -> Result<Self> {
        Self::open(&paths::launcher_profiles_path(dot_minecraft))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, replacing the snapshot. On failure the snapshot is
    /// left empty.
    pub fn refresh(&mut self) -> Result<()> {
        self.document.clear();
        self.profiles.clear();
        if !self.path.exists() {
            return Err(Error::RegistryMissing(self.path.clone()));
        }
        let text = fs::read_to_string(&self.path).map_err(|source| Error::RegistryReadFailed {
            path: self.path.clone(),
            source,
        })?;
        let document: Map<String, Value> =
            serde_json::from_str(&text).map_err(|source| Error::RegistryParseFailed {
                path: self.path.clone(),
                source,
            })?;
        self.load_document(document);
        debug!(
            "Loaded {} profiles from {}",
            self.profiles.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load_document(&mut self, document: Map<String, Value>) {
        self.profiles = document
            .get(PROFILES_KEY)
            .and_then(Value::as_object)
            .map(|profiles| {
                profiles
                    .iter()
                    .map(|(id, value)| (id.clone(), ProfileRecord::from_json(id, value)))
                    .collect()
            })
            .unwrap_or_default();
        self.document = document;
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ProfileRecord> {
        self.profiles.get(id)
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.profiles
            .values()
            .any(|profile| profile.name.as_deref() == Some(name))
    }

    /// A random id not used by any loaded profile.
    ///
    /// Gives up after [`MAX_UNIQUE_RETRIES`] collisions and returns the last
    /// candidate.
    pub fn new_unique_id<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut id = names::random_id(rng);
        for _ in 0..MAX_UNIQUE_RETRIES {
            if !self.has_id(&id) {
                break;
            }
            id = names::random_id(rng);
        }
        id
    }

    /// A random `<rock> <number>` name not used by any loaded profile.
    pub fn new_unique_name<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut name = names::random_name(rng);
        for _ in 0..MAX_UNIQUE_RETRIES {
            if !self.has_name(&name) {
                break;
            }
            name = names::random_name(rng);
        }
        name
    }

    /// All profiles, most recently used first. Profiles that were never used
    /// come last. Ties are ordered by descending id.
    pub fn list_profiles(&self) -> Vec<ProfileRecord> {
        let mut profiles: Vec<ProfileRecord> = self.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| {
            b.last_used_time
                .cmp(&a.last_used_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        profiles
    }

    /// Add a new profile.
    ///
    /// `name`, `icon`, `version` and `game_path` are required. `type` defaults
    /// to `custom`, and unset timestamps default to now.
    pub fn write_new_profile(&mut self, record: &ProfileRecord) -> Result<()> {
        self.refresh()?;
        let name = record.name.as_ref().ok_or(Error::InvalidProfile("name"))?;
        let icon = record.icon.as_ref().ok_or(Error::InvalidProfile("icon"))?;
        let version = record.version.as_ref().ok_or(Error::InvalidProfile("version"))?;
        let game_path = record
            .game_path
            .as_ref()
            .ok_or(Error::InvalidProfile("gamePath"))?;
        if self.has_id(&record.id) {
            return Err(Error::IdInUse(record.id.clone()));
        }
        if self.has_name(name) {
            return Err(Error::NameInUse(name.clone()));
        }

        let now = Utc::now();
        let complete = ProfileRecord {
            id: record.id.clone(),
            name: Some(name.clone()),
            profile_type: Some(
                record
                    .profile_type
                    .clone()
                    .unwrap_or_else(|| CUSTOM_PROFILE_TYPE.to_string()),
            ),
            icon: Some(icon.clone()),
            version: Some(version.clone()),
            game_path: Some(game_path.clone()),
            java_path: record.java_path.clone(),
            created_time: Some(record.created_time.unwrap_or(now)),
            last_used_time: Some(record.last_used_time.unwrap_or(now)),
        };
        let mut profile = Map::new();
        complete.merge_into(&mut profile);

        let mut document = self.document.clone();
        insert_profile(&mut document, &record.id, profile);
        self.write_document(document)?;
        info!("Added profile '{}' ({})", name, record.id);
        Ok(())
    }

    /// Overwrite the set fields of an existing profile.
    ///
    /// Fields the record leaves unset, and any keys this crate doesn't know
    /// about, keep their stored values. `lastUsed` is always rewritten, to
    /// the record's value or to now.
    pub fn update_profile(&mut self, record: &ProfileRecord) -> Result<()> {
        self.refresh()?;
        let mut profile = self
            .document
            .get(PROFILES_KEY)
            .and_then(|profiles| profiles.get(&record.id))
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(record.id.clone()))?;
        if let Some(name) = &record.name {
            let taken = self
                .profiles
                .values()
                .any(|other| other.id != record.id && other.name.as_ref() == Some(name));
            if taken {
                return Err(Error::NameInUse(name.clone()));
            }
        }

        let mut update = record.clone();
        update.last_used_time = Some(record.last_used_time.unwrap_or_else(Utc::now));
        update.merge_into(&mut profile);

        let mut document = self.document.clone();
        insert_profile(&mut document, &record.id, profile);
        self.write_document(document)?;
        info!("Updated profile {}", record.id);
        Ok(())
    }

    /// Give the Forge installer's profile a `lastUsed` time if it has none.
    ///
    /// The Forge installer doesn't set one. The time is back-dated a second
    /// so the modpack profile written afterwards sorts first.
    pub fn patch_forge_profile(&mut self) -> Result<()> {
        self.refresh()?;
        let mut forge = self
            .document
            .get(PROFILES_KEY)
            .and_then(|profiles| profiles.get(FORGE_PROFILE_ID))
            .and_then(Value::as_object)
            .cloned()
            .ok_or(Error::NoDefaultProfile)?;
        if forge.contains_key(types::KEY_LAST_USED) {
            debug!("Forge profile already has a last used time");
            return Ok(());
        }

        let last_used = Utc::now() - Duration::seconds(1);
        forge.insert(
            types::KEY_LAST_USED.to_string(),
            Value::String(types::format_time(last_used)),
        );
        let mut document = self.document.clone();
        insert_profile(&mut document, FORGE_PROFILE_ID, forge);
        self.write_document(document)?;
        info!("Patched Forge profile last used time");
        Ok(())
    }

    fn write_document(&mut self, document: Map<String, Value>) -> Result<()> {
        if !is_file_writable(&self.path) {
            return Err(Error::NotWritable(self.path.clone()));
        }
        let write_failed = |path: &Path, source| Error::WriteFailed {
            path: path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| write_failed(&self.path, io::Error::other(e)))?;

        let backup_path = paths::add_filename_prefix(&self.path, "backup_");
        let new_path = paths::add_filename_prefix(&self.path, "new_");
        if cfg!(windows) {
            if let Err(e) = paths::remove_file_if_exists(&backup_path) {
                warn!("Failed to remove {}: {}", backup_path.display(), e);
            }
        }
        fs::copy(&self.path, &backup_path).map_err(|source| Error::RegistryBackupFailed {
            path: backup_path.clone(),
            source,
        })?;
        fs::write(&new_path, text).map_err(|e| write_failed(&new_path, e))?;
        if cfg!(windows) {
            if let Err(e) = paths::remove_file_if_exists(&self.path) {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
        fs::copy(&new_path, &self.path).map_err(|e| write_failed(&self.path, e))?;
        if let Err(e) = fs::remove_file(&new_path) {
            warn!("Failed to remove {}: {}", new_path.display(), e);
        }

        self.load_document(document);
        Ok(())
    }
}

/// Insert or replace `profiles.<id>`, creating `profiles` if needed.
fn insert_profile(document: &mut Map<String, Value>, id: &str, profile: Map<String, Value>) {
    let profile = Value::Object(profile);
    match document.get_mut(PROFILES_KEY) {
        Some(Value::Object(profiles)) => {
            profiles.insert(id.to_string(), profile);
        }
        _ => {
            let mut profiles = Map::new();
            profiles.insert(id.to_string(), profile);
            document.insert(PROFILES_KEY.to_string(), Value::Object(profiles));
        }
    }
}

fn is_file_writable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() || metadata.permissions().readonly() {
        return false;
    }
    OpenOptions::new().append(true).open(path).is_ok()
}
