//! Profile storage: one JSON file per profile inside the config directory
//!
//! Writes go to a temporary sibling first and are renamed over the target,
//! so an interrupted save leaves the previous version intact.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use super::preferences::Preferences;
use super::profile::Profile;
use crate::constants::config::*;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Open (and create if needed) the profile directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(path = %dir.display(), "Opened profile directory");
        Ok(Self { dir })
    }

    /// `<base>/config`, migrating a legacy `<base>/config.json` into it first
    pub fn open_in(base_dir: &Path) -> Result<Self, StoreError> {
        let store = Self::open(base_dir.join(DIR_NAME))?;
        if let Some(dest) = store.migrate_legacy(base_dir)? {
            info!(path = %dest.display(), "Migrated legacy config file");
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Turn user input into a profile filename (`work` -> `work.json`)
    pub fn normalize_filename(name: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.starts_with('.')
        {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        let filename = if name.ends_with(&format!(".{PROFILE_EXTENSION}")) {
            name.to_string()
        } else {
            format!("{name}.{PROFILE_EXTENSION}")
        };

        if filename == PREFERENCES_FILE {
            return Err(StoreError::InvalidName(filename));
        }
        Ok(filename)
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let filename = Self::normalize_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Profile files actually on disk, sorted
    fn profile_files(&self) -> Result<Vec<String>, StoreError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_profile = Path::new(&name)
                .extension()
                .is_some_and(|ext| ext == PROFILE_EXTENSION);
            if is_profile && name != PREFERENCES_FILE && !name.starts_with('.') {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Every profile filename; reports the default name (without creating it) when none exist
    pub fn list_profiles(&self) -> Vec<String> {
        match self.profile_files() {
            Ok(files) if !files.is_empty() => files,
            Ok(_) => vec![DEFAULT_PROFILE.to_string()],
            Err(e) => {
                warn!(path = %self.dir.display(), error = %e, "Failed to list profiles");
                vec![DEFAULT_PROFILE.to_string()]
            }
        }
    }

    pub fn load_profile(&self, filename: &str) -> Result<Profile, StoreError> {
        let path = self.path_for(filename)?;
        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(filename.to_string()),
            _ => StoreError::Io(e),
        })?;

        let mut profile: Profile =
            serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                file: filename.to_string(),
                source,
            })?;
        profile.filename = Self::normalize_filename(filename)?;
        if profile.normalize() {
            info!(file = %profile.filename, "Corrected out-of-range values while loading");
        }

        info!(file = %profile.filename, buttons = profile.buttons.len(), "Loaded profile");
        Ok(profile)
    }

    pub fn save_profile(&self, filename: &str, profile: &Profile) -> Result<(), StoreError> {
        let path = self.path_for(filename)?;
        let json = serde_json::to_string_pretty(profile).map_err(encode_error)?;
        write_atomic(&path, json.as_bytes())?;
        debug!(path = %path.display(), buttons = profile.buttons.len(), "Saved profile");
        Ok(())
    }

    /// Write a new empty profile; refuses to overwrite
    pub fn create_profile(&self, filename: &str) -> Result<String, StoreError> {
        let filename = Self::normalize_filename(filename)?;
        if self.exists(&filename) {
            return Err(StoreError::AlreadyExists(filename));
        }
        self.save_profile(&filename, &Profile::empty(filename.clone()))?;
        info!(file = %filename, "Created profile");
        Ok(filename)
    }

    /// Copy `src` to a new profile `dst`, keeping button ids
    pub fn copy_profile(&self, src: &str, dst: &str) -> Result<String, StoreError> {
        let dst = Self::normalize_filename(dst)?;
        if self.exists(&dst) {
            return Err(StoreError::AlreadyExists(dst));
        }
        let mut profile = self.load_profile(src)?;
        profile.filename = dst.clone();
        self.save_profile(&dst, &profile)?;
        info!(from = %src, to = %dst, "Copied profile");
        Ok(dst)
    }

    /// Delete a profile; the last remaining one is protected
    pub fn delete_profile(&self, filename: &str) -> Result<(), StoreError> {
        let path = self.path_for(filename)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        if self.profile_files()?.len() <= 1 {
            return Err(StoreError::LastProfile(filename.to_string()));
        }

        fs::remove_file(&path)?;
        info!(file = %filename, "Deleted profile");

        if self.profile_files()?.is_empty() {
            warn!("No profiles left after delete, recreating default");
            self.save_profile(DEFAULT_PROFILE, &Profile::empty(DEFAULT_PROFILE))?;
        }
        Ok(())
    }

    /// Unique name for a profile created from the tray
    pub fn new_profile_name(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let base = format!("{NEW_PROFILE_PREFIX}{secs}");
        let mut candidate = format!("{base}.{PROFILE_EXTENSION}");
        let mut n = 1;
        while self.exists(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}.{PROFILE_EXTENSION}");
        }
        candidate
    }

    fn preferences_path(&self) -> PathBuf {
        self.dir.join(PREFERENCES_FILE)
    }

    /// Last-used profile, or the default when unknown, unreadable or deleted since
    pub fn load_last_used(&self) -> String {
        let prefs = fs::read_to_string(self.preferences_path())
            .inspect_err(|e| debug!(error = %e, "No readable preferences file"))
            .ok()
            .and_then(|contents| {
                serde_json::from_str::<Preferences>(&contents)
                    .inspect_err(|e| debug!(error = %e, "Ignoring unparseable preferences file"))
                    .ok()
            });

        match prefs.and_then(|p| p.last_config) {
            Some(last) if self.exists(&last) => last,
            Some(last) => {
                debug!(file = %last, "Last-used profile no longer exists");
                DEFAULT_PROFILE.to_string()
            }
            None => DEFAULT_PROFILE.to_string(),
        }
    }

    /// Remember the active profile; failures are logged and swallowed
    pub fn save_last_used(&self, filename: &str) {
        let result = serde_json::to_vec(&Preferences::new(filename))
            .map_err(io::Error::other)
            .and_then(|json| write_atomic(&self.preferences_path(), &json));
        if let Err(e) = result {
            debug!(error = %e, "Failed to save preferences");
        }
    }

    /// Move `<base>/config.json` into the profile directory
    /// Empty directory: becomes `default.json`; otherwise archived under a backup name.
    pub fn migrate_legacy(&self, base_dir: &Path) -> Result<Option<PathBuf>, StoreError> {
        let legacy = base_dir.join(LEGACY_FILE);
        if !legacy.is_file() {
            return Ok(None);
        }

        let dir_is_empty = fs::read_dir(&self.dir)?.next().is_none();
        let dest = if dir_is_empty {
            self.dir.join(DEFAULT_PROFILE)
        } else {
            self.dir.join(LEGACY_BACKUP)
        };

        fs::rename(&legacy, &dest)?;
        Ok(Some(dest))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Serializing is a write failure; `Corrupt` is kept for files that fail to parse
fn encode_error(source: serde_json::Error) -> StoreError {
    StoreError::Io(io::Error::other(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::button::ButtonDefinition;
    use crate::types::Position;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::open(tmp.path().join(DIR_NAME)).unwrap();
        (tmp, store)
    }

    fn sample_profile(filename: &str) -> Profile {
        let mut profile = Profile::empty(filename);
        let mut a = ButtonDefinition::new_default();
        a.label = "复制 ✂".to_string();
        a.shortcut = "ctrl+c".to_string();
        let mut b = ButtonDefinition::new_default();
        b.shortcut = String::new();
        b.position = Position::new(5, 6);
        b.position_lock = true;
        profile.buttons = vec![a, b];
        profile
    }

    #[test]
    fn test_round_trip_preserves_profile() {
        let (_tmp, store) = store();
        let profile = sample_profile("main.json");
        store.save_profile("main.json", &profile).unwrap();
        assert_eq!(store.load_profile("main.json").unwrap(), profile);
    }

    #[test]
    fn test_saved_file_keeps_non_ascii_verbatim() {
        let (_tmp, store) = store();
        store.save_profile("main.json", &sample_profile("main.json")).unwrap();
        let raw = fs::read_to_string(store.dir().join("main.json")).unwrap();
        assert!(raw.contains("复制 ✂"));
        assert!(!store.dir().join(".main.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_tmp, store) = store();
        assert!(matches!(store.load_profile("nope.json"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let (_tmp, store) = store();
        fs::write(store.dir().join("bad.json"), "{ not json").unwrap();
        assert!(matches!(store.load_profile("bad.json"), Err(StoreError::Corrupt { .. })));

        fs::write(store.dir().join("schema.json"), r#"{"buttons":[{"id":1}]}"#).unwrap();
        assert!(matches!(store.load_profile("schema.json"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_encode_failure_is_io_not_corrupt() {
        let source = serde_json::from_str::<u32>("x").unwrap_err();
        let err = encode_error(source);
        assert!(matches!(err, StoreError::Io(ref e) if e.kind() == io::ErrorKind::Other));
    }

    #[test]
    fn test_load_defaults_missing_optional_fields() {
        let (_tmp, store) = store();
        let json = r##"{"buttons":[{"id":"a","label":"A","shortcut":"","position":[1,2],"size":[50,40],
            "color":"#000000","textColor":"#FFFFFF","borderColor":"#000000","opacity":0.5,"fontSize":14}]}"##;
        fs::write(store.dir().join("old.json"), json).unwrap();

        let profile = store.load_profile("old.json").unwrap();
        assert_eq!(profile.filename, "old.json");
        assert!(!profile.buttons[0].position_lock);
        assert_eq!(profile.buttons[0].font_family, crate::constants::button::DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_list_profiles_excludes_preferences_and_reports_default() {
        let (_tmp, store) = store();
        assert_eq!(store.list_profiles(), vec![DEFAULT_PROFILE.to_string()]);
        assert!(!store.exists(DEFAULT_PROFILE));

        store.create_profile("b").unwrap();
        store.create_profile("a.json").unwrap();
        store.save_last_used("a.json");
        fs::write(store.dir().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list_profiles(), vec!["a.json".to_string(), "b.json".to_string()]);
    }

    #[test]
    fn test_create_refuses_existing() {
        let (_tmp, store) = store();
        assert_eq!(store.create_profile("work").unwrap(), "work.json");
        assert!(matches!(store.create_profile("work.json"), Err(StoreError::AlreadyExists(_))));
        assert!(store.load_profile("work.json").unwrap().is_empty());
    }

    #[test]
    fn test_copy_keeps_ids_and_content() {
        let (_tmp, store) = store();
        let original = sample_profile("a.json");
        store.save_profile("a.json", &original).unwrap();

        store.copy_profile("a.json", "b.json").unwrap();
        let copy = store.load_profile("b.json").unwrap();

        assert_eq!(copy.buttons, original.buttons);
        assert_eq!(copy.filename, "b.json");
    }

    #[test]
    fn test_copy_errors() {
        let (_tmp, store) = store();
        store.create_profile("a.json").unwrap();
        store.create_profile("b.json").unwrap();
        assert!(matches!(
            store.copy_profile("a.json", "b.json"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(store.copy_profile("zzz.json", "c.json"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_last_profile_is_refused() {
        let (_tmp, store) = store();
        store.save_profile("only.json", &sample_profile("only.json")).unwrap();

        assert!(matches!(store.delete_profile("only.json"), Err(StoreError::LastProfile(_))));
        assert_eq!(store.list_profiles(), vec!["only.json".to_string()]);
        assert_eq!(store.load_profile("only.json").unwrap(), sample_profile("only.json"));
    }

    #[test]
    fn test_delete_one_of_many() {
        let (_tmp, store) = store();
        store.create_profile("a.json").unwrap();
        store.create_profile("b.json").unwrap();
        store.delete_profile("a.json").unwrap();
        assert_eq!(store.list_profiles(), vec!["b.json".to_string()]);
        assert!(matches!(store.delete_profile("a.json"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_normalize_filename_rules() {
        assert_eq!(ConfigStore::normalize_filename(" work ").unwrap(), "work.json");
        assert_eq!(ConfigStore::normalize_filename("x.json").unwrap(), "x.json");
        for bad in ["", "../x", "a/b", ".hidden", "preferences", "preferences.json"] {
            assert!(ConfigStore::normalize_filename(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_last_used_round_trip_and_fallbacks() {
        let (_tmp, store) = store();
        assert_eq!(store.load_last_used(), DEFAULT_PROFILE);

        store.create_profile("work.json").unwrap();
        store.save_last_used("work.json");
        assert_eq!(store.load_last_used(), "work.json");

        fs::write(store.dir().join(PREFERENCES_FILE), "garbage").unwrap();
        assert_eq!(store.load_last_used(), DEFAULT_PROFILE);

        store.save_last_used("deleted.json");
        assert_eq!(store.load_last_used(), DEFAULT_PROFILE);
    }

    #[test]
    fn test_new_profile_name_is_unique() {
        let (_tmp, store) = store();
        let first = store.new_profile_name();
        assert!(first.starts_with(NEW_PROFILE_PREFIX) && first.ends_with(".json"));
        store.create_profile(&first).unwrap();
        let second = store.new_profile_name();
        assert_ne!(first, second);
    }

    #[test]
    fn test_migrate_legacy_into_empty_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(LEGACY_FILE), r#"{"buttons":[]}"#).unwrap();

        let store = ConfigStore::open_in(tmp.path()).unwrap();

        assert!(!tmp.path().join(LEGACY_FILE).exists());
        assert!(store.dir().join(DEFAULT_PROFILE).is_file());
    }

    #[test]
    fn test_migrate_legacy_into_populated_dir() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::open(tmp.path().join(DIR_NAME)).unwrap();
        store.create_profile("mine.json").unwrap();
        fs::write(tmp.path().join(LEGACY_FILE), r#"{"buttons":[]}"#).unwrap();

        let dest = store.migrate_legacy(tmp.path()).unwrap();

        assert_eq!(dest, Some(store.dir().join(LEGACY_BACKUP)));
        assert!(store.dir().join("mine.json").is_file());
    }

    #[test]
    fn test_migrate_without_legacy_is_noop() {
        let (tmp, store) = store();
        assert_eq!(store.migrate_legacy(tmp.path()).unwrap(), None);
    }
}
