//! hearth-storage-json
//!
//! Filesystem implementation of `HouseholdStore`: one pretty-printed JSON
//! document per household plus timestamped backups.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::SystemTime,
};

use chrono::{DateTime, NaiveDateTime, Utc};
use hearth_core::{CoreError, HouseholdBackupInfo, HouseholdStore};
use hearth_domain::{Household, CURRENT_SCHEMA_VERSION};

const FILE_EXTENSION: &str = "json";
const HOUSEHOLD_STEM: &str = "household";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directories the store reads from and writes to.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// `<base>/data` and `<base>/backups`.
    pub fn under(base: &Path) -> Self {
        Self {
            data_root: base.join("data"),
            backup_root: base.join("backups"),
        }
    }
}

/// Filesystem-backed JSON persistence for one household and its backups.
///
/// Every operation re-reads the document from disk, so separate handles on the
/// same file observe each other's writes and their version checks.
pub struct JsonHouseholdStore {
    paths: StoragePaths,
    retention: usize,
    lock: Mutex<()>,
}

impl JsonHouseholdStore {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
            lock: Mutex::new(()),
        })
    }

    pub fn household_path(&self) -> PathBuf {
        self.paths
            .data_root
            .join(format!("{HOUSEHOLD_STEM}.{FILE_EXTENSION}"))
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.lock
            .lock()
            .map_err(|_| CoreError::Storage("household store lock poisoned".into()))
    }

    fn read(&self) -> Result<Household, CoreError> {
        let path = self.household_path();
        if !path.exists() {
            return Ok(Household::new());
        }
        load_household_from_path(&path)
    }

    fn write_backup_file(
        &self,
        household: &Household,
        note: Option<&str>,
    ) -> Result<HouseholdBackupInfo, CoreError> {
        fs::create_dir_all(&self.paths.backup_root)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{HOUSEHOLD_STEM}_{timestamp}");
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let mut file_name = format!("{stem}.{FILE_EXTENSION}");
        let mut sequence = 2;
        while self.paths.backup_root.join(&file_name).exists() {
            file_name = format!("{stem}-{sequence}.{FILE_EXTENSION}");
            sequence += 1;
        }
        let path = self.paths.backup_root.join(&file_name);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &serialize_household(household)?)?;
        fs::rename(&tmp, &path)?;
        self.prune_backups()?;
        Ok(HouseholdBackupInfo {
            id: file_name,
            created_at: timestamp,
            path,
        })
    }

    fn collect_backups(&self) -> Result<Vec<HouseholdBackupInfo>, CoreError> {
        let dir = &self.paths.backup_root;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(created) = parse_backup_timestamp(file_name) else {
                continue;
            };
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((
                created,
                modified,
                HouseholdBackupInfo {
                    id: file_name.to_string(),
                    created_at: created.format(BACKUP_TIMESTAMP_FORMAT).to_string(),
                    path: path.clone(),
                },
            ));
        }
        entries.sort_by_key(|(created, modified, _)| Reverse((*created, *modified)));
        Ok(entries.into_iter().map(|(_, _, info)| info).collect())
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for entry in self.collect_backups()?.into_iter().skip(self.retention) {
            fs::remove_file(entry.path)?;
        }
        Ok(())
    }
}

impl HouseholdStore for JsonHouseholdStore {
    fn snapshot(&self) -> Result<Household, CoreError> {
        let _guard = self.guard()?;
        self.read()
    }

    fn mutate(
        &self,
        apply: &mut dyn FnMut(&mut Household) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        let mut household = self.read()?;
        apply(&mut household)?;
        household.touch();
        save_household_to_path(&household, &self.household_path())
    }

    fn backup(&self, note: Option<&str>) -> Result<HouseholdBackupInfo, CoreError> {
        let _guard = self.guard()?;
        let household = self.read()?;
        self.write_backup_file(&household, note)
    }

    /// Newest first.
    fn list_backups(&self) -> Result<Vec<HouseholdBackupInfo>, CoreError> {
        let _guard = self.guard()?;
        self.collect_backups()
    }

    fn restore_backup(&self, backup: &HouseholdBackupInfo) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let restored = load_household_from_path(&backup.path)?;
        save_household_to_path(&restored, &self.household_path())
    }
}

/// Saves a household to an arbitrary path on disk via a temp file and rename.
pub fn save_household_to_path(household: &Household, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_household(household)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a household from the provided filesystem path.
pub fn load_household_from_path(path: &Path) -> Result<Household, CoreError> {
    let data = fs::read_to_string(path)?;
    let household: Household =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if household.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema version {}, newer than supported version {}",
            path.display(),
            household.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(household)
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Reads `<date>_<time>` from a backup name, ignoring any note that follows.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{FILE_EXTENSION}"))?;
    let rest = trimmed.strip_prefix(&format!("{HOUSEHOLD_STEM}_"))?;
    let mut segments = rest.split('_');
    let date = segments.next()?;
    let time = segments.next()?;
    let time = time.split('-').next()?;
    if !is_digits(date, 8) || !is_digits(time, 4) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_household(household: &Household) -> Result<String, CoreError> {
    serde_json::to_string_pretty(household).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_timestamp_ignores_note_and_sequence() {
        let plain = parse_backup_timestamp("household_20240310_0915.json").unwrap();
        let noted = parse_backup_timestamp("household_20240310_0915_before-import.json").unwrap();
        let repeated = parse_backup_timestamp("household_20240310_0915-2.json").unwrap();
        assert_eq!(plain, noted);
        assert_eq!(plain, repeated);
        assert!(parse_backup_timestamp("notes.json").is_none());
    }

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("  Before March import! ")),
            Some("before-march-import".to_string())
        );
        assert_eq!(sanitize_backup_note(Some("***")), None);
    }
}
