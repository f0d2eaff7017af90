use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use palabra_config::OutputConfig;
use palabra_entities::WordDatabase;

const REQUIRED_KEYS: [&str; 3] = ["metadata", "speaker_map", "entities"];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("write failed, previous file restored from {}: {source}", backup.display())]
    BackupRestored {
        backup: PathBuf,
        #[source]
        source: Box<StorageError>,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub pretty_print: bool,
    pub backup_on_update: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pretty_print: true,
            backup_on_update: true,
        }
    }
}

impl From<&OutputConfig> for StoreOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            pretty_print: config.pretty_print,
            backup_on_update: config.backup_on_update,
        }
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
    pub bytes: u64,
}

/// A word database stored as one JSON file.
///
/// Writes go to `<path>.tmp`, are re-read and validated, then renamed over
/// the target. An existing target is first copied to a timestamped backup,
/// which is moved back if anything fails.
pub struct JsonStore {
    path: PathBuf,
    options: StoreOptions,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, database: &WordDatabase) -> Result<WriteReport> {
        let path = self.path.as_path();
        tracing::info!(
            path = %path.display(),
            entities = database.entities().len(),
            "database_write_started"
        );

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let backup = if path.exists() && self.options.backup_on_update {
            let backup = backup_path_for(path, &chrono::Local::now());
            fs::copy(path, &backup).map_err(io_err(&backup))?;
            tracing::debug!(backup = %backup.display(), "database_backup_created");
            Some(backup)
        } else {
            None
        };

        let temp = temp_path_for(path);
        match self.write_validated(database, &temp) {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), bytes, "database_written");
                Ok(WriteReport {
                    path: path.to_path_buf(),
                    backup,
                    bytes,
                })
            }
            Err(e) => {
                if temp.is_file() {
                    let _ = fs::remove_file(&temp);
                }
                tracing::error!(path = %path.display(), error = %e, "database_write_failed");
                match backup {
                    Some(backup) if backup.exists() => {
                        fs::rename(&backup, path).map_err(io_err(path))?;
                        tracing::warn!(backup = %backup.display(), "database_backup_restored");
                        Err(StorageError::BackupRestored {
                            backup,
                            source: Box::new(e),
                        })
                    }
                    _ => Err(e),
                }
            }
        }
    }

    fn write_validated(&self, database: &WordDatabase, temp: &Path) -> Result<u64> {
        {
            let file = fs::File::create(temp).map_err(io_err(temp))?;
            let mut writer = BufWriter::new(file);
            if self.options.pretty_print {
                serde_json::to_writer_pretty(&mut writer, database)?;
            } else {
                serde_json::to_writer(&mut writer, database)?;
            }
            writer.flush().map_err(io_err(temp))?;
        }

        let written = fs::read(temp).map_err(io_err(temp))?;
        parse_database(&written)?;

        fs::rename(temp, &self.path).map_err(io_err(&self.path))?;
        Ok(written.len() as u64)
    }

    pub fn read(&self) -> Result<WordDatabase> {
        let bytes = fs::read(&self.path).map_err(io_err(&self.path))?;
        let database = parse_database(&bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            entities = database.entities().len(),
            "database_read"
        );
        Ok(database)
    }
}

/// Parse bytes as a database whose top-level keys are exactly
/// `metadata`, `speaker_map` and `entities`.
pub fn parse_database(bytes: &[u8]) -> Result<WordDatabase> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let object = value
        .as_object()
        .ok_or_else(|| StorageError::Validation("top-level JSON value is not an object".into()))?;
    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(StorageError::Validation(format!("missing required key: {key}")));
        }
    }
    if let Some(extra) = object.keys().find(|k| !REQUIRED_KEYS.contains(&k.as_str())) {
        return Err(StorageError::Validation(format!("unexpected key: {extra}")));
    }
    serde_json::from_value(value).map_err(|e| StorageError::Validation(e.to_string()))
}

/// `<stem>_backup_<YYYYmmdd_HHMMSS><.ext>` in the same directory.
pub fn backup_path_for<Tz>(path: &Path, now: &chrono::DateTime<Tz>) -> PathBuf
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{stem}_backup_{}{ext}", now.format("%Y%m%d_%H%M%S"));
    path.with_file_name(name)
}

/// `<path>.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_backup_name() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let backup = backup_path_for(Path::new("/data/words.json"), &now);
        assert_eq!(backup, PathBuf::from("/data/words_backup_20240309_140507.json"));
    }

    #[test]
    fn test_temp_name() {
        assert_eq!(
            temp_path_for(Path::new("out/words.json")),
            PathBuf::from("out/words.json.tmp")
        );
    }

    #[test]
    fn test_parse_rejects_missing_and_extra_keys() {
        let missing = br#"{"metadata": {"version": "1.0", "created_at": "x"}, "entities": []}"#;
        assert!(matches!(
            parse_database(missing),
            Err(StorageError::Validation(_))
        ));

        let extra = br#"{"metadata": {"version": "1.0", "created_at": "x"},
                         "speaker_map": {}, "entities": [], "notes": 1}"#;
        assert!(matches!(
            parse_database(extra),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_requires_metadata_keys() {
        let bytes = br#"{"metadata": {"version": "1.0"}, "speaker_map": {}, "entities": []}"#;
        assert!(matches!(
            parse_database(bytes),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_not_json() {
        assert!(matches!(
            parse_database(b"{not json"),
            Err(StorageError::Serialization(_))
        ));
    }
}
