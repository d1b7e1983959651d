//! Save slots: versioned snapshots of the session behind a [`SaveStore`].
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::SaveStore;
use crate::constants::{
    SAVE_FIELD_STEP, SAVE_FIELD_TIME, SAVE_FIELD_VERSION, SAVE_FORMAT_VERSION, SAVE_SLOT_KEY,
};
use crate::numbers::round_f64_to_i64;
use crate::session::Session;
use crate::state::SessionState;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveDataError {
    #[error("save record is missing `{0}`")]
    MissingField(&'static str),
    #[error("save field `{field}` should be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("save version {found} is incompatible with {expected}")]
    IncompatibleVersion { found: String, expected: String },
    #[error("malformed save record: {0}")]
    Malformed(String),
}

/// On-disk record: the full session plus save metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    #[serde(flatten)]
    pub state: SessionState,
    pub step: u64,
    pub save_time: DateTime<Utc>,
    pub version: String,
}

/// Metadata checked before a record is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveHeader {
    pub step: u64,
    pub save_time: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveInfo {
    pub exists: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub step: Option<u64>,
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or_default().trim()
}

fn require<'a>(record: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, SaveDataError> {
    record.get(field).ok_or(SaveDataError::MissingField(field))
}

fn require_number(record: &Map<String, Value>, field: &'static str) -> Result<f64, SaveDataError> {
    require(record, field)?
        .as_f64()
        .ok_or(SaveDataError::WrongType {
            field,
            expected: "number",
        })
}

/// Check that a record carries the fields needed to rebuild a session.
///
/// # Errors
///
/// Returns the first problem found: a missing or mistyped required field, or
/// a version whose major component differs from the current format.
pub fn validate_save_data(record: &Value) -> Result<SaveHeader, SaveDataError> {
    let Value::Object(record) = record else {
        return Err(SaveDataError::Malformed("record is not an object".to_string()));
    };
    if !require(record, "gameStarted")?.is_boolean() {
        return Err(SaveDataError::WrongType {
            field: "gameStarted",
            expected: "boolean",
        });
    }
    require_number(record, "money")?;
    require_number(record, "health")?;
    let step = require_number(record, SAVE_FIELD_STEP)?;
    let step = u64::try_from(round_f64_to_i64(step).max(0)).unwrap_or_default();

    let version = match record.get(SAVE_FIELD_VERSION) {
        None | Some(Value::Null) => None,
        Some(Value::String(found)) => {
            if major(found) != major(SAVE_FORMAT_VERSION) {
                return Err(SaveDataError::IncompatibleVersion {
                    found: found.clone(),
                    expected: SAVE_FORMAT_VERSION.to_string(),
                });
            }
            Some(found.clone())
        }
        Some(_) => {
            return Err(SaveDataError::WrongType {
                field: SAVE_FIELD_VERSION,
                expected: "string",
            });
        }
    };
    let save_time = record
        .get(SAVE_FIELD_TIME)
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|stamp| stamp.with_timezone(&Utc));

    Ok(SaveHeader {
        step,
        save_time,
        version,
    })
}

/// In-memory slots shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, contents: impl Into<String>) {
        self.slots.borrow_mut().insert(key.to_string(), contents.into());
    }
}

impl SaveStore for MemoryStore {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), Self::Error> {
        self.insert_raw(key, contents);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

/// Slots stored as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`.
    ///
    /// # Errors
    ///
    /// Rejects keys that are empty or contain anything besides ASCII
    /// alphanumerics, `.`, `_` and `-`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::Backend(format!("invalid slot key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SaveStore for FileStore {
    type Error = StorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, contents)?;
        if let Err(err) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(key)?) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Save, load and inspect one slot. Failures are logged and reported as
/// `false`/`None`; the live session is never left half-updated.
#[derive(Debug, Clone)]
pub struct PersistenceGateway<S: SaveStore> {
    store: S,
    key: String,
}

impl<S: SaveStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, SAVE_SLOT_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write the session with the caller's `step`. Stamps the save time on the
    /// session only when the write succeeds.
    pub fn save(&self, session: &mut Session, step: u64) -> bool {
        let now = Utc::now();
        let mut state = session.snapshot();
        let stamp = state
            .last_save_timestamp
            .map_or(now, |previous| previous.max(now));
        state.last_save_timestamp = Some(stamp);
        let record = SavedSession {
            state,
            step,
            save_time: now,
            version: SAVE_FORMAT_VERSION.to_string(),
        };
        let contents = match serde_json::to_string(&record) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("could not encode save: {err}");
                return false;
            }
        };
        if let Err(err) = self.store.write(&self.key, &contents) {
            log::warn!("save to {} failed: {err}", self.key);
            return false;
        }
        session.mark_saved(stamp);
        log::info!("saved {} at step {step}", self.key);
        true
    }

    fn read_record(&self) -> Option<Value> {
        let contents = match self.store.read(&self.key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("reading {} failed: {err}", self.key);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("save {} is not valid JSON: {err}", self.key);
                None
            }
        }
    }

    /// Rebuild a session state from the slot, over fresh configured defaults.
    /// The live session is only read for its config.
    #[must_use]
    pub fn load(&self, session: &Session) -> Option<SessionState> {
        let record = self.read_record()?;
        let header = match validate_save_data(&record) {
            Ok(header) => header,
            Err(err) => {
                log::warn!("rejecting save {}: {err}", self.key);
                return None;
            }
        };
        let Value::Object(mut fields) = record else {
            return None;
        };
        for meta in [SAVE_FIELD_STEP, SAVE_FIELD_TIME, SAVE_FIELD_VERSION] {
            fields.remove(meta);
        }
        let mut state = SessionState::from_config(session.config());
        let applied = state.merge_fields(&fields, &[]);
        log::info!(
            "loaded {} from step {} ({applied} fields)",
            self.key,
            header.step
        );
        Some(state)
    }

    /// Load and restore into `session`. Returns false and leaves the session
    /// alone when there is nothing usable to load.
    pub fn load_into(&self, session: &mut Session) -> bool {
        match self.load(session) {
            Some(state) => {
                session.restore(state);
                true
            }
            None => false,
        }
    }

    pub fn has_save_data(&self) -> bool {
        matches!(self.store.read(&self.key), Ok(Some(_)))
    }

    pub fn clear_save_data(&self) -> bool {
        match self.store.remove(&self.key) {
            Ok(()) => {
                log::info!("cleared {}", self.key);
                true
            }
            Err(err) => {
                log::warn!("clearing {} failed: {err}", self.key);
                false
            }
        }
    }

    pub fn save_info(&self) -> SaveInfo {
        let Some(record) = self.read_record() else {
            return SaveInfo {
                exists: self.has_save_data(),
                ..SaveInfo::default()
            };
        };
        let header = validate_save_data(&record).ok();
        SaveInfo {
            exists: true,
            timestamp: header.as_ref().and_then(|h| h.save_time),
            step: header.map(|h| h.step),
        }
    }
}
