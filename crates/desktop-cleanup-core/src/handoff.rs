//! Durable snapshot of the active set, used to carry pending cleanup across
//! an elevated relaunch.
//!
//! The payload is a JSON object keyed by absolute path, one object per
//! record, in active set order:
//!
//! ```json
//! {"/home/u/Desktop/old.lnk": {"name": "old.lnk", "path": "/home/u/Desktop/old.lnk",
//!   "parent": "/home/u/Desktop", "caption": "u", "accessed": 100, "mark": true}}
//! ```

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::shortcut::{ActiveSet, ShortcutRecord};

pub fn encode(set: &ActiveSet) -> Result<String, Error> {
    let mut entries = Map::new();
    for record in set {
        entries.insert(record.path.clone(), serde_json::to_value(record)?);
    }
    Ok(serde_json::to_string(&Value::Object(entries))?)
}

/// Parse a handoff payload. Anything short of a non-empty object of valid
/// records is `CorruptHandoff`; there is no partial load.
pub fn decode(text: &str) -> Result<ActiveSet, Error> {
    if text.trim().is_empty() {
        return Err(corrupt("payload is empty"));
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| corrupt(format!("invalid JSON: {}", e)))?;

    let entries = match value {
        Value::Null => return Err(corrupt("top-level value is null")),
        Value::Object(entries) => entries,
        other => {
            return Err(corrupt(format!(
                "expected an object at top level, got {}",
                kind_of(&other)
            )))
        }
    };
    if entries.is_empty() {
        return Err(corrupt("no records"));
    }

    let mut set = ActiveSet::new();
    for (key, meta) in entries {
        if meta.is_null() {
            return Err(corrupt(format!("record for {} is null", key)));
        }
        let record: ShortcutRecord = serde_json::from_value(meta)
            .map_err(|e| corrupt(format!("record for {}: {}", key, e)))?;
        if record.path != key {
            return Err(corrupt(format!(
                "record keyed {} carries path {}",
                key, record.path
            )));
        }
        set.insert(record);
    }
    Ok(set)
}

fn corrupt(reason: impl Into<String>) -> Error {
    Error::CorruptHandoff(reason.into())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The one handoff file per operator. Its existence at startup means a
/// privilege-escalated resume is pending.
#[derive(Debug, Clone)]
pub struct HandoffFile {
    path: PathBuf,
}

impl HandoffFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save(&self, set: &ActiveSet) -> Result<(), Error> {
        let payload = encode(set)?;
        fs::write(&self.path, payload)?;
        info!(
            "Saved {} pending shortcuts to {}",
            set.len(),
            self.path.display()
        );
        Ok(())
    }

    /// `Ok(None)` when there is nothing to resume. A corrupt file is removed
    /// before the error is returned so it cannot trigger another resume.
    pub fn load(&self) -> Result<Option<ActiveSet>, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                self.discard_bad_file();
                return Err(corrupt(format!("not valid UTF-8: {}", err)));
            }
            Err(err) => return Err(err.into()),
        };

        match decode(&text) {
            Ok(set) => {
                debug!("Loaded {} shortcuts from {}", set.len(), self.path.display());
                Ok(Some(set))
            }
            Err(err) => {
                self.discard_bad_file();
                Err(err)
            }
        }
    }

    /// Returns whether a file was actually removed.
    pub fn delete(&self) -> Result<bool, Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed handoff file {}", self.path.display());
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn discard_bad_file(&self) {
        warn!("Removing bad tmp file {:?}", self.path.display().to_string());
        if let Err(err) = self.delete() {
            warn!("Could not remove {}: {}", self.path.display(), err);
        }
    }
}
