use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// A shortcut found on one of the cleanup roots, plus the operator's intent for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShortcutRecord {
    pub name: String,
    pub path: String,
    pub parent: String,
    pub caption: String,
    #[serde(with = "epoch_seconds")]
    pub accessed: DateTime<Utc>,
    pub mark: bool,
}

impl ShortcutRecord {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        parent: impl Into<String>,
        caption: impl Into<String>,
        accessed: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            parent: parent.into(),
            caption: caption.into(),
            accessed: truncate_to_seconds(accessed),
            mark: false,
        }
    }
}

/// Whole-second instant from a filesystem time. Times before the epoch clamp to it.
pub fn accessed_from_system_time(time: SystemTime) -> DateTime<Utc> {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    from_epoch_seconds(secs)
}

pub fn from_epoch_seconds(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    from_epoch_seconds(instant.timestamp())
}

/// `accessed` travels as a plain epoch number. Fractional values written by
/// older builds are floored on the way in.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(instant.timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() {
            return Err(de::Error::custom("accessed is not a finite number"));
        }
        DateTime::from_timestamp(raw.floor() as i64, 0)
            .ok_or_else(|| de::Error::custom(format!("accessed {} is out of range", raw)))
    }
}

/// Insertion-ordered set of records keyed by path.
///
/// The set stays small (one desktop or two), so lookups are linear scans
/// over a `Vec`, which keeps ordering explicit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    records: Vec<ShortcutRecord>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record already stored under the same
    /// path in place (its position is kept).
    pub fn insert(&mut self, record: ShortcutRecord) {
        match self.position(&record.path) {
            Some(idx) => self.records[idx] = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, path: &str) -> Option<&ShortcutRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ShortcutRecord> {
        self.records.iter_mut().find(|r| r.path == path)
    }

    pub fn remove(&mut self, path: &str) -> Option<ShortcutRecord> {
        self.position(path).map(|idx| self.records.remove(idx))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShortcutRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ShortcutRecord] {
        &self.records
    }

    pub fn paths(&self) -> Vec<String> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }

    pub fn marked_paths(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.mark)
            .map(|r| r.path.clone())
            .collect()
    }

    /// Mark exactly the records whose path is in `checked`. Paths that are
    /// not tracked are ignored and returned so the caller can log them.
    pub fn set_marks(&mut self, checked: &HashSet<String>) -> Vec<String> {
        for record in self.records.iter_mut() {
            record.mark = checked.contains(&record.path);
        }
        checked
            .iter()
            .filter(|path| !self.contains(path))
            .cloned()
            .collect()
    }

    /// Oldest access first. Stable, so ties keep enumeration order.
    pub fn sort_by_accessed(&mut self) {
        self.records.sort_by_key(|r| r.accessed);
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.records.iter().position(|r| r.path == path)
    }
}

impl FromIterator<ShortcutRecord> for ActiveSet {
    fn from_iter<I: IntoIterator<Item = ShortcutRecord>>(iter: I) -> Self {
        let mut set = ActiveSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ActiveSet {
    type Item = &'a ShortcutRecord;
    type IntoIter = std::slice::Iter<'a, ShortcutRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
