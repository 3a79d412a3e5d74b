use std::{
    fs,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::Intent;
use crate::similarity::similarity;

/// Confidence assigned to a pattern on first reinforcement.
pub const INITIAL_CONFIDENCE: f64 = 0.6;
/// Confidence added per repeat reinforcement, capped at 1.0.
pub const CONFIDENCE_STEP: f64 = 0.1;
/// Patterns at or below this confidence are never consulted.
pub const CONSULT_THRESHOLD: f64 = 0.5;
/// Similarity a stored phrase must exceed for recall to fire.
pub const RECALL_THRESHOLD: f64 = 0.8;

/// A learned (phrase, intent) association scoped to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Owning user.
    pub user_id: String,
    /// Literal phrase as spoken.
    pub phrase: String,
    /// Intent the phrase resolved to.
    pub intent: Intent,
    /// Confidence in [0.5, 1.0]; grows with use, never decays.
    pub confidence: f64,
    /// Number of reinforcements.
    pub usage_count: u32,
    /// Timestamp of the latest reinforcement.
    pub last_used: DateTime<Utc>,
}

impl PatternRecord {
    fn fresh(user_id: &str, phrase: &str, intent: Intent) -> Self {
        Self {
            user_id: user_id.to_string(),
            phrase: phrase.to_string(),
            intent,
            confidence: INITIAL_CONFIDENCE,
            usage_count: 1,
            last_used: Utc::now(),
        }
    }

    fn matches_triple(&self, user_id: &str, phrase: &str, intent: Intent) -> bool {
        self.user_id == user_id && self.phrase == phrase && self.intent == intent
    }
}

/// Errors emitted by pattern persistence collaborators.
///
/// The interpreter contractually swallows these; they exist so the decision
/// to ignore a failure is explicit at the call site rather than hidden in a
/// catch-all.
#[derive(Debug, Error)]
pub enum PatternStoreError {
    /// Filesystem I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence collaborator for learned patterns.
///
/// `load` returns records pre-filtered to confidence strictly above 0.5;
/// `upsert` is fire-and-forget from the interpreter's point of view.
pub trait PatternPersistence: Send + Sync {
    /// Loads all consultable patterns.
    fn load(&self) -> Result<Vec<PatternRecord>, PatternStoreError>;
    /// Inserts or replaces the record for its (user, phrase, intent) triple.
    fn upsert(&self, record: &PatternRecord) -> Result<(), PatternStoreError>;
}

/// In-memory persistence for tests and development.
#[derive(Debug, Default)]
pub struct MemoryPatternPersistence {
    records: Mutex<Vec<PatternRecord>>,
}

impl MemoryPatternPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with records.
    #[must_use]
    pub fn seeded(records: Vec<PatternRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Number of stored records (including unconsultable ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl PatternPersistence for MemoryPatternPersistence {
    fn load(&self) -> Result<Vec<PatternRecord>, PatternStoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| record.confidence > CONSULT_THRESHOLD)
            .cloned()
            .collect())
    }

    fn upsert(&self, record: &PatternRecord) -> Result<(), PatternStoreError> {
        let mut records = self.records.lock();
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.matches_triple(&record.user_id, &record.phrase, record.intent))
        {
            *existing = record.clone();
        } else {
            records.push(record.clone());
        }
        Ok(())
    }
}

/// JSON-lines file persistence.
///
/// Upserts append; load keeps the last line per (user, phrase, intent)
/// triple, then filters to consultable confidence. Compaction is left to an
/// external janitor.
#[derive(Debug, Clone)]
pub struct JsonPatternPersistence {
    path: PathBuf,
}

impl JsonPatternPersistence {
    /// Creates a store at the given path, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, PatternStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatternPersistence for JsonPatternPersistence {
    fn load(&self) -> Result<Vec<PatternRecord>, PatternStoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut latest: IndexMap<(String, String, Intent), PatternRecord> = IndexMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: PatternRecord = serde_json::from_str(&line)?;
            latest.insert(
                (record.user_id.clone(), record.phrase.clone(), record.intent),
                record,
            );
        }
        Ok(latest
            .into_values()
            .filter(|record| record.confidence > CONSULT_THRESHOLD)
            .collect())
    }

    fn upsert(&self, record: &PatternRecord) -> Result<(), PatternStoreError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        serde_json::to_writer(&mut file, record)?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

/// A recall hit: a stored pattern similar enough to the current utterance.
#[derive(Debug, Clone)]
pub struct RecallHit {
    /// Intent to re-execute against the current text.
    pub intent: Intent,
    /// Stored phrase that matched.
    pub phrase: String,
    /// Stored confidence at match time.
    pub confidence: f64,
    /// Similarity between utterance and phrase.
    pub score: f64,
}

/// Per-user pattern memory with explicit persistence and locking discipline.
///
/// All pattern lists live behind one `RwLock`; reinforce takes the write
/// lock, so concurrent requests for the same user cannot lose updates.
pub struct PatternStore {
    persistence: Arc<dyn PatternPersistence>,
    patterns: RwLock<IndexMap<String, Vec<PatternRecord>>>,
}

impl PatternStore {
    /// Creates a store, loading consultable patterns from the collaborator.
    ///
    /// A load failure is logged and treated as an empty store; command
    /// processing must not depend on persistence health.
    #[must_use]
    pub fn bootstrap(persistence: Arc<dyn PatternPersistence>) -> Self {
        let mut patterns: IndexMap<String, Vec<PatternRecord>> = IndexMap::new();
        match persistence.load() {
            Ok(records) => {
                for record in records {
                    patterns
                        .entry(record.user_id.clone())
                        .or_default()
                        .push(record);
                }
            }
            Err(error) => {
                tracing::warn!(%error, "pattern load failed; starting with empty memory");
            }
        }
        Self {
            persistence,
            patterns: RwLock::new(patterns),
        }
    }

    /// First stored pattern similar enough to the text, in load order.
    ///
    /// Patterns at or below the consult threshold never fire, whatever their
    /// similarity. The first phrase scoring above the recall threshold
    /// short-circuits the scan.
    #[must_use]
    pub fn recall(&self, user_id: &str, text: &str) -> Option<RecallHit> {
        let patterns = self.patterns.read();
        let user_patterns = patterns.get(user_id)?;
        for record in user_patterns {
            if record.confidence <= CONSULT_THRESHOLD {
                continue;
            }
            let score = similarity(text, &record.phrase);
            if score > RECALL_THRESHOLD {
                return Some(RecallHit {
                    intent: record.intent,
                    phrase: record.phrase.clone(),
                    confidence: record.confidence,
                    score,
                });
            }
        }
        None
    }

    /// Reinforces the (user, phrase, intent) triple and returns its record.
    ///
    /// An existing triple gains one confidence step (capped at 1.0) and a
    /// usage count; a new one starts at the initial confidence. The updated
    /// record is forwarded to persistence; a write failure is logged and
    /// dropped.
    pub fn reinforce(&self, user_id: &str, phrase: &str, intent: Intent) -> PatternRecord {
        let mut patterns = self.patterns.write();
        let user_patterns = patterns.entry(user_id.to_string()).or_default();
        let record = if let Some(existing) = user_patterns
            .iter_mut()
            .find(|record| record.matches_triple(user_id, phrase, intent))
        {
            existing.confidence = (existing.confidence + CONFIDENCE_STEP).min(1.0);
            existing.usage_count += 1;
            existing.last_used = Utc::now();
            existing.clone()
        } else {
            let fresh = PatternRecord::fresh(user_id, phrase, intent);
            user_patterns.push(fresh.clone());
            fresh
        };
        drop(patterns);

        if let Err(error) = self.persistence.upsert(&record) {
            tracing::warn!(%error, user_id, "pattern upsert failed; keeping in-memory copy");
        }
        record
    }

    /// Snapshot of one user's patterns, in consultation order.
    #[must_use]
    pub fn patterns_for(&self, user_id: &str) -> Vec<PatternRecord> {
        self.patterns
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> PatternStore {
        PatternStore::bootstrap(Arc::new(MemoryPatternPersistence::new()))
    }

    #[test]
    fn reinforcement_grows_confidence_to_cap() {
        let store = store();
        for _ in 0..3 {
            store.reinforce("u1", "open whatsapp", Intent::OpenApp);
        }
        let record = &store.patterns_for("u1")[0];
        assert!((record.confidence - 0.8).abs() < 1e-9);
        assert_eq!(record.usage_count, 3);

        for _ in 0..10 {
            store.reinforce("u1", "open whatsapp", Intent::OpenApp);
        }
        let record = &store.patterns_for("u1")[0];
        assert!((record.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recall_matches_identical_phrase() {
        let store = store();
        store.reinforce("u1", "open whatsapp", Intent::OpenApp);
        let hit = store.recall("u1", "open whatsapp").unwrap();
        assert_eq!(hit.intent, Intent::OpenApp);
        assert!((hit.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recall_is_scoped_per_user() {
        let store = store();
        store.reinforce("u1", "open whatsapp", Intent::OpenApp);
        assert!(store.recall("u2", "open whatsapp").is_none());
    }

    #[test]
    fn recall_never_fires_at_or_below_consult_threshold() {
        // Persistence that does not honour the load filter, to exercise the
        // store's own guard.
        struct Unfiltered;
        impl PatternPersistence for Unfiltered {
            fn load(&self) -> Result<Vec<PatternRecord>, PatternStoreError> {
                Ok(vec![PatternRecord {
                    user_id: "u1".into(),
                    phrase: "open whatsapp".into(),
                    intent: Intent::OpenApp,
                    confidence: 0.5,
                    usage_count: 4,
                    last_used: Utc::now(),
                }])
            }
            fn upsert(&self, _record: &PatternRecord) -> Result<(), PatternStoreError> {
                Ok(())
            }
        }
        let store = PatternStore::bootstrap(Arc::new(Unfiltered));
        // Identical text, similarity 1.0, still no recall.
        assert!(store.recall("u1", "open whatsapp").is_none());
    }

    #[test]
    fn load_failure_yields_empty_store() {
        struct Broken;
        impl PatternPersistence for Broken {
            fn load(&self) -> Result<Vec<PatternRecord>, PatternStoreError> {
                Err(PatternStoreError::Io(std::io::Error::other("disk gone")))
            }
            fn upsert(&self, _record: &PatternRecord) -> Result<(), PatternStoreError> {
                Err(PatternStoreError::Io(std::io::Error::other("disk gone")))
            }
        }
        let store = PatternStore::bootstrap(Arc::new(Broken));
        assert!(store.recall("u1", "anything").is_none());
        // Reinforce still works in memory even when upsert fails.
        let record = store.reinforce("u1", "open maps", Intent::OpenApp);
        assert!((record.confidence - INITIAL_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn json_persistence_round_trips_last_write() {
        let dir = tempdir().unwrap();
        let persistence = JsonPatternPersistence::new(dir.path().join("patterns.jsonl")).unwrap();
        let mut record = PatternRecord::fresh("u1", "open whatsapp", Intent::OpenApp);
        persistence.upsert(&record).unwrap();
        record.confidence = 0.7;
        record.usage_count = 2;
        persistence.upsert(&record).unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!((loaded[0].confidence - 0.7).abs() < 1e-9);
        assert_eq!(loaded[0].usage_count, 2);
    }

    #[test]
    fn json_persistence_filters_low_confidence() {
        let dir = tempdir().unwrap();
        let persistence = JsonPatternPersistence::new(dir.path().join("patterns.jsonl")).unwrap();
        let mut record = PatternRecord::fresh("u1", "open whatsapp", Intent::OpenApp);
        record.confidence = 0.5;
        persistence.upsert(&record).unwrap();
        assert!(persistence.load().unwrap().is_empty());
    }
}
