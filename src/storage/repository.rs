//! SQLite and in-memory storage backends
//!
//! Both implement the same collaborator traits, so business logic and tests
//! can swap one for the other:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        TrendDataClient / KeywordBatchService         │
//! └──────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │         CredentialStore, TrendRecordSink             │
//! └──────────────────────────────────────────────────────┘
//!          │                 │                  │
//!          ▼                 ▼                  ▼
//!   ┌────────────┐   ┌──────────────┐   ┌─────────────┐
//!   │   SQLite   │   │  PostgreSQL  │   │  In-memory  │
//!   └────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use trendlens::storage::repository::{InMemoryKeywordSink, SqliteKeywordSink};
//!
//! // Production: use SQLite
//! let sink = SqliteKeywordSink::new("data/trendlens.db")?;
//!
//! // Testing: keep everything in memory
//! let sink = InMemoryKeywordSink::new();
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use super::{CredentialStore, StorageError, TrendRecordSink};
use crate::models::{CompetitionLevel, KeywordRecord, KeywordSource, SearchIntent};
use crate::provider::ProviderCredential;

// ============================================================================
// Core Types
// ============================================================================

/// A persisted keyword row with its storage identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredKeyword {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: KeywordRecord,
    pub competition_value: u8,
    pub stored_at: DateTime<Utc>,
}

impl StoredKeyword {
    fn new(record: KeywordRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            competition_value: record.competition_value(),
            record,
            stored_at: Utc::now(),
        }
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS keyword_research (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        topic_id TEXT NOT NULL,
        keyword TEXT NOT NULL COLLATE NOCASE,
        search_volume INTEGER NOT NULL DEFAULT 0,
        cpc REAL NOT NULL DEFAULT 0,
        competition REAL NOT NULL DEFAULT 0,
        competition_value INTEGER NOT NULL DEFAULT 0,
        competition_level TEXT,
        keyword_difficulty INTEGER NOT NULL DEFAULT 0,
        main_intent TEXT,
        source TEXT NOT NULL DEFAULT 'manual',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, topic_id, keyword)
    );

    CREATE INDEX IF NOT EXISTS idx_keyword_research_topic
        ON keyword_research(user_id, topic_id);

    CREATE TABLE IF NOT EXISTS api_credentials (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider TEXT NOT NULL,
        base_url TEXT NOT NULL,
        username TEXT NOT NULL,
        password TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_api_credentials_provider
        ON api_credentials(provider, is_active);
"#;

fn open_connection(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    conn.execute_batch(SCHEMA)?;

    tracing::info!(path = %path.display(), "SQLite database initialized");
    Ok(conn)
}

fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

// ============================================================================
// SQLite Keyword Sink
// ============================================================================

/// SQLite implementation of [`TrendRecordSink`]
///
/// One connection behind a `Mutex`; each batch is written in one transaction.
pub struct SqliteKeywordSink {
    conn: Mutex<Connection>,
}

impl SqliteKeywordSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(open_connection(path.as_ref())?),
        })
    }

    /// Create in-memory sink (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(open_in_memory()?),
        })
    }

    fn write_batch(&self, records: &[KeywordRecord]) -> Result<usize, StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO keyword_research (
                    id, user_id, topic_id, keyword, search_volume, cpc, competition,
                    competition_value, competition_level, keyword_difficulty, main_intent,
                    source, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
                 ON CONFLICT (user_id, topic_id, keyword) DO UPDATE SET
                    keyword = excluded.keyword,
                    search_volume = excluded.search_volume,
                    cpc = excluded.cpc,
                    competition = excluded.competition,
                    competition_value = excluded.competition_value,
                    competition_level = excluded.competition_level,
                    keyword_difficulty = excluded.keyword_difficulty,
                    main_intent = excluded.main_intent,
                    source = excluded.source,
                    updated_at = excluded.updated_at",
            )?;

            for record in records {
                let search_volume = i64::try_from(record.search_volume).map_err(|_| {
                    StorageError::ValueOutOfRange {
                        field: "search_volume",
                        value: record.search_volume.to_string(),
                    }
                })?;

                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    record.user_id,
                    record.topic_id,
                    record.keyword,
                    search_volume,
                    record.cpc,
                    record.competition,
                    record.competition_value(),
                    record.competition_level.map(|l| l.as_str()),
                    record.keyword_difficulty,
                    record.main_intent.map(|i| i.as_str()),
                    record.source.as_str(),
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    /// Stored keywords for one user/topic, ordered by keyword
    pub fn list_by_topic(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Vec<StoredKeyword>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, topic_id, keyword, search_volume, cpc, competition,
                    competition_value, competition_level, keyword_difficulty, main_intent,
                    source, updated_at
             FROM keyword_research
             WHERE user_id = ?1 AND topic_id = ?2
             ORDER BY keyword",
        )?;

        let rows = stmt
            .query_map(params![user_id, topic_id], stored_keyword_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of stored keywords
    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM keyword_research", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn stored_keyword_from_row(row: &Row<'_>) -> rusqlite::Result<StoredKeyword> {
    let id: String = row.get(0)?;
    let competition_level: Option<String> = row.get(8)?;
    let main_intent: Option<String> = row.get(10)?;
    let source: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(StoredKeyword {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        record: KeywordRecord {
            user_id: row.get(1)?,
            topic_id: row.get(2)?,
            keyword: row.get(3)?,
            search_volume: row.get::<_, i64>(4)?.max(0) as u64,
            cpc: row.get(5)?,
            competition: row.get(6)?,
            competition_level: competition_level.as_deref().and_then(CompetitionLevel::parse),
            keyword_difficulty: row.get(9)?,
            main_intent: main_intent.as_deref().and_then(SearchIntent::parse),
            source: KeywordSource::parse(&source).unwrap_or_default(),
        },
        competition_value: row.get(7)?,
        stored_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait]
impl TrendRecordSink for SqliteKeywordSink {
    async fn save_batch(&self, records: &[KeywordRecord]) -> Result<usize, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }
        let written = self.write_batch(records)?;
        tracing::debug!(written, "Keyword batch written to SQLite");
        Ok(written)
    }
}

// ============================================================================
// SQLite Credential Store
// ============================================================================

/// SQLite implementation of [`CredentialStore`] over the `api_credentials` table
pub struct SqliteCredentialStore {
    conn: Mutex<Connection>,
}

impl SqliteCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(open_connection(path.as_ref())?),
        })
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(open_in_memory()?),
        })
    }

    /// Make `credential` the only active credential for `provider`
    pub fn upsert_credential(
        &self,
        provider: &str,
        credential: &ProviderCredential,
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "UPDATE api_credentials SET is_active = 0, updated_at = ?2
             WHERE lower(provider) = lower(?1) AND is_active = 1",
            params![provider, now],
        )?;
        tx.execute(
            "INSERT INTO api_credentials (provider, base_url, username, password, is_active, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                provider,
                credential.base_url,
                credential.username,
                credential.password,
                now
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Deactivate every credential for `provider`, returning how many were active
    pub fn deactivate(&self, provider: &str) -> Result<usize, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let changed = conn.execute(
            "UPDATE api_credentials SET is_active = 0
             WHERE lower(provider) = lower(?1) AND is_active = 1",
            params![provider],
        )?;
        Ok(changed)
    }

    fn lookup(&self, provider: &str) -> Result<Option<ProviderCredential>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let credential = conn
            .query_row(
                "SELECT base_url, username, password FROM api_credentials
                 WHERE lower(provider) = lower(?1) AND is_active = 1
                 ORDER BY id DESC LIMIT 1",
                params![provider],
                |row| {
                    Ok(ProviderCredential::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        Ok(credential)
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get_active_credential(
        &self,
        provider: &str,
    ) -> Result<Option<ProviderCredential>, StorageError> {
        self.lookup(provider)
    }
}

// ============================================================================
// In-memory Implementations (for testing)
// ============================================================================

/// In-memory [`CredentialStore`] that counts lookups
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<String, ProviderCredential>>,
    lookups: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one active credential
    pub fn with_credential(provider: &str, credential: ProviderCredential) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.credentials.write() {
            map.insert(provider.to_lowercase(), credential);
        }
        store
    }

    pub fn insert(&self, provider: &str, credential: ProviderCredential) -> Result<(), StorageError> {
        self.credentials
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(provider.to_lowercase(), credential);
        Ok(())
    }

    /// Number of `get_active_credential` calls so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every lookup fail with [`StorageError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_active_credential(
        &self,
        provider: &str,
    ) -> Result<Option<ProviderCredential>, StorageError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("credential store offline".to_string()));
        }

        let map = self.credentials.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(&provider.to_lowercase()).cloned())
    }
}

type RecordKey = (String, String, String);

/// In-memory [`TrendRecordSink`] with upsert semantics
#[derive(Default)]
pub struct InMemoryKeywordSink {
    records: RwLock<HashMap<RecordKey, StoredKeyword>>,
    batches: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryKeywordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `save_batch` fail with [`StorageError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `save_batch` calls that reached the sink
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keywords for one user/topic, ordered by keyword
    pub fn list_by_topic(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Vec<StoredKeyword>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut rows: Vec<StoredKeyword> = records
            .values()
            .filter(|s| s.record.user_id == user_id && s.record.topic_id == topic_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.record.keyword.to_lowercase());
        Ok(rows)
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }
}

#[async_trait]
impl TrendRecordSink for InMemoryKeywordSink {
    async fn save_batch(&self, records: &[KeywordRecord]) -> Result<usize, StorageError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("sink offline".to_string()));
        }

        let mut stored = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        for record in records {
            let key = (
                record.user_id.clone(),
                record.topic_id.clone(),
                record.keyword.to_lowercase(),
            );
            let mut row = StoredKeyword::new(record.clone());
            if let Some(existing) = stored.get(&key) {
                row.id = existing.id;
            }
            stored.insert(key, row);
        }
        Ok(records.len())
    }
}

// ============================================================================
// Tests
// ============================================================================
