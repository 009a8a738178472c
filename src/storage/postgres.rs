//! PostgreSQL credential store and keyword sink
//!
//! Both share the table layout of the SQLite backend (`api_credentials`,
//! `keyword_research`) and run over a `deadpool-postgres` pool.

use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use uuid::Uuid;

use super::{CredentialStore, StorageError, TrendRecordSink};
use crate::models::KeywordRecord;
use crate::provider::ProviderCredential;

const KEYWORD_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS keyword_research (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        topic_id TEXT NOT NULL,
        keyword TEXT NOT NULL,
        search_volume BIGINT NOT NULL DEFAULT 0,
        cpc DOUBLE PRECISION NOT NULL DEFAULT 0,
        competition DOUBLE PRECISION NOT NULL DEFAULT 0,
        competition_value SMALLINT NOT NULL DEFAULT 0,
        competition_level TEXT,
        keyword_difficulty SMALLINT NOT NULL DEFAULT 0,
        main_intent TEXT,
        source TEXT NOT NULL DEFAULT 'manual',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_keyword_research_keyword
        ON keyword_research(user_id, topic_id, lower(keyword));

    CREATE INDEX IF NOT EXISTS idx_keyword_research_topic
        ON keyword_research(user_id, topic_id);
"#;

const UPSERT_KEYWORD: &str = r#"
    INSERT INTO keyword_research (
        id, user_id, topic_id, keyword, search_volume, cpc, competition,
        competition_value, competition_level, keyword_difficulty, main_intent,
        source, created_at, updated_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
    ON CONFLICT (user_id, topic_id, lower(keyword)) DO UPDATE SET
        keyword = EXCLUDED.keyword,
        search_volume = EXCLUDED.search_volume,
        cpc = EXCLUDED.cpc,
        competition = EXCLUDED.competition,
        competition_value = EXCLUDED.competition_value,
        competition_level = EXCLUDED.competition_level,
        keyword_difficulty = EXCLUDED.keyword_difficulty,
        main_intent = EXCLUDED.main_intent,
        source = EXCLUDED.source,
        updated_at = EXCLUDED.updated_at
"#;

/// PostgreSQL implementation of [`TrendRecordSink`]
pub struct PostgresKeywordSink {
    pool: Pool,
}

impl PostgresKeywordSink {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create the `keyword_research` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let client = self.pool.get().await?;
        client.batch_execute(KEYWORD_SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl TrendRecordSink for PostgresKeywordSink {
    async fn save_batch(&self, records: &[KeywordRecord]) -> Result<usize, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let stmt = tx.prepare_cached(UPSERT_KEYWORD).await?;
        let now = Utc::now();

        for record in records {
            let search_volume = i64::try_from(record.search_volume).map_err(|_| {
                StorageError::ValueOutOfRange {
                    field: "search_volume",
                    value: record.search_volume.to_string(),
                }
            })?;

            tx.execute(
                &stmt,
                &[
                    &Uuid::new_v4(),
                    &record.user_id,
                    &record.topic_id,
                    &record.keyword,
                    &search_volume,
                    &record.cpc,
                    &record.competition,
                    &i16::from(record.competition_value()),
                    &record.competition_level.map(|l| l.as_str()),
                    &i16::from(record.keyword_difficulty),
                    &record.main_intent.map(|i| i.as_str()),
                    &record.source.as_str(),
                    &now,
                ],
            )
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(written = records.len(), "Keyword batch written to PostgreSQL");
        Ok(records.len())
    }
}

/// PostgreSQL implementation of [`CredentialStore`]
///
/// The `api_credentials` table is provisioned outside this crate.
pub struct PostgresCredentialStore {
    pool: Pool,
}

impl PostgresCredentialStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn get_active_credential(
        &self,
        provider: &str,
    ) -> Result<Option<ProviderCredential>, StorageError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT base_url, username, password FROM api_credentials
                 WHERE lower(provider) = lower($1) AND is_active
                 ORDER BY updated_at DESC LIMIT 1",
                &[&provider],
            )
            .await?;

        Ok(row.map(|row| {
            ProviderCredential::new(
                row.get::<_, String>(0),
                row.get::<_, String>(1),
                row.get::<_, String>(2),
            )
        }))
    }
}
