use super::{OutputKey, OutputWriter};
use crate::error::WriteError;
use crate::message::Message;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// PostgreSQL writer: one row per (room, message, language).
#[derive(Clone)]
pub struct PostgresWriter {
    pool: PgPool,
}

impl PostgresWriter {
    /// Connect and create the output table if needed.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let writer = Self { pool };
        writer.migrate().await?;
        Ok(writer)
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS translated_messages (
                room_id TEXT NOT NULL,
                message_id TEXT NOT NULL,
                language TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (room_id, message_id, language)
            )",
        )
        .execute(&self.pool)
        .await?;

        info!("✓ translated_messages table ready");
        Ok(())
    }
}

#[async_trait]
impl OutputWriter for PostgresWriter {
    async fn put(&self, key: &OutputKey, payload: &Message) -> Result<(), WriteError> {
        let body = serde_json::to_string(payload)?;

        sqlx::query(
            "INSERT INTO translated_messages (room_id, message_id, language, payload, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (room_id, message_id, language)
             DO UPDATE SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at",
        )
        .bind(key.room_id())
        .bind(key.message_id())
        .bind(key.language())
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
