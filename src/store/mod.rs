//! Output writers: persist one derived message copy per target language.
//!
//! Every write is an upsert at a location derived only from
//! `(room_id, message_id, language)`, so redelivered invocations overwrite
//! their previous output.

mod firestore;
mod postgres;
mod rtdb;

pub use firestore::FirestoreWriter;
pub use postgres::PostgresWriter;
pub use rtdb::RtdbWriter;

use crate::config::{BackendKind, Config};
use crate::error::WriteError;
use crate::message::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::info;

/// Root collection holding every room's staging and output records.
pub const ROOT_COLLECTION: &str = "room-messages";

/// Child of a room holding the per-language output records.
pub const OUTPUT_COLLECTION: &str = "OUTPUT";

/// Location of one output record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OutputKey {
    room_id: String,
    message_id: String,
    language: String,
}

impl OutputKey {
    /// Build a key, rejecting segments that are empty or contain characters
    /// Firebase does not allow in keys (`. $ # [ ] /` and control characters).
    pub fn new(room_id: &str, message_id: &str, language: &str) -> Result<Self, WriteError> {
        for (what, segment) in [
            ("room id", room_id),
            ("message id", message_id),
            ("language", language),
        ] {
            if !is_valid_segment(segment) {
                return Err(WriteError::InvalidKey(format!("{} {:?}", what, segment)));
            }
        }

        Ok(Self {
            room_id: room_id.to_string(),
            message_id: message_id.to_string(),
            language: language.to_string(),
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Record id within the room's output collection: `{messageId}-{language}`.
    pub fn record_id(&self) -> String {
        format!("{}-{}", self.message_id, self.language)
    }

    /// Full slash-separated path: `room-messages/{room}/OUTPUT/{messageId}-{language}`.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            ROOT_COLLECTION,
            self.room_id,
            OUTPUT_COLLECTION,
            self.record_id()
        )
    }
}

/// Whether `segment` can be used as one component of a database key.
pub fn is_valid_segment(segment: &str) -> bool {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT
        .get_or_init(|| {
            Regex::new(r"^[^.$#\[\]/\x00-\x1F\x7F]+$").expect("segment pattern is valid")
        })
        .is_match(segment)
}

#[async_trait]
pub trait OutputWriter: Send + Sync {
    /// Create or replace the record at `key`.
    async fn put(&self, key: &OutputKey, payload: &Message) -> Result<(), WriteError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Upsert `payload` as the `target` language copy of a room message.
    async fn write(
        &self,
        room_id: &str,
        message_id: &str,
        target: &str,
        payload: &Message,
    ) -> Result<(), WriteError> {
        let key = OutputKey::new(room_id, message_id, target)?;
        self.put(&key, payload).await
    }
}

/// In-process output store keyed by record path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<BTreeMap<String, Message>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record stored at a full path, if any.
    pub async fn get(&self, path: &str) -> Option<Message> {
        self.records.read().await.get(path).cloned()
    }

    /// Snapshot of every stored record, ordered by path.
    pub async fn records(&self) -> BTreeMap<String, Message> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OutputWriter for MemoryStore {
    async fn put(&self, key: &OutputKey, payload: &Message) -> Result<(), WriteError> {
        self.records
            .write()
            .await
            .insert(key.path(), payload.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Build the writer selected by `OUTPUT_BACKEND`.
pub async fn build_writer(
    config: &Config,
    client: reqwest::Client,
) -> Result<Arc<dyn OutputWriter>> {
    let writer: Arc<dyn OutputWriter> = match config.output_backend {
        BackendKind::Rtdb => {
            let url = config
                .firebase_database_url
                .clone()
                .context("FIREBASE_DATABASE_URL not set")?;
            Arc::new(RtdbWriter::new(
                client,
                url,
                config.firebase_auth_token.clone(),
            ))
        }
        BackendKind::Firestore => {
            let project_id = config
                .firestore_project_id
                .clone()
                .context("FIRESTORE_PROJECT_ID not set")?;
            Arc::new(FirestoreWriter::new(
                client,
                config.firestore_api_url.clone(),
                project_id,
                config.firebase_auth_token.clone(),
            ))
        }
        BackendKind::Postgres => {
            let url = config.database_url.as_deref().context("DATABASE_URL not set")?;
            Arc::new(
                PostgresWriter::connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?,
            )
        }
        BackendKind::Memory => Arc::new(MemoryStore::new()),
    };

    info!("Output backend: {}", writer.name());
    Ok(writer)
}
