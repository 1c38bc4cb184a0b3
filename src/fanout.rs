//! Translation fan-out: one output record per registered language.
//!
//! For a staged message with source language L, every registry language gets
//! exactly one output record: L itself receives the original payload
//! verbatim, every other language a translated copy. Per-language operations
//! run concurrently and the invocation succeeds only if all of them do.

use crate::error::{FanOutError, LanguageFailure};
use crate::i18n::{normalize, Language, LanguageRegistry, TranslationMetrics};
use crate::message::StagingEvent;
use crate::provider::TranslationProvider;
use crate::store::OutputWriter;
use futures::future::join_all;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The language a staged message is translated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// The declared id is registered; holds its normalized abbreviation.
    Declared { id: u32, abbreviation: &'static str },

    /// The declared id is missing or unknown; English is assumed.
    Defaulted {
        declared: Option<u32>,
        abbreviation: &'static str,
    },
}

impl SourceLanguage {
    /// Resolve the source from a message's declared language id.
    pub fn resolve(declared: Option<u32>) -> Self {
        let registry = LanguageRegistry::get();

        match declared.and_then(|id| registry.get_by_id(id)) {
            Some(lang) if !lang.abbreviation.is_empty() => SourceLanguage::Declared {
                id: lang.id,
                abbreviation: normalize(lang.abbreviation),
            },
            _ => SourceLanguage::Defaulted {
                declared,
                abbreviation: registry.english().abbreviation,
            },
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            SourceLanguage::Declared { abbreviation, .. }
            | SourceLanguage::Defaulted { abbreviation, .. } => *abbreviation,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, SourceLanguage::Defaulted { .. })
    }
}

/// One output record produced by a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    /// Target language abbreviation
    pub language: &'static str,

    /// Record id: `{messageId}-{language}`
    pub key: String,

    /// Whether the original payload was copied without translation
    pub pass_through: bool,
}

/// Result of a successful fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct FanOutReport {
    pub room_id: String,
    pub message_id: String,
    pub source: &'static str,
    pub source_defaulted: bool,

    /// Records written, in registry order
    pub outputs: Vec<OutputRecord>,
}

/// Reacts to staging writes by producing per-language output records.
#[derive(Clone)]
pub struct TranslationFanOut {
    provider: Arc<dyn TranslationProvider>,
    writer: Arc<dyn OutputWriter>,
}

impl TranslationFanOut {
    pub fn new(provider: Arc<dyn TranslationProvider>, writer: Arc<dyn OutputWriter>) -> Self {
        Self { provider, writer }
    }

    /// Run the fan-out for one staging event.
    ///
    /// Every language is attempted even when others fail; the error lists
    /// all failures. Re-running with the same event overwrites the same keys.
    pub async fn run(&self, event: &StagingEvent) -> Result<FanOutReport, FanOutError> {
        let metrics = TranslationMetrics::global();
        metrics.record_invocation();

        let registry = LanguageRegistry::get();
        let source = SourceLanguage::resolve(event.payload.language_id());

        if let SourceLanguage::Defaulted { abbreviation, .. } = source {
            warn!(
                "Message {}/{} declares unknown language {}, assuming '{}'",
                event.room_id,
                event.message_id,
                event
                    .payload
                    .language
                    .as_ref()
                    .map_or_else(|| "(none)".to_string(), |raw| raw.to_string()),
                abbreviation
            );
        }

        debug!(
            "Message {}/{}: type {:?}, sent at {:?}",
            event.room_id,
            event.message_id,
            event.payload.message_type(),
            event.payload.sent_at()
        );

        if !event.payload.has_text() {
            warn!(
                "Message {}/{} has no text, translating the whole payload",
                event.room_id, event.message_id
            );
        }

        let text = event.payload.translation_text();
        let from = source.abbreviation();

        let operations = registry
            .languages()
            .iter()
            .map(|target| self.deliver(event, &text, from, target));

        let mut outputs = Vec::with_capacity(registry.len());
        let mut failures = Vec::new();
        for result in join_all(operations).await {
            match result {
                Ok(record) => outputs.push(record),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            metrics.record_failed_invocation();
            let err = FanOutError {
                attempted: registry.len(),
                failures,
            };
            error!(
                "Fan-out for {}/{} failed: {}",
                event.room_id, event.message_id, err
            );
            return Err(err);
        }

        info!(
            "✓ Fanned out {}/{} from '{}' into {} languages",
            event.room_id,
            event.message_id,
            from,
            outputs.len()
        );

        Ok(FanOutReport {
            room_id: event.room_id.clone(),
            message_id: event.message_id.clone(),
            source: from,
            source_defaulted: source.is_defaulted(),
            outputs,
        })
    }

    /// Produce and write the output record for one target language.
    async fn deliver(
        &self,
        event: &StagingEvent,
        text: &str,
        from: &'static str,
        target: &'static Language,
    ) -> Result<OutputRecord, LanguageFailure> {
        let metrics = TranslationMetrics::global();
        let to = target.abbreviation;
        let key = format!("{}-{}", event.message_id, to);

        info!("translating from '{}' to '{}' ({})", from, to, key);
        debug!("text: '{}'", text);

        let pass_through = from == to;
        let payload = if pass_through {
            metrics.record_pass_through();
            Cow::Borrowed(&event.payload)
        } else {
            metrics.record_api_call();
            let translated = self
                .provider
                .translate(text, from, to)
                .await
                .map_err(|source| {
                    metrics.record_api_failure();
                    warn!(
                        "✗ {} translation '{}' -> '{}' failed: {}",
                        self.provider.name(),
                        from,
                        to,
                        source
                    );
                    LanguageFailure::Translate {
                        from: from.to_string(),
                        to: to.to_string(),
                        source,
                    }
                })?;
            Cow::Owned(event.payload.translated_copy(target, translated))
        };

        metrics.record_write();
        self.writer
            .write(&event.room_id, &event.message_id, to, &payload)
            .await
            .map_err(|source| {
                metrics.record_write_failure();
                warn!(
                    "✗ {} write of '{}' failed: {}",
                    self.writer.name(),
                    key,
                    source
                );
                LanguageFailure::Write {
                    key: key.clone(),
                    source,
                }
            })?;

        Ok(OutputRecord {
            language: to,
            key,
            pass_through,
        })
    }
}
