//! Translation provider clients.
//!
//! A provider is a thin call-through to an external translation API: no
//! caching and no retries. Failures go straight back to the fan-out.

mod google;
mod openai;

pub use google::GoogleTranslator;
pub use openai::OpenAiTranslator;

use crate::config::{Config, ProviderKind};
use crate::error::ProviderError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` from language `from` to language `to` (ISO 639-1 codes).
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, ProviderError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Shared HTTP client for providers and stores.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Build the provider selected by `TRANSLATION_PROVIDER`.
pub fn build_provider(
    config: &Config,
    client: reqwest::Client,
) -> Result<Arc<dyn TranslationProvider>> {
    let provider: Arc<dyn TranslationProvider> = match config.translation_provider {
        ProviderKind::Google => {
            let api_key = config
                .google_api_key
                .clone()
                .context("GOOGLE_TRANSLATE_API_KEY not set")?;
            Arc::new(GoogleTranslator::new(
                client,
                config.google_api_url.clone(),
                api_key,
            ))
        }
        ProviderKind::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY not set")?;
            Arc::new(OpenAiTranslator::new(
                client,
                config.openai_api_url.clone(),
                api_key,
                config.openai_model.clone(),
            ))
        }
    };

    Ok(provider)
}

/// Map a non-success HTTP status to a provider error.
///
/// Rate limits and 5xx responses are transient; other 4xx are not.
fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized {
            status: status.as_u16(),
        },
        429 => ProviderError::Unavailable(format!("rate limited ({}): {}", status, body)),
        s if s >= 500 => ProviderError::Unavailable(format!("{}: {}", status, body)),
        s => ProviderError::Rejected { status: s, body },
    }
}

/// Read an error body without failing on a broken stream.
async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;

    fn create_test_config(provider: ProviderKind) -> Config {
        Config {
            environment: "test".to_string(),
            translation_provider: provider,
            google_api_key: Some("test-google-key".to_string()),
            google_api_url: "http://localhost:9/language/translate/v2".to_string(),
            openai_api_key: Some("test-openai-key".to_string()),
            openai_model: "gpt-4o-mini".to_string(),
            openai_api_url: "http://localhost:9/v1/chat/completions".to_string(),
            output_backend: BackendKind::Memory,
            firebase_database_url: None,
            firebase_auth_token: None,
            firestore_project_id: None,
            firestore_api_url: "http://localhost:9/v1".to_string(),
            database_url: None,
            webhook_secret: None,
            request_timeout_secs: 5,
            redelivery_attempts: 1,
            port: 8080,
        }
    }

    #[test]
    fn test_build_google_provider() {
        let config = create_test_config(ProviderKind::Google);
        let provider = build_provider(&config, reqwest::Client::new()).expect("Should build");
        assert_eq!(provider.name(), "google");
    }

    #[test]
    fn test_build_openai_provider() {
        let config = create_test_config(ProviderKind::OpenAi);
        let provider = build_provider(&config, reqwest::Client::new()).expect("Should build");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_build_provider_missing_key() {
        let mut config = create_test_config(ProviderKind::OpenAi);
        config.openai_api_key = None;
        assert!(build_provider(&config, reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_status_error_classification() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            ProviderError::Unauthorized { status: 401 }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            ProviderError::Unauthorized { status: 403 }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "nope".to_string()),
            ProviderError::Rejected { status: 404, .. }
        ));
    }
}
