use super::{error_body, status_error, TranslationProvider};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Google Cloud Translation (v2 REST) client.
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, ProviderError> {
        let request = TranslateRequest {
            q: text,
            source: from,
            target: to,
            // Plain text: no HTML entity escaping in the result
            format: "text",
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            debug!("Google Translate error ({}): {}", status, body);
            if status.as_u16() == 400 && is_unsupported_pair(&body) {
                return Err(ProviderError::UnsupportedPair {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            return Err(status_error(status, body));
        }

        let parsed: TranslateResponse = response.json().await?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response contained no translations".to_string())
            })
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// Google reports unknown or unsupported codes as a 400 with one of these messages.
fn is_unsupported_pair(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("bad language pair") || lower.contains("invalid value")
}
