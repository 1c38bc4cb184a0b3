use super::{error_body, status_error, TranslationProvider};
use crate::error::ProviderError;
use crate::i18n::LanguageRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Translation through OpenAI chat completions.
pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

/// English name for a language code, or the code itself when unregistered.
fn display_name(code: &str) -> &str {
    LanguageRegistry::get()
        .get_by_abbreviation(code)
        .map(|lang| lang.name)
        .unwrap_or(code)
}

/// Build the system prompt for translation
fn build_translation_system_prompt(from: &str, to: &str) -> String {
    format!(
        r#"You are a professional translator for a chat application. Translate the user's chat message from {} to {}.

### DO NOT translate:
- @mentions, URLs and email addresses
- Emojis and emoticons
- Proper names of people, companies, and products

### Output:
- Reply with the translated message only, no quotes, notes or explanations
- Keep the tone and register of the original (casual stays casual)
- If the message is already in {}, return it unchanged"#,
        display_name(from),
        display_name(to),
        display_name(to)
    )
}

impl OpenAiTranslator {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    fn build_request(&self, text: &str, from: &str, to: &str) -> TranslationRequest {
        // Reasoning models need higher token limits and don't support temperature
        let is_reasoning = is_reasoning_model(&self.model);

        TranslationRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_translation_system_prompt(from, to),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_completion_tokens: if is_reasoning { 4000 } else { 1000 },
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl TranslationProvider for OpenAiTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, ProviderError> {
        let request = self.build_request(text, from, to);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, error_body(response).await));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| {
                ProviderError::MalformedResponse(
                    "OpenAI translation response contained no choices".to_string(),
                )
            })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
