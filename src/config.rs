use anyhow::{bail, Context, Result};
use std::str::FromStr;

/// Which translation API the fan-out calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "openai" => Ok(ProviderKind::OpenAi),
            other => bail!("Unknown TRANSLATION_PROVIDER '{}' (expected google or openai)", other),
        }
    }
}

/// Where output records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Rtdb,
    Firestore,
    Postgres,
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rtdb" => Ok(BackendKind::Rtdb),
            "firestore" => Ok(BackendKind::Firestore),
            "postgres" => Ok(BackendKind::Postgres),
            "memory" => Ok(BackendKind::Memory),
            other => bail!(
                "Unknown OUTPUT_BACKEND '{}' (expected rtdb, firestore, postgres or memory)",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Environment
    pub environment: String,

    // Translation provider
    pub translation_provider: ProviderKind,
    pub google_api_key: Option<String>,
    pub google_api_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,

    // Output store
    pub output_backend: BackendKind,
    pub firebase_database_url: Option<String>,
    pub firebase_auth_token: Option<String>,
    pub firestore_project_id: Option<String>,
    pub firestore_api_url: String,
    pub database_url: Option<String>,

    // Ingress
    pub webhook_secret: Option<String>,
    pub request_timeout_secs: u64,
    pub redelivery_attempts: u32,
    pub port: u16,
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the environment without checking cross-field requirements.
    pub fn load() -> Result<Self> {
        Ok(Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),

            // Translation provider
            translation_provider: std::env::var("TRANSLATION_PROVIDER")
                .unwrap_or_else(|_| "google".to_string())
                .parse()?,
            google_api_key: optional_var("GOOGLE_TRANSLATE_API_KEY"),
            google_api_url: std::env::var("GOOGLE_TRANSLATE_API_URL").unwrap_or_else(|_| {
                "https://translation.googleapis.com/language/translate/v2".to_string()
            }),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),

            // Output store
            output_backend: std::env::var("OUTPUT_BACKEND")
                .unwrap_or_else(|_| "rtdb".to_string())
                .parse()?,
            firebase_database_url: optional_var("FIREBASE_DATABASE_URL"),
            firebase_auth_token: optional_var("FIREBASE_AUTH_TOKEN"),
            firestore_project_id: optional_var("FIRESTORE_PROJECT_ID"),
            firestore_api_url: std::env::var("FIRESTORE_API_URL")
                .unwrap_or_else(|_| "https://firestore.googleapis.com/v1".to_string()),
            database_url: optional_var("DATABASE_URL"),

            // Ingress
            webhook_secret: optional_var("WEBHOOK_SECRET"),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
            redelivery_attempts: parse_var("REDELIVERY_ATTEMPTS", 1)?,
            port: parse_var("PORT", 8080)?,
        })
    }

    /// Check that the selected provider and backend have what they need.
    pub fn validate(&self) -> Result<()> {
        match self.translation_provider {
            ProviderKind::Google => {
                self.google_api_key
                    .as_ref()
                    .context("GOOGLE_TRANSLATE_API_KEY not set")?;
            }
            ProviderKind::OpenAi => {
                self.openai_api_key
                    .as_ref()
                    .context("OPENAI_API_KEY not set")?;
            }
        }

        match self.output_backend {
            BackendKind::Rtdb => {
                self.firebase_database_url
                    .as_ref()
                    .context("FIREBASE_DATABASE_URL not set")?;
            }
            BackendKind::Firestore => {
                self.firestore_project_id
                    .as_ref()
                    .context("FIRESTORE_PROJECT_ID not set")?;
            }
            BackendKind::Postgres => {
                self.database_url.as_ref().context("DATABASE_URL not set")?;
            }
            BackendKind::Memory => {}
        }

        if self.redelivery_attempts == 0 {
            bail!("REDELIVERY_ATTEMPTS must be at least 1");
        }

        Ok(())
    }
}

/// Read a variable, treating an empty value as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", name, raw, e)),
        None => Ok(default),
    }
}
