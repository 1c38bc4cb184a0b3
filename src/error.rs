//! Error types for the translation fan-out.

use thiserror::Error;

/// A translation provider call failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout, rate limit or 5xx response
    #[error("translation provider unavailable: {0}")]
    Unavailable(String),

    #[error("unsupported language pair '{from}' -> '{to}'")]
    UnsupportedPair { from: String, to: String },

    #[error("translation provider rejected credentials ({status})")]
    Unauthorized { status: u16 },

    /// Any other client error reported by the provider
    #[error("translation provider error ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed translation response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether the same call could succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Unavailable(_) | ProviderError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

/// Persisting an output record failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid output key: {0}")]
    InvalidKey(String),

    #[error("failed to encode output record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("output store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("output store error ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl WriteError {
    pub fn is_transient(&self) -> bool {
        match self {
            WriteError::Transport(_) | WriteError::Database(_) => true,
            WriteError::Rejected { status, .. } => *status == 429 || *status >= 500,
            WriteError::InvalidKey(_) | WriteError::Encode(_) => false,
        }
    }
}

/// One language's share of a fan-out that did not complete.
#[derive(Debug, Error)]
pub enum LanguageFailure {
    #[error("translating '{from}' -> '{to}' failed: {source}")]
    Translate {
        from: String,
        to: String,
        #[source]
        source: ProviderError,
    },

    #[error("writing '{key}' failed: {source}")]
    Write {
        key: String,
        #[source]
        source: WriteError,
    },
}

impl LanguageFailure {
    /// Target language abbreviation (translate) or output key (write).
    pub fn target(&self) -> &str {
        match self {
            LanguageFailure::Translate { to, .. } => to,
            LanguageFailure::Write { key, .. } => key,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            LanguageFailure::Translate { source, .. } => source.is_transient(),
            LanguageFailure::Write { source, .. } => source.is_transient(),
        }
    }
}

/// Aggregate failure of a fan-out invocation.
///
/// Holds every per-language failure; languages not listed here completed.
#[derive(Debug, Error)]
#[error(
    "{} of {} language operations failed: {}",
    .failures.len(),
    .attempted,
    summarize(.failures)
)]
pub struct FanOutError {
    pub attempted: usize,
    pub failures: Vec<LanguageFailure>,
}

impl FanOutError {
    /// Whether re-running the whole invocation could succeed.
    pub fn is_transient(&self) -> bool {
        self.failures.iter().any(LanguageFailure::is_transient)
    }
}

fn summarize(failures: &[LanguageFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::UnsupportedPair {
            from: "en".to_string(),
            to: "xx".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported language pair 'en' -> 'xx'");

        let err = ProviderError::Unauthorized { status: 403 };
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_language_failure_target() {
        let translate = LanguageFailure::Translate {
            from: "en".to_string(),
            to: "de".to_string(),
            source: ProviderError::Unavailable("timeout".to_string()),
        };
        let write = LanguageFailure::Write {
            key: "m1-fr".to_string(),
            source: WriteError::InvalidKey("bad".to_string()),
        };

        assert_eq!(translate.target(), "de");
        assert_eq!(write.target(), "m1-fr");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Unavailable("503".to_string()).is_transient());
        assert!(!ProviderError::Unauthorized { status: 401 }.is_transient());
        assert!(!ProviderError::UnsupportedPair {
            from: "en".to_string(),
            to: "xx".to_string()
        }
        .is_transient());

        assert!(WriteError::Rejected {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!WriteError::Rejected {
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!WriteError::InvalidKey("a/b".to_string()).is_transient());
    }

    #[test]
    fn test_fan_out_error_transient_if_any_failure_is() {
        let permanent = LanguageFailure::Translate {
            from: "en".to_string(),
            to: "xx".to_string(),
            source: ProviderError::UnsupportedPair {
                from: "en".to_string(),
                to: "xx".to_string(),
            },
        };
        let transient = LanguageFailure::Translate {
            from: "en".to_string(),
            to: "de".to_string(),
            source: ProviderError::Unavailable("timeout".to_string()),
        };

        let only_permanent = FanOutError {
            attempted: 5,
            failures: vec![permanent],
        };
        assert!(!only_permanent.is_transient());

        let with_transient = FanOutError {
            attempted: 5,
            failures: vec![transient],
        };
        assert!(with_transient.is_transient());
    }

    #[test]
    fn test_fan_out_error_display_lists_failures() {
        let err = FanOutError {
            attempted: 5,
            failures: vec![LanguageFailure::Translate {
                from: "en".to_string(),
                to: "de".to_string(),
                source: ProviderError::Unavailable("connection refused".to_string()),
            }],
        };

        let message = err.to_string();
        assert!(message.starts_with("1 of 5 language operations failed"));
        assert!(message.contains("'en' -> 'de'"));
        assert!(message.contains("connection refused"));
    }
}
