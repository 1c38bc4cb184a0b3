//! Language registry: Single source of truth for all supported languages.
//!
//! Every staged message is fanned out into exactly one copy per language in
//! this table. The table is built once on first access (`OnceLock`) and is
//! immutable thereafter.

use std::sync::OnceLock;

/// A supported chat language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Numeric identifier stored in the `language` field of chat messages
    pub id: u32,

    /// ISO 639-1 code understood by the translation provider (e.g., "en", "es")
    pub abbreviation: &'static str,

    /// English name of the language (e.g., "English", "Spanish")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "Español")
    pub native_name: &'static str,
}

/// Global language registry singleton.
///
/// Iteration order is the fan-out order. Output records are keyed by language,
/// so the order never affects which records are produced.
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

/// Abbreviation of the language used when a message's source is unknown.
const ENGLISH: &str = "en";

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// All registered languages, in registry order.
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Number of registered languages.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Get a language by the numeric id carried in chat messages.
    ///
    /// # Returns
    /// * `Some(&Language)` if the id is registered
    /// * `None` otherwise
    pub fn get_by_id(&self, id: u32) -> Option<&Language> {
        self.languages.iter().find(|lang| lang.id == id)
    }

    /// Get a language by its ISO 639-1 abbreviation.
    pub fn get_by_abbreviation(&self, abbreviation: &str) -> Option<&Language> {
        self.languages
            .iter()
            .find(|lang| lang.abbreviation == abbreviation)
    }

    /// The English entry, used as the fallback source language.
    ///
    /// # Panics
    /// Panics if the registry has no English entry (a configuration error in
    /// `default_languages`).
    pub fn english(&self) -> &Language {
        self.get_by_abbreviation(ENGLISH)
            .expect("Language registry must contain English")
    }
}

/// Default language configurations.
fn default_languages() -> Vec<Language> {
    vec![
        Language {
            id: 1,
            abbreviation: "en",
            name: "English",
            native_name: "English",
        },
        Language {
            id: 2,
            abbreviation: "es",
            name: "Spanish",
            native_name: "Español",
        },
        Language {
            id: 3,
            abbreviation: "pt",
            name: "Portuguese",
            native_name: "Português",
        },
        Language {
            id: 4,
            abbreviation: "de",
            name: "German",
            native_name: "Deutsch",
        },
        Language {
            id: 5,
            abbreviation: "fr",
            name: "French",
            native_name: "Français",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();

        // Should return the same instance (same memory address)
        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_registry_order() {
        let codes: Vec<_> = LanguageRegistry::get()
            .languages()
            .iter()
            .map(|lang| lang.abbreviation)
            .collect();

        assert_eq!(codes, vec!["en", "es", "pt", "de", "fr"]);
    }

    #[test]
    fn test_ids_and_abbreviations_are_unique() {
        let registry = LanguageRegistry::get();
        let ids: HashSet<_> = registry.languages().iter().map(|l| l.id).collect();
        let codes: HashSet<_> = registry
            .languages()
            .iter()
            .map(|l| l.abbreviation)
            .collect();

        assert_eq!(ids.len(), registry.len());
        assert_eq!(codes.len(), registry.len());
    }

    #[test]
    fn test_get_by_id() {
        let registry = LanguageRegistry::get();
        let german = registry.get_by_id(4).expect("German should be registered");

        assert_eq!(german.abbreviation, "de");
        assert_eq!(german.name, "German");
        assert_eq!(german.native_name, "Deutsch");
    }

    #[test]
    fn test_get_by_id_nonexistent() {
        let registry = LanguageRegistry::get();
        assert!(registry.get_by_id(0).is_none());
        assert!(registry.get_by_id(99).is_none());
    }

    #[test]
    fn test_get_by_abbreviation() {
        let registry = LanguageRegistry::get();
        assert_eq!(registry.get_by_abbreviation("pt").map(|l| l.id), Some(3));
        assert!(registry.get_by_abbreviation("ja").is_none());
        assert!(registry.get_by_abbreviation("").is_none());
    }

    #[test]
    fn test_english() {
        let english = LanguageRegistry::get().english();
        assert_eq!(english.id, 1);
        assert_eq!(english.abbreviation, "en");
    }

    #[test]
    fn test_len() {
        let registry = LanguageRegistry::get();
        assert_eq!(registry.len(), 5);
        assert!(!registry.is_empty());
    }
}
