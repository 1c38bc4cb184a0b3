//! Internationalization (i18n) module for multi-language fan-out.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages
//! - `locale`: Language tag normalization ("en-US" -> "en")
//! - `metrics`: Translation observability counters
//!
//! # Example
//!
//! ```rust
//! use room_translator::i18n::{normalize, LanguageRegistry};
//!
//! let registry = LanguageRegistry::get();
//! let spanish = registry.get_by_id(2).unwrap();
//! assert_eq!(normalize(spanish.abbreviation), "es");
//! ```

mod locale;
mod metrics;
mod registry;

pub use locale::normalize;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{Language, LanguageRegistry};
