//! Language preference and the translation seam.
//!
//! The string tables themselves live outside this crate; a [`Translator`]
//! resolves keys for a [`Language`] and falls back to the key itself.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

use crate::framework::BlobStore;

/// Blob key the language preference is persisted under.
pub const LANGUAGE_KEY: &str = "appLanguage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
    Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl Language {
    pub const fn code(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "fr" => Some(Language::Fr),
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    pub const fn direction(self) -> TextDirection {
        match self {
            Language::Ar => TextDirection::Rtl,
            Language::Fr | Language::En => TextDirection::Ltr,
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolves UI strings.
pub trait Translator: Send + Sync {
    /// The text for `key` in `language`, or `key` itself when unknown.
    fn translate(&self, language: Language, key: &str) -> String;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslations;

impl Translator for NoTranslations {
    fn translate(&self, _language: Language, key: &str) -> String {
        key.to_string()
    }
}

/// In-memory string tables, one map per language.
///
/// Deserializes from `{"fr": {"price": "Prix"}, "en": {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tables: HashMap<Language, HashMap<String, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: Language, key: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.tables.entry(language).or_default().insert(key.into(), text.into());
        self
    }
}

impl Translator for Catalog {
    fn translate(&self, language: Language, key: &str) -> String {
        self.tables
            .get(&language)
            .and_then(|table| table.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// A translator bound to the active language.
#[derive(Clone)]
pub struct Localizer {
    language: Language,
    translator: Arc<dyn Translator>,
}

impl Localizer {
    pub fn new(language: Language, translator: Arc<dyn Translator>) -> Self {
        Self { language, translator }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn direction(&self) -> TextDirection {
        self.language.direction()
    }

    pub fn t(&self, key: &str) -> String {
        self.translator.translate(self.language, key)
    }
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer").field("language", &self.language).finish_non_exhaustive()
    }
}

/// The persisted language preference.
pub struct Preferences {
    blob: Arc<dyn BlobStore>,
    language: Language,
}

impl Preferences {
    /// Reads the stored language; absent or unknown codes mean French.
    pub async fn load(blob: Arc<dyn BlobStore>) -> io::Result<Self> {
        let language = match blob.get(LANGUAGE_KEY).await? {
            None => Language::default(),
            Some(code) => Language::from_code(&code).unwrap_or_else(|| {
                warn!(%code, "Unknown language preference, using default");
                Language::default()
            }),
        };
        Ok(Self { blob, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub async fn set_language(&mut self, language: Language) -> io::Result<()> {
        self.blob.set(LANGUAGE_KEY, language.code()).await?;
        self.language = language;
        info!(%language, direction = ?language.direction(), "Language changed");
        Ok(())
    }

    pub fn localizer(&self, translator: Arc<dyn Translator>) -> Localizer {
        Localizer::new(self.language, translator)
    }
}
