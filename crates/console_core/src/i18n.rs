use std::collections::HashMap;

use shared::domain::{Language, Translation};

pub trait Localizer {
    fn resolve(&self, key: &str) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct TranslationCatalog {
    language: Language,
    entries: HashMap<String, Translation>,
}

impl TranslationCatalog {
    pub fn new(language: Language, translations: impl IntoIterator<Item = Translation>) -> Self {
        let mut catalog = Self {
            language,
            entries: HashMap::new(),
        };
        catalog.extend(translations);
        catalog
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn extend(&mut self, translations: impl IntoIterator<Item = Translation>) {
        for translation in translations {
            self.entries.insert(translation.key.clone(), translation);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Localizer for TranslationCatalog {
    /// Selected language, then English, then the key itself.
    fn resolve(&self, key: &str) -> String {
        self.entries
            .get(key)
            .and_then(|entry| {
                entry
                    .text(self.language)
                    .or_else(|| entry.text(Language::En))
            })
            .unwrap_or(key)
            .to_string()
    }
}
