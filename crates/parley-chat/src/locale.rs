//! Localized UI strings.
//!
//! Resources come in the `resources.json` shape served alongside the page:
//! one object per language code, each mapping string keys to text plus a
//! `language` entry holding the human-readable label.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use parley_core::Result;
use tracing::{debug, info};

use crate::surface::Localizer;

/// Key holding a language's display label.
const LABEL_KEY: &str = "language";

/// String table for every shipped language, with one active language.
#[derive(Debug)]
pub struct ResourceTable {
    resources: BTreeMap<String, BTreeMap<String, String>>,
    default_language: String,
    active: RwLock<String>,
}

impl ResourceTable {
    /// Parse a `resources.json` document. `requested` becomes the active
    /// language if the table has it, otherwise `default_language` does.
    pub fn from_json(json: &str, default_language: &str, requested: Option<&str>) -> Result<Self> {
        let resources: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(json)?;
        let mut table = Self {
            resources,
            default_language: default_language.to_string(),
            active: RwLock::new(String::new()),
        };
        let active = table.resolve_language(requested.unwrap_or(default_language));
        table.active = RwLock::new(active);
        Ok(table)
    }

    /// Read and parse a `resources.json` file.
    pub fn load(path: &Path, default_language: &str, requested: Option<&str>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content, default_language, requested)?;
        info!(
            "Loaded {} languages from {}",
            table.resources.len(),
            path.display()
        );
        Ok(table)
    }

    /// `lang` if the table has it, otherwise the default language.
    pub fn resolve_language(&self, lang: &str) -> String {
        if self.resources.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    pub fn language(&self) -> String {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch the active language, returning the one actually selected.
    pub fn set_language(&self, lang: &str) -> String {
        let resolved = self.resolve_language(lang);
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = resolved.clone();
        debug!(requested = lang, active = %resolved, "Language switched");
        resolved
    }

    /// `(code, label)` for every language, ordered by code. Languages
    /// without a label are listed under their code.
    pub fn languages(&self) -> Vec<(String, String)> {
        self.resources
            .iter()
            .map(|(code, strings)| {
                let label = strings
                    .get(LABEL_KEY)
                    .cloned()
                    .unwrap_or_else(|| code.clone());
                (code.clone(), label)
            })
            .collect()
    }
}

impl Localizer for ResourceTable {
    fn get_string(&self, key: &str) -> String {
        let lang = self.language();
        self.resources
            .get(&lang)
            .and_then(|strings| strings.get(key))
            .filter(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
