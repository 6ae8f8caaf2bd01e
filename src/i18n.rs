//! Language files and message templates.
//!
//! Languages live in a directory of TOML files, one per language code
//! (`en.toml`, `uk.toml`, ...), keyed by file stem.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Message strings for one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    pub page: PageStrings,
    pub button: ButtonStrings,
}

/// Page templates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageStrings {
    /// Class notification page. Placeholders: `{remaining}`, `{schedule}`.
    pub classes_notification: String,
}

/// Inline button labels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ButtonStrings {
    pub open_schedule: String,
    pub settings: String,
}

/// Errors loading or resolving languages.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("failed to read language directory {path}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read language file {path}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse language file {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("language {code:?} not found")]
    LanguageNotFound { code: String },
}

/// Loads every `*.toml` language file from `dir`, keyed by file stem.
pub fn load_languages(dir: &Path) -> Result<HashMap<String, Language>, I18nError> {
    let entries = fs::read_dir(dir).map_err(|source| I18nError::ReadDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut langs = HashMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| I18nError::ReadDir {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        let Some(code) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let contents = fs::read_to_string(&path).map_err(|source| I18nError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let language: Language = toml::from_str(&contents).map_err(|source| I18nError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        langs.insert(code.to_string(), language);
    }

    Ok(langs)
}

/// Resolves a chat's language. An empty code falls back to the default
/// language; an unknown code is an error.
pub fn resolve<'a>(
    langs: &'a HashMap<String, Language>,
    code: &str,
    default_lang: &str,
) -> Result<&'a Language, I18nError> {
    let code = if code.is_empty() { default_lang } else { code };
    langs.get(code).ok_or_else(|| I18nError::LanguageNotFound {
        code: code.to_string(),
    })
}
