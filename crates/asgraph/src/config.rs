//! Arena and persistence configuration.

use crate::error::{AsgError, Result};
use crate::schema::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration applied when an [`Arena`](crate::Arena) is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Source language recorded in saved graphs and required when loading
    pub language: Language,

    /// Name of the root package singleton
    pub root_package_name: String,

    /// Keep ids of safe-mode double visits for later inspection
    pub record_double_visits: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            language: Language::Other,
            root_package_name: "<root_package>".to_string(),
            record_double_visits: true,
        }
    }
}

impl ArenaConfig {
    /// Config for a given language with default naming.
    pub fn for_language(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    /// Set the source language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the root package name
    pub fn with_root_package_name(mut self, name: impl Into<String>) -> Self {
        self.root_package_name = name.into();
        self
    }

    /// Toggle double-visit recording
    pub fn with_record_double_visits(mut self, record: bool) -> Self {
        self.record_double_visits = record;
        self
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Config`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AsgError::config("Invalid arena config", Some(e)))
    }

    /// Read a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Io`] if the file cannot be read and
    /// [`AsgError::Config`] if it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AsgError::io(format!("reading config {}", path.as_ref().display()), e)
        })?;
        Self::from_json(&text)
    }
}

/// Options for [`Arena::save`](crate::Arena::save).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Compress the node stream ("zsi" instead of "csi")
    pub compress: bool,
}

impl SaveOptions {
    /// Uncompressed output.
    pub fn plain() -> Self {
        Self { compress: false }
    }

    /// Compressed output.
    pub fn compressed() -> Self {
        Self { compress: true }
    }
}
