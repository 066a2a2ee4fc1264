//! Grid-key → experiment-id mapping
//!
//! Built up during the sweep and written once at the end as a block-style
//! YAML document (keys sorted), e.g.
//!
//! ```text
//! NG+OG_[0, 1, 2]: 3f2a9c...
//! NG+OG_[0, 1, 2]_(-ci): 81be04...
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::{Error, Result};

/// Mapping from grid key to the experiment id it produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelMapping {
    entries: BTreeMap<String, String>,
}

impl ModelMapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the id produced for a grid key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateGridKey`] if the key is already present;
    /// the existing entry is kept.
    pub fn record(&mut self, key: impl Into<String>, experiment_id: impl Into<String>) -> Result<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateGridKey(key));
        }
        self.entries.insert(key, experiment_id.into());
        Ok(())
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id recorded for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(key, id)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as block-style YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.entries)?)
    }

    /// Write the mapping to `path`, creating parent directories.
    ///
    /// The document is written to a temp file in the same directory and
    /// renamed into place, so readers never observe a partial file. The
    /// temp file is removed if any step fails.
    ///
    /// # Errors
    ///
    /// Returns an IO or YAML error if the document cannot be written.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), entries = self.len(), "wrote model mapping");
        Ok(())
    }

    /// Read a mapping previously written by [`ModelMapping::persist`].
    ///
    /// # Errors
    ///
    /// Returns an IO or YAML error if the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}
