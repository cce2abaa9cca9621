//! Import settings and their YAML persistence.
//!
//! Every field has a default, so an empty settings file (or no file at all)
//! yields a working configuration. CLI flags are layered on top by
//! [`crate::import_cmd`].

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicatePolicy;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ImportSettings {
    pub max_file_bytes: u64,
    /// Encoding label understood by `encoding_rs` (e.g. `utf-8`, `windows-1252`).
    pub encoding: String,
    pub duplicate_policy: DuplicatePolicy,
    pub field_limits: FieldLimits,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            encoding: "utf-8".to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            field_limits: FieldLimits::default(),
        }
    }
}

impl ImportSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings: ImportSettings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings YAML {path:?}"))?;
        settings.ensure_valid()?;
        Ok(settings)
    }

    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(self.max_file_bytes > 0, "max_file_bytes must be positive");
        ensure!(
            !self.encoding.trim().is_empty(),
            "encoding label cannot be empty"
        );
        self.field_limits.ensure_valid()
    }
}

/// Per-field length ceilings, in characters. Longer values are truncated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FieldLimits {
    pub name: usize,
    pub email: usize,
    pub phone: usize,
    pub company: usize,
    pub address: usize,
    pub notes: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            name: 255,
            email: 255,
            phone: 50,
            company: 255,
            address: 500,
            notes: 500,
        }
    }
}

impl FieldLimits {
    pub fn ensure_valid(&self) -> Result<()> {
        for (field, limit) in [
            ("name", self.name),
            ("email", self.email),
            ("phone", self.phone),
            ("company", self.company),
            ("address", self.address),
            ("notes", self.notes),
        ] {
            ensure!(limit > 0, "field limit for '{field}' must be positive");
        }
        Ok(())
    }
}
