//! Candidate client records: projection from raw rows, sanitizing and
//! validation.
//!
//! [`normalize_row`] is the per-row entry point. It never fails as a Rust
//! error; a row that cannot become a client yields one [`ImportError`] per
//! offending field.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::FieldLimits,
    mapping::{CanonicalField, FieldMapping},
    report::ImportError,
    tokenizer::RawRow,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CandidateClient {
    /// Projects mapped, non-ignored columns. A later column overwrites an
    /// earlier one targeting the same field.
    pub fn project(row: &RawRow, headers: &[String], mapping: &FieldMapping) -> Self {
        let mut client = CandidateClient::default();
        for (idx, field) in mapping.projection(headers) {
            client.set(field, row.get(idx));
        }
        client
    }

    fn set(&mut self, field: CanonicalField, value: &str) {
        let owned = value.to_string();
        match field {
            CanonicalField::Name => self.name = owned,
            CanonicalField::Email => self.email = owned,
            CanonicalField::Phone => self.phone = Some(owned),
            CanonicalField::Company => self.company = Some(owned),
            CanonicalField::Address => self.address = Some(owned),
            CanonicalField::Notes => self.notes = Some(owned),
            CanonicalField::Ignore => {}
        }
    }

    /// Trims, collapses control characters and truncates every field.
    /// Optional fields that end up empty become `None`.
    pub fn sanitize(self, limits: &FieldLimits) -> Self {
        let optional = |value: Option<String>, limit: usize| {
            value
                .map(|v| sanitize_text(&v, limit))
                .filter(|v| !v.is_empty())
        };
        CandidateClient {
            name: sanitize_text(&self.name, limits.name),
            email: sanitize_text(&self.email, limits.email),
            phone: optional(self.phone, limits.phone),
            company: optional(self.company, limits.company),
            address: optional(self.address, limits.address),
            notes: optional(self.notes, limits.notes),
        }
    }

    pub fn validate(&self, row: usize) -> Vec<ImportError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(ImportError::new(row, "name", "Name is required"));
        }
        if self.email.is_empty() {
            errors.push(ImportError::new(row, "email", "Email is required"));
        } else if !is_valid_email(&self.email) {
            errors.push(ImportError::new(
                row,
                "email",
                format!("Invalid email format: '{}'", self.email),
            ));
        }
        errors
    }
}

/// Projects, sanitizes and validates one row.
pub fn normalize_row(
    row: &RawRow,
    headers: &[String],
    mapping: &FieldMapping,
    limits: &FieldLimits,
) -> Result<CandidateClient, Vec<ImportError>> {
    let client = CandidateClient::project(row, headers, mapping).sanitize(limits);
    let errors = client.validate(row.number);
    if errors.is_empty() {
        Ok(client)
    } else {
        Err(errors)
    }
}

/// Trims, replaces each run of control characters with one space and caps
/// the result at `limit` characters.
pub fn sanitize_text(value: &str, limit: usize) -> String {
    let mut collapsed = String::with_capacity(value.len());
    let mut in_control_run = false;
    for ch in value.chars() {
        if ch.is_control() {
            if !in_control_run {
                collapsed.push(' ');
                in_control_run = true;
            }
        } else {
            collapsed.push(ch);
            in_control_run = false;
        }
    }
    let trimmed = collapsed.trim();
    match trimmed.char_indices().nth(limit) {
        Some((byte_idx, _)) => trimmed[..byte_idx].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value)
}
