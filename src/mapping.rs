//! Column-to-field mapping: the heuristic auto-mapper, the override resolver
//! and override parsing/loading.
//!
//! The auto-mapper is driven by [`AUTO_MAPPING_RULES`], an ordered table of
//! `(predicate, field)` pairs. The first matching rule wins, so precedence is
//! the table order. Headers no rule matches map to [`CanonicalField::Ignore`].

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result, anyhow};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Name,
    Email,
    Phone,
    Company,
    Address,
    Notes,
    Ignore,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 7] = [
        CanonicalField::Name,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Company,
        CanonicalField::Address,
        CanonicalField::Notes,
        CanonicalField::Ignore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Company => "company",
            CanonicalField::Address => "address",
            CanonicalField::Notes => "notes",
            CanonicalField::Ignore => "ignore",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = anyhow::Error;

    /// Accepts any casing/separator style: `Email`, `E-Mail`, `e_mail`, `NOTES`.
    fn from_str(value: &str) -> Result<Self> {
        let key = value.trim().to_snake_case().replace('_', "");
        let field = match key.as_str() {
            "name" | "fullname" => CanonicalField::Name,
            "email" => CanonicalField::Email,
            "phone" => CanonicalField::Phone,
            "company" => CanonicalField::Company,
            "address" => CanonicalField::Address,
            "notes" | "note" => CanonicalField::Notes,
            "ignore" | "skip" | "none" => CanonicalField::Ignore,
            _ => return Err(anyhow!("Unknown client field '{value}'")),
        };
        Ok(field)
    }
}

type HeaderPredicate = fn(&str) -> bool;

/// Ordered auto-mapping heuristics. Predicates receive the lower-cased header.
pub const AUTO_MAPPING_RULES: &[(HeaderPredicate, CanonicalField)] = &[
    (looks_like_name, CanonicalField::Name),
    (looks_like_email, CanonicalField::Email),
    (looks_like_phone, CanonicalField::Phone),
    (looks_like_company, CanonicalField::Company),
    (looks_like_address, CanonicalField::Address),
    (looks_like_notes, CanonicalField::Notes),
];

fn looks_like_name(header: &str) -> bool {
    header.contains("name") && !header.contains("company")
}

fn looks_like_email(header: &str) -> bool {
    header.contains("email") || header.contains("e-mail")
}

fn looks_like_phone(header: &str) -> bool {
    ["phone", "mobile", "tel", "cell"]
        .iter()
        .any(|token| header.contains(token))
}

fn looks_like_company(header: &str) -> bool {
    header.contains("company") || header.contains("business")
}

fn looks_like_address(header: &str) -> bool {
    header.contains("address")
}

fn looks_like_notes(header: &str) -> bool {
    header.contains("note")
}

pub fn auto_map_header(header: &str) -> CanonicalField {
    let lowered = header.to_lowercase();
    AUTO_MAPPING_RULES
        .iter()
        .find(|(predicate, _)| predicate(&lowered))
        .map(|(_, field)| *field)
        .unwrap_or(CanonicalField::Ignore)
}

/// One decision per distinct column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: BTreeMap<String, CanonicalField>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, field: CanonicalField) {
        self.entries.insert(column.into(), field);
    }

    /// Columns absent from the mapping are treated as ignored.
    pub fn field_for(&self, column: &str) -> CanonicalField {
        self.entries
            .get(column)
            .copied()
            .unwrap_or(CanonicalField::Ignore)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Column index to field, in header order, skipping ignored columns.
    pub fn projection(&self, headers: &[String]) -> Vec<(usize, CanonicalField)> {
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (idx, self.field_for(header)))
            .filter(|(_, field)| *field != CanonicalField::Ignore)
            .collect()
    }

    pub fn ignored_columns<'a>(&self, headers: &'a [String]) -> Vec<&'a str> {
        headers
            .iter()
            .filter(|h| self.field_for(h) == CanonicalField::Ignore)
            .map(String::as_str)
            .collect()
    }
}

impl FromIterator<(String, CanonicalField)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (String, CanonicalField)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

pub fn auto_map(headers: &[String]) -> FieldMapping {
    headers
        .iter()
        .map(|header| (header.clone(), auto_map_header(header)))
        .collect()
}

/// Starts from `proposal` and replaces every entry present in `overrides`.
pub fn resolve_mapping(proposal: &FieldMapping, overrides: &FieldMapping) -> FieldMapping {
    let mut resolved = proposal.clone();
    for (column, field) in overrides.iter() {
        resolved.insert(column, field);
    }
    resolved
}

/// Parses a `Column Name=field` override. The column part may itself contain `=`;
/// the last `=` separates the field.
pub fn parse_override(raw: &str) -> Result<(String, CanonicalField)> {
    let (column, field) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Mapping override '{raw}' must look like 'Column=field'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(anyhow!("Mapping override '{raw}' is missing a column name"));
    }
    let field = field
        .parse::<CanonicalField>()
        .with_context(|| format!("Parsing mapping override '{raw}'"))?;
    Ok((column.to_string(), field))
}

pub fn parse_overrides(raw: &[String]) -> Result<FieldMapping> {
    raw.iter()
        .map(|entry| parse_override(entry))
        .collect::<Result<FieldMapping>>()
}

/// Loads a `column: field` object from a JSON (`.json`) or YAML file.
pub fn load_overrides(path: &Path) -> Result<FieldMapping> {
    let file = File::open(path).with_context(|| format!("Opening mapping file {path:?}"))?;
    let reader = BufReader::new(file);
    let raw: BTreeMap<String, String> = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_reader(reader).context("Parsing mapping JSON")?
        }
        _ => serde_yaml::from_reader(reader).context("Parsing mapping YAML")?,
    };
    raw.into_iter()
        .map(|(column, field)| -> Result<(String, CanonicalField)> {
            let parsed = field
                .parse::<CanonicalField>()
                .with_context(|| format!("Mapping for column '{column}'"))?;
            Ok((column, parsed))
        })
        .collect()
}

/// Overrides from an optional mapping file, then `Column=field` flags on top.
pub fn collect_overrides(flags: &[String], file: Option<&Path>) -> Result<FieldMapping> {
    let from_flags = parse_overrides(flags)?;
    match file {
        Some(path) => Ok(resolve_mapping(&load_overrides(path)?, &from_flags)),
        None => Ok(from_flags),
    }
}
