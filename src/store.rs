//! The commit boundary and the known-client snapshot.
//!
//! [`ClientStore`] is the single seam between the pipeline and durable
//! storage. [`InMemoryClientStore`] backs the CLI and the tests.

use std::{collections::HashMap, fmt, path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{client::CandidateClient, io_utils};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        ClientId(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    Create,
    Update(ClientId),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("store rejected the record: {0}")]
    Rejected(String),
    #[error("store did not respond within {0:?}")]
    Timeout(Duration),
    #[error("client {0} does not exist")]
    UnknownClient(ClientId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Create-or-update boundary. One call per accepted row.
pub trait ClientStore {
    /// Returns the id of the created or updated record.
    fn commit(
        &mut self,
        client: &CandidateClient,
        decision: CommitDecision,
    ) -> Result<ClientId, CommitError>;
}

impl<S: ClientStore + ?Sized> ClientStore for &mut S {
    fn commit(
        &mut self,
        client: &CandidateClient,
        decision: CommitDecision,
    ) -> Result<ClientId, CommitError> {
        (**self).commit(client, decision)
    }
}

/// Trim and full lower-case. Plus-addressing and dots are significant.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Read-only email to id lookup over clients that existed before the batch.
#[derive(Debug, Clone, Default)]
pub struct KnownClients {
    by_email: HashMap<String, ClientId>,
}

impl KnownClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first id seen for an email is kept.
    pub fn insert(&mut self, email: &str, id: ClientId) {
        self.by_email.entry(normalize_email(email)).or_insert(id);
    }

    pub fn lookup(&self, email: &str) -> Option<ClientId> {
        self.by_email.get(&normalize_email(email)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    /// Loads a CSV with (case-insensitive) `id` and `email` columns. Rows
    /// without an email are skipped.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Opening client snapshot {path:?}"))?;
        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("Client snapshot {path:?} has no '{name}' column"))
        };
        let id_idx = position("id")?;
        let email_idx = position("email")?;

        let mut known = KnownClients::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Reading snapshot row {}", row_idx + 2))?;
            let email = record.get(email_idx).unwrap_or("");
            if email.is_empty() {
                continue;
            }
            let raw_id = record.get(id_idx).unwrap_or("");
            let id = Uuid::parse_str(raw_id).map(ClientId).with_context(|| {
                format!("Snapshot row {} has an invalid id '{raw_id}'", row_idx + 2)
            })?;
            known.insert(email, id);
        }
        debug!("Loaded {} known client(s) from {:?}", known.len(), path);
        Ok(known)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredClient {
    pub id: ClientId,
    #[serde(flatten)]
    pub client: CandidateClient,
}

/// Ordered in-memory store. Creates append; updates replace in place.
#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    clients: Vec<StoredClient>,
    index: HashMap<ClientId, usize>,
}

impl InMemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with the snapshot's ids. Only the email is known for
    /// snapshot records.
    pub fn from_known(known: &KnownClients) -> Self {
        let mut store = Self::new();
        let mut seeded = known
            .by_email
            .iter()
            .map(|(email, id)| (*id, email.clone()))
            .collect::<Vec<_>>();
        seeded.sort();
        for (id, email) in seeded {
            store.push(StoredClient {
                id,
                client: CandidateClient {
                    email,
                    ..CandidateClient::default()
                },
            });
        }
        store
    }

    pub fn clients(&self) -> &[StoredClient] {
        &self.clients
    }

    pub fn get(&self, id: ClientId) -> Option<&StoredClient> {
        self.index.get(&id).map(|idx| &self.clients[*idx])
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn push(&mut self, stored: StoredClient) {
        self.index.insert(stored.id, self.clients.len());
        self.clients.push(stored);
    }

    /// Writes `id,name,email,phone,company,address,notes` rows.
    pub fn write_csv(&self, path: Option<&Path>) -> Result<()> {
        let mut writer = io_utils::open_csv_writer(path)?;
        writer
            .write_record(["id", "name", "email", "phone", "company", "address", "notes"])
            .context("Writing client headers")?;
        for stored in &self.clients {
            let c = &stored.client;
            writer
                .write_record([
                    stored.id.to_string().as_str(),
                    c.name.as_str(),
                    c.email.as_str(),
                    c.phone.as_deref().unwrap_or(""),
                    c.company.as_deref().unwrap_or(""),
                    c.address.as_deref().unwrap_or(""),
                    c.notes.as_deref().unwrap_or(""),
                ])
                .with_context(|| format!("Writing client {}", stored.id))?;
        }
        writer.flush().context("Flushing client output")?;
        Ok(())
    }
}

impl ClientStore for InMemoryClientStore {
    fn commit(
        &mut self,
        client: &CandidateClient,
        decision: CommitDecision,
    ) -> Result<ClientId, CommitError> {
        match decision {
            CommitDecision::Create => {
                let id = ClientId::new();
                self.push(StoredClient {
                    id,
                    client: client.clone(),
                });
                Ok(id)
            }
            CommitDecision::Update(id) => {
                let idx = *self.index.get(&id).ok_or(CommitError::UnknownClient(id))?;
                merge_update(&mut self.clients[idx].client, client);
                Ok(id)
            }
        }
    }
}

/// Required fields are replaced; optional fields only when the update
/// carries a value.
fn merge_update(existing: &mut CandidateClient, update: &CandidateClient) {
    existing.name = update.name.clone();
    existing.email = update.email.clone();
    for (slot, value) in [
        (&mut existing.phone, &update.phone),
        (&mut existing.company, &update.company),
        (&mut existing.address, &update.address),
        (&mut existing.notes, &update.notes),
    ] {
        if value.is_some() {
            *slot = value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(name: &str, email: &str) -> CandidateClient {
        CandidateClient {
            name: name.to_string(),
            email: email.to_string(),
            ..CandidateClient::default()
        }
    }

    #[test]
    fn lookup_is_case_insensitive_but_keeps_plus_tags() {
        let mut known = KnownClients::new();
        let id = ClientId::new();
        known.insert(" Ada@Example.COM ", id);
        assert_eq!(known.lookup("ada@example.com"), Some(id));
        assert_eq!(known.lookup("ADA@EXAMPLE.COM"), Some(id));
        assert_eq!(known.lookup("ada+crm@example.com"), None);
    }

    #[test]
    fn update_merges_optional_fields() {
        let mut store = InMemoryClientStore::new();
        let mut first = client("Ada", "ada@example.com");
        first.phone = Some("111".to_string());
        first.notes = Some("vip".to_string());
        let id = store.commit(&first, CommitDecision::Create).unwrap();

        let mut second = client("Ada L.", "ada@example.com");
        second.phone = Some("222".to_string());
        assert_eq!(store.commit(&second, CommitDecision::Update(id)), Ok(id));

        let stored = store.get(id).unwrap();
        assert_eq!(stored.client.name, "Ada L.");
        assert_eq!(stored.client.phone.as_deref(), Some("222"));
        assert_eq!(stored.client.notes.as_deref(), Some("vip"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn updating_an_unknown_id_fails() {
        let mut store = InMemoryClientStore::new();
        let ghost = ClientId::new();
        let err = store
            .commit(&client("Ada", "ada@example.com"), CommitDecision::Update(ghost))
            .unwrap_err();
        assert_eq!(err, CommitError::UnknownClient(ghost));
    }

    #[test]
    fn seeded_store_preserves_snapshot_ids() {
        let mut known = KnownClients::new();
        let id = ClientId::new();
        known.insert("bob@example.com", id);
        let store = InMemoryClientStore::from_known(&known);
        assert_eq!(store.get(id).unwrap().client.email, "bob@example.com");
    }
}
