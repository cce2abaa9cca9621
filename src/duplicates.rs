//! Duplicate detection against the known-client snapshot plus every client
//! created earlier in the same batch.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::store::{ClientId, CommitDecision, KnownClients, normalize_email};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Leave the existing client untouched and skip the row.
    #[default]
    Skip,
    /// Overwrite the existing client with the row's values.
    Update,
    /// Create another client with the same email.
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Commit a new client. `duplicate_of` is set when the email was already
    /// known and the policy allows duplicates.
    Create { duplicate_of: Option<ClientId> },
    Update(ClientId),
    Skip(ClientId),
}

impl Resolution {
    pub fn commit_decision(&self) -> Option<CommitDecision> {
        match self {
            Resolution::Create { .. } => Some(CommitDecision::Create),
            Resolution::Update(id) => Some(CommitDecision::Update(*id)),
            Resolution::Skip(_) => None,
        }
    }

    /// The matched client when the row belongs in the report's duplicate
    /// list. Updates are not reported.
    pub fn reported_duplicate(&self) -> Option<ClientId> {
        match self {
            Resolution::Skip(id) => Some(*id),
            Resolution::Create { duplicate_of } => *duplicate_of,
            Resolution::Update(_) => None,
        }
    }
}

/// Borrows the snapshot read-only; clients created during the batch live in
/// a private overlay.
#[derive(Debug)]
pub struct DuplicateResolver<'a> {
    known: &'a KnownClients,
    created: HashMap<String, ClientId>,
    policy: DuplicatePolicy,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(known: &'a KnownClients, policy: DuplicatePolicy) -> Self {
        Self {
            known,
            created: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn find_existing(&self, email: &str) -> Option<ClientId> {
        self.known
            .lookup(email)
            .or_else(|| self.created.get(&normalize_email(email)).copied())
    }

    pub fn resolve(&self, email: &str) -> Resolution {
        match (self.find_existing(email), self.policy) {
            (None, _) => Resolution::Create { duplicate_of: None },
            (Some(id), DuplicatePolicy::Skip) => Resolution::Skip(id),
            (Some(id), DuplicatePolicy::Update) => Resolution::Update(id),
            (Some(id), DuplicatePolicy::Import) => Resolution::Create {
                duplicate_of: Some(id),
            },
        }
    }

    /// Makes a freshly created client visible to later rows. The first id
    /// recorded for an email is kept.
    pub fn record_created(&mut self, email: &str, id: ClientId) {
        self.created.entry(normalize_email(email)).or_insert(id);
    }
}
