#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use client_import::store::{ClientId, KnownClients};
use tempfile::{TempDir, tempdir};

pub const CLIENTS_CSV: &str = "\
Full Name,Client Email,Cell,Company Name,Street Address,Notes
Ada Lovelace,ada@example.com,555-0100,Analytical Engines,12 St James Sq,first programmer
Grace Hopper,grace@example.com,555-0101,US Navy,,
Alan Turing,alan@example.com,,Bletchley Park,Hut 8,
";

/// Snapshot where every email in `emails` already belongs to a client.
pub fn known_clients(emails: &[&str]) -> KnownClients {
    let mut known = KnownClients::new();
    for email in emails {
        known.insert(email, ClientId::new());
    }
    known
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
