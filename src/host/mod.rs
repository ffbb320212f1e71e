//! Filesystem-backed execution environment for the ledger.
//!
//! The core assumes a sequential host that authenticates callers and makes
//! every call all-or-nothing. For the CLI that host is a JSON state file:
//! one invocation loads the ledger, applies a single call, and rewrites the
//! file only if the call succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ledger::{TokenCall, TokenLedger};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no ledger state at {0}, run `gcn create` first")]
    MissingState(PathBuf),
    #[error("ledger state already exists at {0}")]
    AlreadyInitialized(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),
}

/// Handle on the persisted ledger state.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<TokenLedger, HostError> {
        if !self.path.exists() {
            return Err(HostError::MissingState(self.path.clone()));
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn store(&self, ledger: &TokenLedger) -> Result<(), HostError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(ledger)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Apply one call and persist the outcome.
    ///
    /// A rejected call propagates its error without touching the file, so
    /// the on-disk state only ever reflects committed transitions.
    pub fn commit(&self, call: &TokenCall) -> Result<TokenLedger, HostError> {
        let mut ledger = self.load()?;
        ledger.apply(call)?;
        self.store(&ledger)?;
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, ADDRESS_LEN};

    fn addr(tag: u8) -> Address {
        Address::from_bytes([tag; ADDRESS_LEN])
    }

    fn seeded_state(dir: &Path) -> StateFile {
        let state = StateFile::new(dir.join("ledger.json"));
        let ledger = TokenLedger::new("GreaseCoin", "GCN", 18, 1_000, addr(1));
        state.store(&ledger).unwrap();
        state
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path());
        let loaded = state.load().unwrap();
        assert_eq!(loaded.total_supply(), 1_000);
        assert_eq!(loaded.balance_of(addr(1)), 1_000);
    }

    #[test]
    fn load_without_state_reports_missing() {
        let state = StateFile::new("/nonexistent/ledger.json");
        assert!(matches!(
            state.load().unwrap_err(),
            HostError::MissingState(_)
        ));
    }

    #[test]
    fn commit_persists_successful_calls() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path());
        state
            .commit(&TokenCall::Transfer {
                caller: addr(1),
                to: addr(2),
                amount: 250,
            })
            .unwrap();
        let reloaded = state.load().unwrap();
        assert_eq!(reloaded.balance_of(addr(2)), 250);
        assert_eq!(reloaded.events().len(), 1);
    }

    #[test]
    fn rejected_commit_leaves_the_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let state = seeded_state(dir.path());
        let before = state.load().unwrap();
        let err = state
            .commit(&TokenCall::Transfer {
                caller: addr(2),
                to: addr(3),
                amount: 50,
            })
            .unwrap_err();
        assert!(matches!(err, HostError::Ledger(_)));
        assert_eq!(state.load().unwrap(), before);
    }
}
