//! Locating transaction sources in a protocol tree.
//!
//! ```text
//! protocol/
//!   transactions/
//!     00_escrow_lock/transaction.omt
//!     01_settle/transaction.omt
//!     graphs/              <- never a transaction
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ProtocolConfig;
use crate::parser::TRANSACTION_FILE;

/// Directory name that holds rendered graphs, not transactions.
pub const EXCLUDED_DIR: &str = "graphs";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immediate subdirectories of `<protocol_dir>/transactions` that hold a
/// `transaction.omt`, sorted by path. `graphs` is skipped.
///
/// A missing `transactions` directory yields an empty list.
pub fn find_transaction_dirs(config: &ProtocolConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root = config.transactions_dir();
    if !root.is_dir() {
        tracing::debug!(path = %root.display(), "no transactions directory");
        return Ok(Vec::new());
    }

    let mut dirs: Vec<PathBuf> = list_dir(&root)?
        .into_iter()
        .filter(|p| p.is_dir() && !is_excluded(p) && p.join(TRANSACTION_FILE).is_file())
        .collect();
    dirs.sort();
    tracing::debug!(count = dirs.len(), "found transaction directories");
    Ok(dirs)
}

/// The transaction directory called `name`, if there is one.
pub fn find_transaction_dir(
    config: &ProtocolConfig,
    name: &str,
) -> Result<Option<PathBuf>, DiscoveryError> {
    Ok(find_transaction_dirs(config)?
        .into_iter()
        .find(|dir| dir.file_name().is_some_and(|n| n == name)))
}

/// Every `transaction.omt` below `<protocol_dir>/transactions`, at any depth,
/// sorted by path.
///
/// Walks with an explicit work list. `graphs` directories and symlinked
/// directories are not entered.
pub fn find_all_transactions(config: &ProtocolConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root = config.transactions_dir();
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let mut pending = vec![root];
    while let Some(dir) = pending.pop() {
        for path in list_dir(&dir)? {
            let Ok(meta) = path.symlink_metadata() else {
                continue;
            };
            if meta.is_dir() {
                if !is_excluded(&path) {
                    pending.push(path);
                }
            } else if path.file_name().is_some_and(|n| n == TRANSACTION_FILE) && path.is_file() {
                found.push(path);
            }
        }
    }
    found.sort();
    tracing::debug!(count = found.len(), "found transaction files");
    Ok(found)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_err = |source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        paths.push(entry.map_err(read_err)?.path());
    }
    Ok(paths)
}

fn is_excluded(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == EXCLUDED_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn protocol(dirs: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("tempdir");
        for dir in dirs {
            let path = root.path().join("transactions").join(dir);
            fs::create_dir_all(&path).expect("mkdir");
            fs::write(path.join(TRANSACTION_FILE), "transaction T {}").expect("write");
        }
        root
    }

    #[test]
    fn lists_sorted_and_skips_graphs() {
        let root = protocol(&["01_settle", "00_lock", "graphs"]);
        let config = ProtocolConfig::new(root.path());
        let dirs = find_transaction_dirs(&config).expect("discovers");
        let names: Vec<_> = dirs
            .iter()
            .filter_map(|d| d.file_name()?.to_str())
            .collect();
        assert_eq!(names, vec!["00_lock", "01_settle"]);
    }

    #[test]
    fn directories_without_source_are_ignored() {
        let root = protocol(&["00_lock"]);
        fs::create_dir_all(root.path().join("transactions/notes")).expect("mkdir");
        let config = ProtocolConfig::new(root.path());
        assert_eq!(find_transaction_dirs(&config).expect("discovers").len(), 1);
    }

    #[test]
    fn missing_transactions_dir_is_empty() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = ProtocolConfig::new(root.path());
        assert!(find_transaction_dirs(&config).expect("discovers").is_empty());
        assert!(find_all_transactions(&config).expect("discovers").is_empty());
    }

    #[test]
    fn find_by_name() {
        let root = protocol(&["00_lock", "01_settle"]);
        let config = ProtocolConfig::new(root.path());
        let found = find_transaction_dir(&config, "01_settle").expect("discovers");
        assert!(found.is_some_and(|p| p.ends_with("01_settle")));
        assert!(find_transaction_dir(&config, "settle").expect("discovers").is_none());
    }

    #[test]
    fn deep_walk_finds_nested_sources() {
        let root = protocol(&["00_lock", "10_batch/01_inner", "graphs/ignored"]);
        let config = ProtocolConfig::new(root.path());
        let files = find_all_transactions(&config).expect("discovers");
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("00_lock/transaction.omt"));
        assert!(files[1].ends_with("10_batch/01_inner/transaction.omt"));
    }
}
