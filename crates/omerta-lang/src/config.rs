//! Protocol tree configuration.
//!
//! The core never reads the environment. Callers build a [`ProtocolConfig`]
//! once at the process boundary and pass it down.

use std::path::PathBuf;

use serde::Serialize;

/// Environment variable the CLI consults for the protocol directory.
pub const PROTOCOL_DIR_ENV: &str = "OMERTA_PROTOCOL_DIR";

pub const DEFAULT_PROTOCOL_DIR: &str = "./protocol";

pub const DEFAULT_PYTHON_OUTPUT: &str = "./simulations/transactions";

/// Subdirectory of the protocol directory holding one directory per
/// transaction.
pub const TRANSACTIONS_DIR: &str = "transactions";

/// Where protocol sources live and where generated code goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolConfig {
    /// Root holding `transactions/<name>/transaction.omt`.
    pub protocol_dir: PathBuf,
    /// Destination for generated Python modules.
    pub python_output: PathBuf,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            protocol_dir: PathBuf::from(DEFAULT_PROTOCOL_DIR),
            python_output: PathBuf::from(DEFAULT_PYTHON_OUTPUT),
        }
    }
}

impl ProtocolConfig {
    pub fn new(protocol_dir: impl Into<PathBuf>) -> Self {
        Self {
            protocol_dir: protocol_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_python_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.python_output = dir.into();
        self
    }

    /// `<protocol_dir>/transactions`
    pub fn transactions_dir(&self) -> PathBuf {
        self.protocol_dir.join(TRANSACTIONS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.protocol_dir, PathBuf::from("./protocol"));
        assert_eq!(config.python_output, PathBuf::from("./simulations/transactions"));
    }

    #[test]
    fn builder_overrides() {
        let config = ProtocolConfig::new("/srv/proto").with_python_output("/tmp/out");
        assert_eq!(config.transactions_dir(), PathBuf::from("/srv/proto/transactions"));
        assert_eq!(config.python_output, PathBuf::from("/tmp/out"));
    }
}
