//! Startup failures and the process exit codes they map to.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub const EXIT_OK: u8 = 0;
pub const EXIT_BAD_USAGE: u8 = 1;
pub const EXIT_FILE_NOT_FOUND: u8 = 2;
pub const EXIT_LISTEN_FAIL: u8 = 3;

/// Errors that abort the server before it accepts any connection.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A word list could not be opened or read.
    #[error("unable to open word list {}: {source}", path.display())]
    WordList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The listen host or port did not resolve to an IPv4 address.
    #[error("unable to listen on {host} port {port}")]
    Resolve {
        host: String,
        port: String,
        #[source]
        source: io::Error,
    },

    /// Socket creation, bind or listen failed.
    #[error("unable to listen on {host} port {port}")]
    Listen {
        host: String,
        port: String,
        #[source]
        source: io::Error,
    },
}

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::WordList { .. } => EXIT_FILE_NOT_FOUND,
            StartupError::Resolve { .. } | StartupError::Listen { .. } => EXIT_LISTEN_FAIL,
        }
    }
}
