//! Server configuration assembled from the command line.

use crate::error::StartupError;
use crate::words::{WordList, WordRepository};
use std::io;
use std::path::{Path, PathBuf};
use wordle_shared::{parse_int, DEFAULT_ANSWERS_PATH, DEFAULT_GUESSES_PATH};

/// Pending-connection queue length passed to `listen`.
pub const DEFAULT_BACKLOG: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to listen on. `None` listens on all interfaces.
    pub host: Option<String>,
    /// Port to listen on, as given. "0" picks an ephemeral port.
    pub port: String,
    pub answers_path: PathBuf,
    pub guesses_path: PathBuf,
    pub backlog: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: "0".to_string(),
            answers_path: PathBuf::from(DEFAULT_ANSWERS_PATH),
            guesses_path: PathBuf::from(DEFAULT_GUESSES_PATH),
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl ServerConfig {
    /// Host as shown to the operator.
    pub fn display_host(&self) -> &str {
        self.host.as_deref().unwrap_or("ALL")
    }

    /// Numeric listen port.
    ///
    /// Ports outside `0..=65535` or not in decimal fail the same way an
    /// unresolvable host does.
    pub fn port_number(&self) -> Result<u16, StartupError> {
        self.port.parse().map_err(|_| StartupError::Resolve {
            host: self.display_host().to_string(),
            port: self.port.clone(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid port {}", self.port),
            ),
        })
    }

    /// Loads both word lists, answers first.
    pub fn load_words(&self) -> Result<WordRepository, StartupError> {
        let answers = load_list(&self.answers_path)?;
        let guesses = load_list(&self.guesses_path)?;
        Ok(WordRepository::new(answers, guesses))
    }
}

/// Sorts the positional command-line words into `(host, port)`.
///
/// The first word that reads as an integer is the port; any other word is
/// the host. Returns `None` when there are two hosts or two ports.
pub fn split_endpoints<S: AsRef<str>>(words: &[S]) -> Option<(Option<String>, Option<String>)> {
    let mut host = None;
    let mut port = None;

    for word in words {
        let word = word.as_ref();
        if port.is_none() && parse_int(word).is_some() {
            port = Some(word.to_string());
        } else if host.is_none() {
            host = Some(word.to_string());
        } else {
            return None;
        }
    }
    Some((host, port))
}

fn load_list(path: &Path) -> Result<WordList, StartupError> {
    WordList::load(path).map_err(|source| StartupError::WordList {
        path: path.to_path_buf(),
        source,
    })
}
