//! # Wordle Server Library
//!
//! This library provides the server side of a multiplayer word-guessing game
//! played over a plain line-oriented TCP protocol. Every connected client gets
//! an independent, menu-driven session, while the server keeps aggregate play
//! statistics that an operator can request at any time.
//!
//! ## Core Responsibilities
//!
//! ### Session Handling
//! Each connection runs its own menu/round state machine:
//! - Welcome banner and the five-option menu
//! - Bounded, retry-until-valid prompts for word length and tries
//! - Pinning a custom answer for the next round
//! - Rounds that validate, judge and score guesses
//!
//! ### Statistics
//! A single registry counts connected and completed clients plus games won
//! and lost. A report is written to stderr whenever the process receives
//! SIGHUP.
//!
//! ## Architecture Design
//!
//! ### Task-Per-Connection
//! The accept loop runs sequentially and spawns one detached tokio task per
//! connection. Sessions share nothing mutable except the statistics registry,
//! whose lock is never held across an `.await`.
//!
//! ### Strict Request-Response
//! Within a session every prompt is flushed before the next line is read, so
//! a client can always assume a prompt is fully delivered before it answers.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Listen address, backlog and word-list paths, plus loading of the lists.
//!
//! ### Error Module (`error`)
//! Startup failures and the exit code each maps to.
//!
//! ### Game Module (`game`)
//! A single round: prompts, guess judgement and tries bookkeeping.
//!
//! ### Network Module (`network`)
//! Address resolution, bind/listen and the accept loop.
//!
//! ### Session Module (`session`)
//! The per-connection protocol state machine and line I/O.
//!
//! ### Stats Module (`stats`)
//! The shared counters and the triggered reporter.
//!
//! ### Words Module (`words`)
//! Answer and guess lists with membership and random lookup.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wordle_server::config::ServerConfig;
//! use wordle_server::network::Server;
//! use wordle_server::stats::StatsRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let words = Arc::new(config.load_words()?);
//!     let stats = Arc::new(StatsRegistry::new());
//!
//!     let server = Server::from_config(&config, words, stats).await?;
//!     println!("Listening on port {}", server.local_addr()?.port());
//!
//!     // Runs until the process is stopped.
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod session;
pub mod stats;
pub mod words;
