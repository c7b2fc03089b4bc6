//! # Wordle Client Library
//!
//! A terminal relay for the Wordle server. The client has no knowledge of
//! the game protocol: it forwards each line typed on stdin to the server and
//! each line the server sends to stdout, flushing after every line so prompts
//! appear as soon as they arrive.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - Host resolution and connection establishment
//! - Line-by-line relaying in both directions
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use wordle_client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1", 4000).await?;
//!     client.run(tokio::io::stdin(), tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod network;
