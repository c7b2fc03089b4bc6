use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use wordle_server::config::{split_endpoints, ServerConfig, DEFAULT_BACKLOG};
use wordle_server::error::{StartupError, EXIT_BAD_USAGE, EXIT_OK};
use wordle_server::network::Server;
use wordle_server::stats::{self, StatsRegistry};
use wordle_shared::{DEFAULT_ANSWERS_PATH, DEFAULT_GUESSES_PATH};

/// Multiplayer Wordle over a line-oriented TCP protocol
#[derive(Parser, Debug)]
#[command(name = "wordle-server", author, version, about, long_about = None)]
struct Args {
    /// File of possible answers, one word per line
    #[arg(long, default_value = DEFAULT_ANSWERS_PATH)]
    answers: PathBuf,

    /// File of accepted guesses, one word per line
    #[arg(long, default_value = DEFAULT_GUESSES_PATH)]
    guesses: PathBuf,

    /// Host and/or port to listen on, in either order. The first number
    /// given is the port (0, the default, picks an ephemeral port); a name
    /// is the host (all interfaces if omitted)
    #[arg(value_name = "HOSTNAME|PORT", num_args = 0..=2)]
    endpoints: Vec<String>,

    /// Length of the pending-connection queue
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    backlog: u32,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, clap::Error> {
        let (host, port) = split_endpoints(&self.endpoints).ok_or_else(|| {
            Args::command().error(
                ErrorKind::TooManyValues,
                "expected at most one hostname and one port",
            )
        })?;

        let defaults = ServerConfig::default();
        Ok(ServerConfig {
            host,
            port: port.unwrap_or(defaults.port),
            answers_path: self.answers,
            guesses_path: self.guesses,
            backlog: self.backlog,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config = match Args::try_parse().and_then(Args::into_config) {
        Ok(config) => config,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(EXIT_BAD_USAGE);
        }
        Err(e) => {
            // --help and --version
            let _ = e.print();
            return ExitCode::from(EXIT_OK);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => {
            eprintln!("wordle-server: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Loads the word lists, binds, and serves until Ctrl+C.
///
/// The SIGHUP reporter is installed before anything else so an early hangup
/// never terminates the process.
async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let stats = Arc::new(StatsRegistry::new());
    spawn_stats_reporter(Arc::clone(&stats));

    let words = Arc::new(config.load_words()?);

    let server = Server::from_config(&config, words, Arc::clone(&stats)).await?;
    match server.local_addr() {
        Ok(addr) => eprintln!("Listening on {} port {}", config.display_host(), addr.port()),
        Err(e) => error!("Unable to read bound address: {}", e),
    }

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

#[cfg(unix)]
fn spawn_stats_reporter(stats: Arc<StatsRegistry>) {
    match stats::hangup_trigger() {
        Ok(trigger) => {
            tokio::task::spawn_blocking(move || {
                stats::run_reporter(stats, trigger, std::io::stderr())
            });
            info!("Send SIGHUP to print server statistics");
        }
        Err(e) => error!("Failed to install SIGHUP handler: {}", e),
    }
}

#[cfg(not(unix))]
fn spawn_stats_reporter(_stats: Arc<StatsRegistry>) {
    info!("Statistics reporting is only available on unix");
}
