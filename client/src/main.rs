use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use wordle_client::network::Client;

const EXIT_OK: u8 = 0;
const EXIT_BAD_USAGE: u8 = 1;
const EXIT_CONNECTION_FAIL: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "wordle-client", author, version, about, long_about = None)]
struct Args {
    /// Server host to connect to
    hostname: String,

    /// Server port
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(EXIT_BAD_USAGE);
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_OK);
        }
    };

    let client = match Client::connect(&args.hostname, args.port).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!(
                "wordle-client: unable to connect to {} port {}",
                args.hostname, args.port
            );
            error!("Connection failed: {}", e);
            return ExitCode::from(EXIT_CONNECTION_FAIL);
        }
    };

    match client.run(tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(end) => {
            info!("Relay finished: {:?}", end);
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            error!("Relay failed: {}", e);
            ExitCode::from(EXIT_CONNECTION_FAIL)
        }
    }
}
