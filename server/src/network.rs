//! Server network layer accepting TCP connections and dispatching sessions

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::session::{self, SessionEnd};
use crate::stats::StatsRegistry;
use crate::words::WordRepository;
use log::{error, info, warn};
use std::io::{self, Write};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};

/// Written to a connection that is accepted but cannot be served.
pub const FATAL_ERROR_MESSAGE: &str = "A fatal server error occured :(. Try again later\n";

/// Pause after a failed `accept` before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Resolves the address to listen on
///
/// No host means every IPv4 interface. Otherwise the first IPv4 address the
/// host resolves to is used.
pub async fn resolve_listen_addr(host: Option<&str>, port: u16) -> io::Result<SocketAddr> {
    let Some(host) = host else {
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    };

    lookup_host((host, port))
        .await?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{} has no IPv4 address", host),
            )
        })
}

/// Accept loop handing every connection to its own session task
pub struct Server {
    listener: TcpListener,
    words: Arc<WordRepository>,
    stats: Arc<StatsRegistry>,
}

impl Server {
    pub fn new(listener: TcpListener, words: Arc<WordRepository>, stats: Arc<StatsRegistry>) -> Self {
        Server {
            listener,
            words,
            stats,
        }
    }

    /// Binds and listens on `addr` with address reuse and the given backlog
    pub async fn bind(
        addr: SocketAddr,
        backlog: u32,
        words: Arc<WordRepository>,
        stats: Arc<StatsRegistry>,
    ) -> io::Result<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(backlog)?;

        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self::new(listener, words, stats))
    }

    /// Resolves and binds the address named by `config`
    pub async fn from_config(
        config: &ServerConfig,
        words: Arc<WordRepository>,
        stats: Arc<StatsRegistry>,
    ) -> Result<Self, StartupError> {
        let host = config.display_host().to_string();
        let port = config.port_number()?;
        let addr = resolve_listen_addr(config.host.as_deref(), port)
            .await
            .map_err(|source| StartupError::Resolve {
                host: host.clone(),
                port: config.port.clone(),
                source,
            })?;

        Self::bind(addr, config.backlog, words, stats)
            .await
            .map_err(|source| StartupError::Listen {
                host,
                port: config.port.clone(),
                source,
            })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever
    ///
    /// Each connection gets a detached task; the loop never waits on one.
    /// Accept errors are logged and never end the loop.
    pub async fn run(self) {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.dispatch(stream, addr),
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    /// Prepares a freshly accepted stream and spawns its session
    fn dispatch(&self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            error!("Failed to set up connection from {}: {}", addr, e);
            reject_connection(stream);
            return;
        }

        let words = Arc::clone(&self.words);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            serve_connection(stream, addr, words, stats).await;
        });
    }
}

/// Runs one session over an accepted TCP stream
pub async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    words: Arc<WordRepository>,
    stats: Arc<StatsRegistry>,
) -> SessionEnd {
    info!("Client connected from {}", addr);
    let (reader, writer) = stream.into_split();
    let end = session::serve(reader, writer, words, stats, addr.to_string()).await;

    match end {
        SessionEnd::Exited => info!("Client {} exited", addr),
        SessionEnd::Disconnected => info!("Client {} disconnected", addr),
    }
    end
}

/// Best-effort fatal notice to a connection that cannot be served
///
/// Never blocks the accept loop: the socket is handed back to std in
/// non-blocking mode, written once, and closed by dropping it.
pub fn reject_connection(stream: TcpStream) {
    let result = stream
        .into_std()
        .and_then(|mut stream| stream.write(FATAL_ERROR_MESSAGE.as_bytes()));

    if let Err(e) = result {
        warn!("Failed to notify rejected connection: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::WordList;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::time::timeout;

    fn test_words() -> Arc<WordRepository> {
        Arc::new(WordRepository::new(
            WordList::from_words(["trace"]),
            WordList::from_words(["trace", "crane"]),
        ))
    }

    async fn start_server() -> (SocketAddr, Arc<StatsRegistry>, tokio::task::JoinHandle<()>) {
        let stats = Arc::new(StatsRegistry::new());
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let server = Server::bind(addr, 16, test_words(), Arc::clone(&stats))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());
        (addr, stats, handle)
    }

    #[tokio::test]
    async fn test_resolve_listen_addr_defaults_to_all_interfaces() {
        let addr = resolve_listen_addr(None, 0).await.unwrap();
        assert_eq!(addr, SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));
    }

    #[tokio::test]
    async fn test_resolve_listen_addr_localhost() {
        let addr = resolve_listen_addr(Some("127.0.0.1"), 4321).await.unwrap();
        assert_eq!(addr, SocketAddr::from((Ipv4Addr::LOCALHOST, 4321)));
    }

    #[tokio::test]
    async fn test_bind_reports_ephemeral_port() {
        let (addr, _, handle) = start_server().await;
        assert_ne!(addr.port(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_from_config_rejects_unbindable_address() {
        let config = ServerConfig {
            host: Some("192.0.2.1".to_string()),
            ..ServerConfig::default()
        };
        let result =
            Server::from_config(&config, test_words(), Arc::new(StatsRegistry::new())).await;

        match result {
            Err(e @ StartupError::Listen { .. }) => {
                assert_eq!(e.exit_code(), crate::error::EXIT_LISTEN_FAIL)
            }
            Err(other) => panic!("Unexpected error: {}", other),
            Ok(_) => panic!("Binding a foreign address should fail"),
        }
    }

    #[tokio::test]
    async fn test_accepts_concurrent_clients() {
        let (addr, stats, handle) = start_server().await;

        let first = TcpStream::connect(addr).await.unwrap();
        let mut second = BufReader::new(TcpStream::connect(addr).await.unwrap());

        // The second client is served while the first sits idle.
        let mut line = String::new();
        second.read_line(&mut line).await.unwrap();
        assert_eq!(line, "Welcome to...\n");

        second.get_mut().write_all(b"5\n").await.unwrap();
        let mut rest = String::new();
        timeout(Duration::from_secs(5), second.read_to_string(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.ends_with("Goodbye...\n"));

        drop(first);
        timeout(Duration::from_secs(5), async {
            while stats.snapshot().completed < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(stats.snapshot().connected, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_reject_connection_sends_fatal_notice() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (accepted, _) = listener.accept().await.unwrap();
        reject_connection(accepted);

        let mut received = String::new();
        timeout(Duration::from_secs(5), client.read_to_string(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, FATAL_ERROR_MESSAGE);
    }
}
