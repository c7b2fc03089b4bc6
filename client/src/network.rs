use log::{debug, info};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{lookup_host, TcpStream};

/// Which side of the relay finished first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// Local input reached end of file
    InputClosed,
    /// The server closed the connection
    ServerClosed,
}

/// Copies `reader` to `writer` one line at a time, flushing after each line
///
/// A final line without a terminator gets one. Returns the number of lines
/// relayed once `reader` is exhausted.
pub async fn relay_lines<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(lines);
        }
        if buf.last() != Some(&b'\n') {
            buf.push(b'\n');
        }
        writer.write_all(&buf).await?;
        writer.flush().await?;
        lines += 1;
    }
}

/// Line relay between a terminal and a game server
pub struct Client {
    stream: TcpStream,
}

impl Client {
    /// Connects to the first IPv4 address `host` resolves to
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let addr = lookup_host((host, port))
            .await?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("{} has no IPv4 address", host),
                )
            })?;

        let stream = TcpStream::connect(addr).await?;
        info!("Connected to {}", addr);
        Ok(Client { stream })
    }

    /// Relays `input` to the server and the server to `output` until either
    /// side closes
    pub async fn run<I, O>(self, input: I, output: O) -> io::Result<RelayEnd>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (server_read, mut server_write) = self.stream.into_split();
        let mut input = BufReader::new(input);
        let mut server_read = BufReader::new(server_read);
        let mut output = output;

        tokio::select! {
            result = relay_lines(&mut input, &mut server_write) => {
                let lines = result?;
                debug!("Input closed after {} lines", lines);
                Ok(RelayEnd::InputClosed)
            }
            result = relay_lines(&mut server_read, &mut output) => {
                let lines = result?;
                debug!("Server closed after {} lines", lines);
                Ok(RelayEnd::ServerClosed)
            }
        }
    }
}
