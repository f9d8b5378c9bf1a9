//! Identity echo backend
//!
//! The app pushed behind a TCP route during acceptance runs. Every chunk it
//! reads is answered with `<server_id>:<chunk>`, which lets a probe confirm
//! which instance handled its connection.

use crate::{
    error::Result,
    logging::Logger,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;

const READ_BUFFER_SIZE: usize = 4096;

/// Pause after a failed accept; errors like EMFILE persist until a socket frees up
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// TCP server echoing each read prefixed with its identity
pub struct IdentityEchoServer {
    listener: TcpListener,
    server_id: Arc<str>,
    logger: Logger,
}

impl IdentityEchoServer {
    /// Bind the listener; nothing is accepted until `run`
    pub async fn bind(addr: impl ToSocketAddrs, server_id: impl Into<String>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let server_id: String = server_id.into();
        Ok(Self {
            listener,
            server_id: Arc::from(server_id),
            logger: Logger::new("RECEIVER".to_string()),
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        self.logger.info(&format!("Listening as '{}'", self.server_id))
            .field("address", self.local_addr()?.to_string())
            .log()
            .await;

        let listener = &self.listener;
        loop {
            let (stream, peer) = accept_with_retry(move || listener.accept(), &self.logger).await;

            let server_id = Arc::clone(&self.server_id);
            let logger = self.logger.clone();
            tokio::spawn(async move {
                logger.debug(&format!("Connection from {}", peer)).log().await;
                if let Err(e) = handle_connection(stream, &server_id).await {
                    logger.warn(&format!("Connection from {} ended with error: {}", peer, e))
                        .field("peer", peer.to_string())
                        .log()
                        .await;
                }
            });
        }
    }

    /// Run on a background task
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}

/// Call `accept` until it succeeds, sleeping between failures
async fn accept_with_retry<F, Fut, T>(mut accept: F, logger: &Logger) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                logger.warn(&format!("Accept failed: {}", e))
                    .field("retry_in_ms", ACCEPT_RETRY_DELAY.as_millis() as u64)
                    .log()
                    .await;
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, server_id: &str) -> io::Result<()> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let prefix_len = server_id.len() + 1;

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }

        let mut reply = Vec::with_capacity(prefix_len + n);
        reply.extend_from_slice(server_id.as_bytes());
        reply.push(b':');
        reply.extend_from_slice(&buf[..n]);
        stream.write_all(&reply).await?;
    }
}
