use crate::common::{SessionError, SessionResult};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Listening endpoint for the planner. One planner, one session.
pub struct PlannerListener {
    listener: TcpListener,
}

impl PlannerListener {
    pub async fn bind(address: &str) -> SessionResult<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| SessionError::Connection(format!("bind {}: {}", address, e)))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> SessionResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| SessionError::Connection(e.to_string()))
    }

    /// Waits for the planner to connect, or for `cancel`.
    pub async fn accept(&self, cancel: &CancellationToken) -> SessionResult<(TcpStream, SocketAddr)> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SessionError::Connection(
                "cancelled while awaiting planner".to_string(),
            )),
            accepted = self.listener.accept() => {
                let (stream, peer) = accepted
                    .map_err(|e| SessionError::Connection(format!("accept: {}", e)))?;
                stream
                    .set_nodelay(true)
                    .map_err(|e| SessionError::Connection(e.to_string()))?;
                tracing::info!(%peer, "planner connected");
                Ok((stream, peer))
            }
        }
    }
}
