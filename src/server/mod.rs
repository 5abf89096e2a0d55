//! Read-only dashboard server.
//!
//! Each connection is handled on its own task; handlers compute against a
//! snapshot of the shared [`SurveyStore`](crate::survey::SurveyStore), so a
//! reload never blocks readers already in flight.

pub mod http;
pub mod routes;

pub use routes::AppState;

use anyhow::{Context, Result};
use http::{read_request, Method, Response};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

pub struct DashboardServer {
    bind: String,
    request_timeout_ms: u64,
    state: Arc<AppState>,
}

impl DashboardServer {
    pub fn new(bind: String, request_timeout_ms: u64, state: AppState) -> Self {
        Self {
            bind,
            request_timeout_ms,
            state: Arc::new(state),
        }
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind)
            .await
            .with_context(|| format!("failed to bind {}", self.bind))?;
        info!("dashboard listening on http://{}", listener.local_addr()?);
        self.serve(listener).await
    }

    async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let state = self.state.clone();
            let timeout_ms = self.request_timeout_ms;
            tokio::spawn(async move {
                if let Err(error) = handle_connection(stream, state, timeout_ms).await {
                    warn!("connection from {} closed with error: {error:#}", peer);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<AppState>,
    timeout_ms: u64,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let request = match timeout(Duration::from_millis(timeout_ms), read_request(&mut reader)).await
    {
        Ok(Ok(request)) => request,
        Ok(Err(error)) => {
            let response = Response::error(400, &format!("{error:#}"));
            writer.write_all(&response.to_bytes()).await?;
            return Err(error);
        }
        Err(_) => {
            let response = Response::error(408, &format!("no request within {}ms", timeout_ms));
            writer.write_all(&response.to_bytes()).await?;
            return Ok(());
        }
    };

    // Aggregation and file IO are blocking work.
    let head_only = request.method == Method::Head;
    let response =
        tokio::task::spawn_blocking(move || routes::handle_request(&state, &request)).await?;

    let bytes = if head_only {
        response.into_head()
    } else {
        response.to_bytes()
    };
    writer.write_all(&bytes).await?;
    writer.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::routes::tests::fixture;
    use tokio::io::AsyncReadExt;

    async fn exchange(server: &Arc<DashboardServer>, raw: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = server.clone();
        let task = tokio::spawn(async move { running.serve(listener).await });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        task.abort();
        response
    }

    #[tokio::test]
    async fn test_serves_summary_over_tcp() {
        let f = fixture();
        let server = Arc::new(DashboardServer::new(
            "127.0.0.1:0".to_string(),
            1000,
            f.state,
        ));

        let response = exchange(&server, "GET /api/summary HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("\"total_responses\": 3"));
    }

    #[tokio::test]
    async fn test_bad_request_line() {
        let f = fixture();
        let server = Arc::new(DashboardServer::new(
            "127.0.0.1:0".to_string(),
            1000,
            f.state,
        ));

        let response = exchange(&server, "nonsense\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }
}
