//! Mock heartbeat server for integration tests.
//!
//! A real WebSocket server that:
//! - Accepts connections and counts them
//! - Records received text frames
//! - Optionally answers application-level pings with pongs echoing the
//!   ping's timestamp (the behavior the session measures latency from)

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// A mock heartbeat WebSocket server.
pub struct MockHeartbeatServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
}

impl MockHeartbeatServer {
    /// Start a server that answers pings with pongs.
    pub async fn start() -> Self {
        Self::start_with(true).await
    }

    /// Start a server; `answer_pings` controls whether pongs are sent back.
    pub async fn start_with(answer_pings: bool) -> Self {
        Self::bind("127.0.0.1:0", answer_pings).await
    }

    /// Start on a specific address. Lets a test bring the server up on a
    /// port a session is already pointed at.
    pub async fn start_on(addr: &str) -> Self {
        Self::bind(addr, true).await
    }

    async fn bind(addr: &str, answer_pings: bool) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let messages = messages_clone.clone();
                        let connections = connections_clone.clone();
                        tokio::spawn(handle_connection(
                            stream,
                            messages,
                            connections,
                            answer_pings,
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            messages,
            connections,
        }
    }

    /// The server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of connections accepted so far.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// All received text frames, in order.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Shut the server down.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    answer_pings: bool,
) {
    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                {
                    let mut msgs = messages.lock().await;
                    msgs.push_back(text.clone());
                }

                if !answer_pings {
                    continue;
                }

                // Echo the ping's timestamp back in a pong, like the real
                // gateway does.
                if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&text) {
                    if parsed.get("type") == Some(&serde_json::json!("ping")) {
                        let pong = serde_json::json!({
                            "type": "pong",
                            "userId": parsed.get("userId").cloned().unwrap_or_default(),
                            "timestamp": parsed.get("timestamp").cloned().unwrap_or_default(),
                            "sessionId": parsed.get("sessionId").cloned().unwrap_or_default(),
                            "responseTime": 1,
                        });
                        let _ = write.send(Message::Text(pong.to_string())).await;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockHeartbeatServer::start().await;
        assert!(server.url().starts_with("ws://127.0.0.1:"));
        server.shutdown().await;
    }
}
