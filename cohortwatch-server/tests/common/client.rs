//! WebSocket test client for viewer protocol testing
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to WebSocket endpoint
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{}/ws", addr);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Send raw text message
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Close the connection
    #[allow(dead_code)]
    pub async fn close(mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }

    /// Receive raw text message
    pub async fn recv_raw(&mut self) -> String {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("WebSocket error: {}", e),
                None => panic!("WebSocket closed"),
            }
        }
    }

    /// Receive and deserialize JSON message
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> T {
        let text = tokio::time::timeout(Duration::from_secs(2), self.recv_raw())
            .await
            .expect("Timed out waiting for message");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Receive with timeout, returns None if timeout
    #[allow(dead_code)]
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        tokio::time::timeout(duration, self.recv_raw()).await.ok()
    }
}

/// High-level viewer client with helper methods
pub struct TestViewer {
    pub conn: WsConnection,
}

impl TestViewer {
    /// Connect and consume the greeting, returning the announced cohort
    #[allow(dead_code)]
    pub async fn connect(addr: SocketAddr) -> (Self, Option<String>) {
        let mut conn = WsConnection::connect(addr).await;

        let greeting: serde_json::Value = conn.recv_json().await;
        assert_eq!(
            greeting["type"], "cohort",
            "Expected cohort message on connect"
        );
        let cohort = greeting["cohort"].as_str().map(str::to_string);

        (Self { conn }, cohort)
    }

    /// Receive next message
    #[allow(dead_code)]
    pub async fn recv(&mut self) -> serde_json::Value {
        self.conn.recv_json().await
    }

    /// Receive the next message and assert it announces `cohort`
    #[allow(dead_code)]
    pub async fn expect_cohort(&mut self, cohort: Option<&str>) {
        let msg = self.recv().await;
        assert_eq!(msg["type"], "cohort", "Expected cohort but got: {}", msg);
        assert_eq!(msg["cohort"].as_str(), cohort);
    }

    /// Receive the next message and assert it is an event, returning its payload
    #[allow(dead_code)]
    pub async fn expect_event(&mut self, cohort: &str) -> serde_json::Value {
        let msg = self.recv().await;
        assert_eq!(msg["type"], "event", "Expected event but got: {}", msg);
        assert_eq!(msg["cohort"], cohort);
        msg["event"].clone()
    }

    /// Assert no message received within duration
    #[allow(dead_code)]
    pub async fn expect_no_message(&mut self, duration: Duration) {
        assert!(
            self.conn.recv_timeout(duration).await.is_none(),
            "Expected no message but received one"
        );
    }
}
