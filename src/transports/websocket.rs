//! WebSocket transport built on `tokio-tungstenite`.
//!
//! [`WebSocketTransport`] carries one JSON room message per text frame.
//! `ws://` and `wss://` are both supported; a backend address given as
//! `http://` or `https://` is mapped onto the matching WebSocket scheme.
//!
//! The server must speak plain `{"type","data"}` text frames. A room server
//! that only speaks socket.io (engine.io packet framing, event arrays) is not
//! reachable through this transport even at the mapped URL; put a socket.io
//! bridge behind your own [`Transport`] and hand it to
//! [`ConnectionManager::connect_with`](crate::connection::ConnectionManager::connect_with).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), undercover_client::UndercoverError> {
//! use undercover_client::{Transport, WebSocketTransport};
//!
//! let mut transport = WebSocketTransport::connect("http://localhost:3000/ws").await?;
//! if let Some(Ok(frame)) = transport.recv().await {
//!     println!("server said: {frame}");
//! }
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::UndercoverError;
use crate::transport::Transport;

/// The underlying stream type, exposed for [`WebSocketTransport::from_stream`].
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A [`Transport`] over a WebSocket connection.
///
/// [`recv`](Transport::recv) is cancel-safe: a dropped `recv` future loses no
/// frame.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

/// Map `http(s)://` backend addresses to `ws(s)://`; leave anything else as is.
///
/// Only the scheme changes. The path must still point at an endpoint that
/// serves plain JSON text frames (see the module docs).
pub fn websocket_url(url: &str) -> Cow<'_, str> {
    if let Some(rest) = url.strip_prefix("http://") {
        Cow::Owned(format!("ws://{rest}"))
    } else if let Some(rest) = url.strip_prefix("https://") {
        Cow::Owned(format!("wss://{rest}"))
    } else {
        Cow::Borrowed(url)
    }
}

impl WebSocketTransport {
    /// Connect to the room server at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::Io`] if the URL is invalid or the
    /// connection cannot be established. I/O error kinds are preserved;
    /// handshake and URL errors map to [`ErrorKind::Other`](std::io::ErrorKind::Other).
    pub async fn connect(url: &str) -> Result<Self, UndercoverError> {
        let url = websocket_url(url);
        tracing::debug!(url = %url, "connecting to room server");

        let (stream, _response) = tokio_tungstenite::connect_async(&*url)
            .await
            .map_err(|e| {
                let kind = match &e {
                    tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
                    _ => std::io::ErrorKind::Other,
                };
                UndercoverError::Io(std::io::Error::new(kind, e))
            })?;

        tracing::info!(url = %url, "room server connection established");
        Ok(Self::from_stream(stream))
    }

    /// Like [`connect`](Self::connect), but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::Timeout`] when the deadline passes, or any
    /// error [`connect`](Self::connect) returns.
    pub async fn connect_with_timeout(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, UndercoverError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| UndercoverError::Timeout)?
    }

    /// Wrap a stream set up elsewhere (custom TLS, proxies, extra headers).
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), UndercoverError> {
        if self.closed {
            return Err(UndercoverError::TransportClosed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| UndercoverError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, UndercoverError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "room server sent close frame");
                    return None;
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!("ignoring binary frame; room messages are text");
                }
                // Pings are answered by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(UndercoverError::TransportReceive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), UndercoverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| UndercoverError::TransportSend(e.to_string()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Serve one WebSocket connection with `handler`; returns its URL.
    async fn start_mock_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}")
    }

    #[test]
    fn http_urls_map_to_websocket_schemes() {
        assert_eq!(websocket_url("http://localhost:3000"), "ws://localhost:3000");
        assert_eq!(websocket_url("https://game.example/ws"), "wss://game.example/ws");
        assert_eq!(websocket_url("ws://localhost:3000/ws"), "ws://localhost:3000/ws");
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let err = WebSocketTransport::connect("not-a-valid-url").await.unwrap_err();
        assert!(matches!(err, UndercoverError::Io(_)));
    }

    #[tokio::test]
    async fn connect_with_timeout_times_out() {
        // TEST-NET-1 is non-routable, so the connect never completes.
        let err = WebSocketTransport::connect_with_timeout(
            "ws://192.0.2.1:1",
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UndercoverError::Timeout));
    }

    #[tokio::test]
    async fn recv_yields_room_frames_in_order() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Text(r#"{"type":"connected","data":{"id":"s1"}}"#.into()))
                .await
                .unwrap();
            ws.send(Message::Binary(vec![1, 2, 3].into())).await.unwrap();
            ws.send(Message::Text(r#"{"type":"votes","data":null}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let first = transport.recv().await.unwrap().unwrap();
        assert!(first.contains("connected"));
        let second = transport.recv().await.unwrap().unwrap();
        assert!(second.contains("votes"));
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_reaches_server() {
        let (tx, rx) = tokio::sync::oneshot::channel::<String>();
        let url = start_mock_server(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let _ = tx.send(text.to_string());
            }
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport
            .send(r#"{"type":"leaveRoom"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), r#"{"type":"leaveRoom"}"#);
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_is_idempotent_and_blocks_sends() {
        let url =
            start_mock_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("late".to_string()).await.unwrap_err();
        assert!(matches!(err, UndercoverError::TransportClosed));
    }
}
