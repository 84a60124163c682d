//! Event channel client for streaming turns.
//!
//! One long-lived, ordered, bidirectional WebSocket connection per run.
//! Commands go out as JSON text frames; turn events come back the same way.
//! Transport notifications (open, closed) are kept separate from protocol
//! events so consumers can match on [`weft_core::TurnEvent`] exhaustively.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use weft_core::{Command, SessionId, TurnEvent};

/// Error type for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to connect.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Failed to send a command.
    #[error("Send failed: {0}")]
    Send(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle for sending commands over the channel.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<String>,
}

impl CommandSender {
    /// Send a command frame.
    pub async fn send(&self, command: &Command) -> Result<(), ChannelError> {
        let json = serde_json::to_string(command)?;
        self.tx
            .send(json)
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    /// Submit a user turn.
    pub async fn send_turn(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<(), ChannelError> {
        self.send(&Command::SendTurn {
            text: text.to_string(),
            session_id: session_id.cloned(),
        })
        .await
    }

    /// Regenerate the last assistant turn of a session.
    pub async fn regenerate(&self, session_id: &SessionId) -> Result<(), ChannelError> {
        self.send(&Command::RegenerateTurn {
            session_id: session_id.clone(),
        })
        .await
    }

    /// Request a stop of the in-flight turn.
    pub async fn stop(&self) -> Result<(), ChannelError> {
        self.send(&Command::StopGeneration {}).await
    }

    /// Switch the active model.
    pub async fn switch_model(&self, model_id: &str) -> Result<(), ChannelError> {
        self.send(&Command::SwitchModel {
            model_id: model_id.to_string(),
        })
        .await
    }
}

/// Events from the channel connection.
#[derive(Debug)]
pub enum ChannelEvent {
    /// Connection established.
    Open,
    /// A protocol event arrived.
    Event(TurnEvent),
    /// Connection closed (server close frame or transport failure).
    Closed,
}

/// Spawn an event channel connection.
///
/// Returns a sender for outgoing commands and a receiver for incoming events.
/// The receiver yields [`ChannelEvent::Open`] once, protocol events in arrival
/// order, then [`ChannelEvent::Closed`] when the connection ends.
pub async fn connect(
    url: &str,
) -> Result<(CommandSender, mpsc::Receiver<ChannelEvent>), ChannelError> {
    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| ChannelError::Connection(e.to_string()))?;

    let (write, read) = ws_stream.split();

    // Channel for outgoing commands
    let (outgoing_tx, outgoing_rx) = mpsc::channel::<String>(32);

    // Channel for incoming events
    let (event_tx, event_rx) = mpsc::channel::<ChannelEvent>(32);

    // Spawn the writer task
    tokio::spawn(channel_writer(write, outgoing_rx));

    // Spawn the reader task
    tokio::spawn(channel_reader(read, event_tx));

    Ok((CommandSender { tx: outgoing_tx }, event_rx))
}

/// Task that writes outgoing command frames.
async fn channel_writer(
    mut write: futures::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        Message,
    >,
    mut rx: mpsc::Receiver<String>,
) {
    while let Some(text) = rx.recv().await {
        if write.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}

/// Task that reads incoming frames and forwards events.
///
/// Frames are parsed as [`TurnEvent`]. A frame that fails to parse is
/// surfaced as a protocol error event rather than dropped silently.
async fn channel_reader(
    mut read: futures::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
    tx: mpsc::Sender<ChannelEvent>,
) {
    let _ = tx.send(ChannelEvent::Open).await;

    while let Some(result) = read.next().await {
        match result {
            Ok(Message::Text(text)) => match parse_frame(&text) {
                Ok(event) => {
                    let _ = tx.send(ChannelEvent::Event(event)).await;
                }
                Err(e) => {
                    tracing::debug!(error = %e, text = %text, "Failed to parse event frame");
                    let _ = tx
                        .send(ChannelEvent::Event(TurnEvent::Error {
                            message: format!("Protocol error: {e}"),
                        }))
                        .await;
                }
            },
            Ok(Message::Close(_)) => {
                break;
            }
            // Ignore control frames and binary messages
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_) | Message::Binary(_)) => {}
            Err(e) => {
                let _ = tx
                    .send(ChannelEvent::Event(TurnEvent::Error {
                        message: e.to_string(),
                    }))
                    .await;
                break;
            }
        }
    }

    let _ = tx.send(ChannelEvent::Closed).await;
}

/// Parse one text frame as a protocol event.
fn parse_frame(text: &str) -> Result<TurnEvent, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stream_frame() {
        let event = parse_frame(r#"{"type":"stream","content":"hello"}"#).unwrap();
        match event {
            TurnEvent::Stream { content } => assert_eq!(content, "hello"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parse_stream_end_frame() {
        let event = parse_frame(r#"{"type":"stream_end","duration":2.5,"thinking":true}"#).unwrap();
        match event {
            TurnEvent::StreamEnd { duration, thinking } => {
                assert!((duration - 2.5).abs() < f64::EPSILON);
                assert!(thinking);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parse_malformed_frame_is_an_error() {
        assert!(parse_frame("not json").is_err());
        assert!(parse_frame(r#"{"type":"unknown_event"}"#).is_err());
    }

    #[tokio::test]
    async fn command_sender_encodes_send_turn() {
        let (tx, mut rx) = mpsc::channel::<String>(1);
        let sender = CommandSender { tx };

        let session = SessionId::new("abc123").unwrap();
        sender.send_turn("hello", Some(&session)).await.unwrap();

        let frame = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["type"], "send_turn");
        assert_eq!(parsed["text"], "hello");
        assert_eq!(parsed["session_id"], "abc123");
    }

    #[tokio::test]
    async fn command_sender_encodes_stop() {
        let (tx, mut rx) = mpsc::channel::<String>(1);
        let sender = CommandSender { tx };

        sender.stop().await.unwrap();

        let frame = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["type"], "stop_generation");
    }

    #[tokio::test]
    async fn command_sender_omits_absent_session() {
        let (tx, mut rx) = mpsc::channel::<String>(1);
        let sender = CommandSender { tx };

        sender.send_turn("hi", None).await.unwrap();

        let frame = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert!(parsed.get("session_id").is_none());
    }
}
