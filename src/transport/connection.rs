//! Connection pump
//!
//! A connection is used from two tasks at once: the inbound pump reads and
//! the outbound pump writes. It is therefore modelled as two halves, each
//! behind its own trait, so the client pumps can be driven by a real
//! WebSocket or by an in-memory double.

use std::future::Future;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tungstenite::protocol::Message as WsMessage;

use crate::room::Message;
use crate::utils::error::ConnectionError;

pub trait MessageReader: Send {
    /// Wait for the next message. Any error ends the connection.
    fn read(&mut self) -> impl Future<Output = Result<Message, ConnectionError>> + Send;
}

pub trait MessageWriter: Send {
    /// Write one message. Any error ends the connection.
    fn write(&mut self, message: Message)
    -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Release the connection. Errors are ignored; the connection is gone either way.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

pub struct WsReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

pub struct WsWriter<S> {
    sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

/// Split an upgraded WebSocket into its read and write halves.
pub fn split<S>(ws: WebSocketStream<S>) -> (WsReader<S>, WsWriter<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, stream) = ws.split();
    (WsReader { stream }, WsWriter { sink })
}

/// Map an inbound frame to a payload.
///
/// Text and binary frames carry payloads. Control frames are answered by
/// tungstenite itself and yield `None`. A close frame ends the connection.
pub fn from_frame(frame: WsMessage) -> Result<Option<Message>, ConnectionError> {
    match frame {
        WsMessage::Text(_) | WsMessage::Binary(_) => Ok(Some(Message::from(frame.into_data()))),
        WsMessage::Close(_) => Err(ConnectionError::Closed),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => Ok(None),
    }
}

/// Map an outbound payload to a frame: text when it is valid UTF-8, binary otherwise.
pub fn to_frame(message: Message) -> WsMessage {
    match std::str::from_utf8(message.as_bytes()) {
        Ok(text) => WsMessage::text(text.to_owned()),
        Err(_) => WsMessage::binary(message.into_bytes()),
    }
}

impl<S> MessageReader for WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self) -> Result<Message, ConnectionError> {
        loop {
            match self.stream.next().await {
                Some(Ok(frame)) => {
                    if let Some(message) = from_frame(frame)? {
                        return Ok(message);
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ConnectionError::Closed),
            }
        }
    }
}

impl<S> MessageWriter for WsWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, message: Message) -> Result<(), ConnectionError> {
        self.sink.send(to_frame(message)).await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}
