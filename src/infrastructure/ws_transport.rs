// WebSocket transport for the monitoring middleware's observation stream
use crate::application::error::{Result, VitalsError};
use crate::application::transport::{ObservationConnection, ObservationTransport};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

#[derive(Debug, Clone, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObservationTransport for WsTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn ObservationConnection>> {
        let (stream, response) = connect_async(url).await.map_err(VitalsError::transport)?;
        tracing::debug!("WebSocket handshake with {} returned {}", url, response.status());
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl ObservationConnection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Observation stream closed by peer: {:?}", frame);
                    return None;
                }
                // Pings are answered by tungstenite itself; binary frames carry nothing we decode.
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(e) => return Some(Err(VitalsError::transport(e))),
            }
        }
        None
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::Text(text.to_string()))
            .await
            .map_err(VitalsError::transport)
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(VitalsError::transport(e)),
        }
    }
}
