// WebSocket transport over tokio-tungstenite.
// Pings are answered here; only text frames surface to the driver.

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{Connection, Transport, TransportError};

pub struct WsTransport {
    endpoint: String,
}

impl WsTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for WsTransport {
    type Conn = WsConnection;

    fn open(&mut self) -> BoxFuture<'_, Result<WsConnection, TransportError>> {
        Box::pin(async move {
            let (stream, _response) = connect_async(self.endpoint.as_str()).await?;
            Ok(WsConnection { stream })
        })
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                    Some(Ok(Message::Ping(payload))) => {
                        if let Err(err) = self.stream.send(Message::Pong(payload)).await {
                            return Some(Err(err.into()));
                        }
                    }
                    Some(Ok(Message::Close(_))) => return None,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => return None,
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let _ = self.stream.close(None).await;
        })
    }
}
