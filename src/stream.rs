// ABOUTME: WebSocket transport for the document sync stream
// ABOUTME: Yields binary frames in arrival order, treats close as end of stream

use crate::replication::FrameSource;
use crate::{Error, Result};
use log::debug;
use std::net::TcpStream;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        SyncConfig {
            base_url: base_url.into(),
        }
    }

    pub fn document_url(&self, doc_id: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/documents/{}/", base, doc_id)
    }
}

pub struct WsSource {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl WsSource {
    pub fn connect(config: &SyncConfig, token: &str, doc_id: &str) -> Result<Self> {
        let url = config.document_url(doc_id);
        let mut request = url.as_str().into_client_request()?;
        let auth = HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|_| Error::Auth("token contains invalid header characters".into()))?;
        request.headers_mut().insert("Authorization", auth);

        let (socket, response) = tungstenite::connect(request)?;
        debug!("connected to {} ({})", url, response.status());
        Ok(WsSource { socket })
    }
}

impl FrameSource for WsSource {
    fn recv_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.socket.read() {
                Ok(Message::Binary(bytes)) => return Ok(Some(bytes)),
                Ok(Message::Close(_)) => return Ok(None),
                Ok(Message::Text(text)) => {
                    return Err(Error::Replication(format!(
                        "unexpected text message on sync stream ({} bytes)",
                        text.len()
                    )))
                }
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
