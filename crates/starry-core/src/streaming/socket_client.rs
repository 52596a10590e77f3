use futures::StreamExt;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::{FeedEvent, FeedSignal};
use crate::config::Credential;
use crate::constants::{LOGS_SOCKET_PATH, SESSION_COOKIE_NAME};
use crate::error::ConsoleError;
use crate::events::ConsoleEvent;

/// Push channel URL for an API base: `http -> ws`, `https -> wss`, path
/// `/ws/logs`, bearer token as `?token=`.
pub fn feed_url(base: &Url, credential: Option<&Credential>) -> Result<Url, ConsoleError> {
    let mut url = base
        .join(LOGS_SOCKET_PATH.trim_start_matches('/'))
        .map_err(|e| ConsoleError::Transport {
            message: format!("invalid feed url: {}", e),
        })?;

    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme).map_err(|_| ConsoleError::Transport {
        message: format!("cannot use {} for {}", scheme, base),
    })?;

    if let Some(Credential::Bearer(token)) = credential {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

/// Client for one live log socket.
///
/// Reads until the server closes the socket or it fails, forwarding every
/// text frame. It never reconnects and never sends frames.
pub struct LogSocketClient {
    url: Url,
    cookie: Option<String>,
    generation: u64,
}

impl LogSocketClient {
    pub fn new(
        base: &Url,
        credential: Option<&Credential>,
        generation: u64,
    ) -> Result<Self, ConsoleError> {
        let cookie = match credential {
            Some(Credential::SessionCookie(value)) => Some(value.clone()),
            _ => None,
        };
        Ok(Self {
            url: feed_url(base, credential)?,
            cookie,
            generation,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn handshake_request(&self) -> Result<Request, ConsoleError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ConsoleError::Transport {
                message: e.to_string(),
            })?;
        if let Some(cookie) = &self.cookie {
            let value = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE_NAME, cookie))
                .map_err(|e| ConsoleError::validation(format!("session cookie: {}", e)))?;
            request.headers_mut().insert(COOKIE, value);
        }
        Ok(request)
    }

    /// Run the socket, reporting through `events_tx` until it closes
    pub async fn run(self, events_tx: mpsc::UnboundedSender<ConsoleEvent>) {
        let generation = self.generation;
        let send = |event: FeedEvent| {
            events_tx
                .send(ConsoleEvent::Feed(FeedSignal { generation, event }))
                .is_ok()
        };

        let request = match self.handshake_request() {
            Ok(request) => request,
            Err(e) => {
                send(FeedEvent::Error(e.to_string()));
                return;
            }
        };

        let (mut ws, _response) = match tokio_tungstenite::connect_async(request).await {
            Ok(value) => value,
            Err(e) => {
                send(FeedEvent::Error(e.to_string()));
                return;
            }
        };

        if !send(FeedEvent::Opened) {
            return;
        }

        loop {
            match ws.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    if !send(FeedEvent::Message(text)) {
                        tracing::debug!("feed receiver dropped");
                        break;
                    }
                }
                Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        if !send(FeedEvent::Message(text)) {
                            break;
                        }
                    }
                    Err(_) => tracing::debug!("ignoring non-utf8 frame"),
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    send(FeedEvent::Closed);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    send(FeedEvent::Error(e.to_string()));
                    break;
                }
            }
        }
    }
}
