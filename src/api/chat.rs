//! Live-chat relay over WebSocket.
//!
//! Every message a client sends is stamped and broadcast to all connected
//! clients, the sender included. Nothing is stored.

use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;
use super::AppState;

pub const CHAT_SUBJECT: &str = "storefront.chat";
pub const MAX_MESSAGE_CHARS: usize = 500;
const DEFAULT_SENDER: &str = "Guest";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// What clients send: either a JSON object or plain text.
#[derive(Debug, Deserialize)]
struct IncomingMessage {
    sender: Option<String>,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatParams {
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct ChatRelay {
    sender: broadcast::Sender<ChatMessage>,
    nats: Option<async_nats::Client>,
}

impl ChatRelay {
    pub fn new(capacity: usize, nats: Option<async_nats::Client>) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, nats }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> { self.sender.subscribe() }

    pub fn listeners(&self) -> usize { self.sender.receiver_count() }

    /// Parses raw client input into a stamped message. Blank input yields
    /// nothing; long input is truncated.
    pub fn stamp(raw: &str, default_sender: &str) -> Option<ChatMessage> {
        let (sender, text) = match serde_json::from_str::<IncomingMessage>(raw) {
            Ok(m) => (m.sender.unwrap_or_else(|| default_sender.to_string()), m.text),
            Err(_) => (default_sender.to_string(), raw.to_string()),
        };
        let text: String = text.trim().chars().take(MAX_MESSAGE_CHARS).collect();
        if text.is_empty() { return None; }
        let sender = sender.trim();
        let sender = if sender.is_empty() { DEFAULT_SENDER } else { sender };
        Some(ChatMessage { id: Uuid::now_v7(), sender: sender.to_string(), text, sent_at: Utc::now() })
    }

    pub async fn broadcast(&self, message: ChatMessage) {
        if let Some(nats) = &self.nats {
            match serde_json::to_vec(&message) {
                Ok(payload) => {
                    if let Err(e) = nats.publish(CHAT_SUBJECT.to_string(), payload.into()).await {
                        warn!(error = %e, "failed to mirror chat message");
                    }
                }
                Err(e) => warn!(error = %e, "failed to encode chat message"),
            }
        }
        // no listeners is fine
        let _ = self.sender.send(message);
    }
}

pub async fn chat_socket(ws: WebSocketUpgrade, Query(params): Query<ChatParams>, State(state): State<AppState>) -> impl IntoResponse {
    let name = params.name.unwrap_or_else(|| DEFAULT_SENDER.to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state.chat.clone(), name))
}

async fn handle_socket(socket: WebSocket, relay: ChatRelay, name: String) {
    let (mut outgoing, mut incoming) = socket.split();
    let mut rx = relay.subscribe();
    info!(sender = %name, listeners = relay.listeners(), "chat client connected");

    let mut forward = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let Ok(json) = serde_json::to_string(&message) else { continue };
                    if outgoing.send(Message::Text(json)).await.is_err() { break; }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => debug!(skipped, "chat client lagging"),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let receiver_relay = relay.clone();
    let receiver_name = name.clone();
    let mut receive = tokio::spawn(async move {
        while let Some(Ok(frame)) = incoming.next().await {
            match frame {
                Message::Text(text) => {
                    if let Some(message) = ChatRelay::stamp(&text, &receiver_name) {
                        receiver_relay.broadcast(message).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward => receive.abort(),
        _ = &mut receive => forward.abort(),
    }
    info!(sender = %name, "chat client disconnected");
}
