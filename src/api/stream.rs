//! WebSocket transport for the streaming analysis protocol.
//!
//! The server emits `connected` on open, the client answers with one
//! `start-analysis` message, and the pipeline's events are forwarded in
//! order until the terminal `complete`/`error`. A client disconnect aborts
//! the in-flight pipeline task; nothing is emitted afterwards.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::routes::ApiState;
use crate::config::CHANNEL_CAPACITY;
use crate::error::AppError;
use crate::pipeline::ChannelSink;
use crate::types::{ClientMessage, StreamEvent, ValidRequest};

pub async fn stream_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ApiState) {
    let (mut sender, mut receiver) = socket.split();

    // Session opens: connected goes out before anything else.
    if send_event(&mut sender, &StreamEvent::Connected).await.is_err() {
        return;
    }

    let Some(request) = await_start_message(&mut sender, &mut receiver).await else {
        let _ = sender.close().await;
        return;
    };

    info!(query = %request.query, limit = request.limit, "streaming analysis session started");
    state.metrics.inc_started();

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let pipeline = state.pipeline.clone();
    let task = tokio::spawn(async move { pipeline.run(request, &ChannelSink::new(tx)).await });

    loop {
        tokio::select! {
            maybe_event = rx.recv() => match maybe_event {
                Some(event) => {
                    let terminal = event.is_terminal();
                    if send_event(&mut sender, &event).await.is_err() {
                        task.abort();
                        break;
                    }
                    if terminal {
                        break;
                    }
                }
                // Pipeline ended without a terminal event (cancelled).
                None => break,
            },
            maybe_msg = receiver.next() => match maybe_msg {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("client disconnected mid-session");
                    task.abort();
                    break;
                }
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {e}");
                    task.abort();
                    break;
                }
                // Pings are answered by axum; other frames are ignored.
                Some(Ok(_)) => {}
            },
        }
    }

    match task.await {
        Ok(Ok(_)) => state.metrics.inc_completed(),
        Ok(Err(AppError::Cancelled)) => state.metrics.inc_cancelled(),
        Ok(Err(_)) => state.metrics.inc_failed(),
        // Aborted after client disconnect.
        Err(_) => state.metrics.inc_cancelled(),
    }

    let _ = sender.close().await;
}

/// Wait for the initiation message and validate it. Returns None when the
/// client disconnects or sends something unusable (after an error event).
async fn await_start_message(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
) -> Option<ValidRequest> {
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                let parsed: Result<ClientMessage, _> = serde_json::from_str(&text);
                match parsed {
                    Ok(ClientMessage::StartAnalysis(request)) => match request.validate() {
                        Ok(valid) => return Some(valid),
                        Err(e) => {
                            let _ = send_event(
                                sender,
                                &StreamEvent::Error {
                                    message: e.to_string(),
                                },
                            )
                            .await;
                            return None;
                        }
                    },
                    Err(_) => {
                        let _ = send_event(
                            sender,
                            &StreamEvent::Error {
                                message: "expected a start-analysis message".to_string(),
                            },
                        )
                        .await;
                        return None;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("WebSocket receive error before start: {e}");
                return None;
            }
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &StreamEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => sender.send(Message::Text(text)).await,
        Err(e) => {
            warn!("failed to serialize stream event: {e}");
            Ok(())
        }
    }
}
