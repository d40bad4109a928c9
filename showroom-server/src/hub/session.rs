//! Per-connection session: a reader task and a writer task owned as a pair
//!
//! - reader: applies `SUBSCRIBE` commands, resets the read deadline on every
//!   inbound frame, ends on timeout / close / error
//! - writer: drains the outbound queue, pings every `ping_period`, bounds each
//!   write by `write_wait`
//!
//! Whichever task finishes first aborts the other; the connection is then
//! unregistered.

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use shared::live::LiveCommand;
use tokio::sync::mpsc;

use super::{ConnectionId, Frame, Hub};
use crate::config::LiveConfig;
use crate::utils::validation::validate_dealership_id;

/// Serve an upgraded WebSocket until either side gives up
pub async fn serve(socket: WebSocket, hub: Hub, config: LiveConfig) {
    let (sink, stream) = socket.split();
    run(sink, stream, hub, config).await;
}

/// Drive a connection over any sink/stream pair
pub async fn run<S, St>(sink: S, stream: St, hub: Hub, config: LiveConfig)
where
    S: Sink<Message, Error = axum::Error> + Unpin + Send + 'static,
    St: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
{
    let (id, rx) = hub.register();
    tracing::info!(connection_id = id, "Live WS connected");

    let mut writer = tokio::spawn(write_pump(sink, rx, config.clone(), id));
    let mut reader = tokio::spawn(read_pump(stream, hub.clone(), config, id));

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    hub.unregister(id);
    tracing::info!(connection_id = id, "Live WS disconnected");
}

async fn read_pump<St>(mut stream: St, hub: Hub, config: LiveConfig, id: ConnectionId)
where
    St: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let next = match tokio::time::timeout(config.pong_wait, stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!(connection_id = id, "Live WS read deadline exceeded");
                break;
            }
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                if text.as_str().len() > config.max_message_bytes {
                    tracing::debug!(connection_id = id, "Oversized frame ignored");
                    continue;
                }
                handle_command(&hub, id, text.as_str());
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(connection_id = id, error = %e, "Live WS read error");
                break;
            }
        }
    }
}

fn handle_command(hub: &Hub, id: ConnectionId, text: &str) {
    match serde_json::from_str::<LiveCommand>(text) {
        Ok(LiveCommand::Subscribe { dealership_id }) => {
            if let Err(e) = validate_dealership_id(&dealership_id) {
                tracing::debug!(connection_id = id, error = %e, "Subscribe rejected");
                return;
            }
            hub.subscribe(id, &dealership_id);
        }
        Err(e) => {
            tracing::debug!(connection_id = id, error = %e, "Malformed live command ignored");
        }
    }
}

async fn write_pump<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Frame>,
    config: LiveConfig,
    id: ConnectionId,
) where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut ping_interval = tokio::time::interval(config.ping_period);
    ping_interval.tick().await; // skip immediate

    loop {
        let message = tokio::select! {
            frame = rx.recv() => match frame {
                Some(frame) => Message::Text(frame),
                None => {
                    // unregistered by the hub
                    let _ = tokio::time::timeout(config.write_wait, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ping_interval.tick() => Message::Ping(Vec::new().into()),
        };

        match tokio::time::timeout(config.write_wait, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = id, error = %e, "Live WS write failed");
                break;
            }
            Err(_) => {
                tracing::info!(connection_id = id, "Live WS write deadline exceeded");
                break;
            }
        }
    }
}
