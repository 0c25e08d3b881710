use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, RankingsEvent},
    state::SharedState,
};

const EVENT_RANKINGS: &str = "rankings";
const EVENT_SUBSCRIBED: &str = "subscribed";

/// Subscribe to the rankings topic for one game type.
pub fn subscribe(state: &SharedState, game_type: &str) -> broadcast::Receiver<RankingsEvent> {
    state.ranking_hub().subscribe(game_type)
}

/// Convert a rankings subscription into an SSE response, forwarding
/// snapshots until the client disconnects.
///
/// A lagged receiver skips the snapshots it missed and keeps going; each
/// snapshot supersedes the previous one, so nothing is replayed.
///
/// The returned stream owns everything it needs (`use<>`): the state
/// reference only feeds the handshake, so the response must not hold its
/// lifetime once the handler returns.
pub async fn to_sse_stream(
    state: &SharedState,
    game_type: String,
    mut receiver: broadcast::Receiver<RankingsEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    let handshake = Handshake {
        game_type: game_type.clone(),
        message: format!("subscribed to `{game_type}` rankings"),
        degraded: state.is_degraded().await,
    };
    if let Some(event) = json_event(EVENT_SUBSCRIBED, &handshake) {
        let _ = tx.send(Ok(event)).await;
    }

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(snapshot) => {
                            let Some(event) = json_event(EVENT_RANKINGS, &snapshot) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // The next snapshot covers everything missed.
                            warn!(%game_type, skipped, "SSE subscriber lagged; skipping");
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(%game_type, "rankings SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn json_event(name: &str, payload: &impl serde::Serialize) -> Option<Event> {
    match serde_json::to_string(payload) {
        Ok(data) => Some(Event::default().event(name).data(data)),
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
