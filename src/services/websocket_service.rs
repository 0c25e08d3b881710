use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        game::ScoreSubmission,
        ws::{GameInboundMessage, GameOutboundMessage},
    },
    services::{score_service, sse_service},
    state::SharedState,
};

/// Handle the full lifecycle of one game WebSocket session.
///
/// Inbound frames carry fire-and-forget score submissions and rankings
/// subscriptions; outbound frames carry acks, per-request errors, and
/// rankings snapshots for every game type the session subscribed to.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let session_id = Uuid::new_v4().simple().to_string();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!(session = %session_id, "game websocket connected");

    // One forwarder task per subscribed game type, torn down with the session.
    let mut subscriptions: HashMap<String, JoinHandle<()>> = HashMap::new();

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match GameInboundMessage::from_json_str(&text) {
                Ok(GameInboundMessage::SubmitScore(submission)) => {
                    handle_submission(&state, &session_id, &outbound_tx, submission).await;
                }
                Ok(GameInboundMessage::Subscribe { game_type }) => {
                    handle_subscribe(
                        &state,
                        &session_id,
                        &outbound_tx,
                        &mut subscriptions,
                        game_type,
                    )
                    .await;
                }
                Ok(GameInboundMessage::Unsubscribe { game_type }) => {
                    if let Some(forwarder) = subscriptions.remove(&game_type) {
                        forwarder.abort();
                        send_message(
                            &outbound_tx,
                            &GameOutboundMessage::Ack {
                                action: "unsubscribe".into(),
                                game_type,
                            },
                        );
                    } else {
                        send_message(
                            &outbound_tx,
                            &GameOutboundMessage::Error {
                                message: format!("not subscribed to `{game_type}`"),
                            },
                        );
                    }
                }
                Ok(GameInboundMessage::Unknown) => {
                    send_message(
                        &outbound_tx,
                        &GameOutboundMessage::Error {
                            message: "unknown message type".into(),
                        },
                    );
                }
                Err(err) => {
                    warn!(session = %session_id, error = %err, "rejected websocket frame");
                    send_message(&outbound_tx, &GameOutboundMessage::Error { message: err });
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(session = %session_id, "game websocket closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(session = %session_id, error = %err, "websocket error");
                break;
            }
        }
    }

    for (_, forwarder) in subscriptions.drain() {
        forwarder.abort();
    }
    info!(session = %session_id, "game websocket disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Submit a score received over the socket. Fire-and-forget from the
/// client's point of view; the session only hears back an ack or a
/// per-request error, never a closed connection.
async fn handle_submission(
    state: &SharedState,
    session_id: &str,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    submission: ScoreSubmission,
) {
    let game_type = submission.game_type.clone();
    match score_service::submit_score(state, submission).await {
        Ok(()) => {
            send_message(
                outbound_tx,
                &GameOutboundMessage::Ack {
                    action: "submit_score".into(),
                    game_type,
                },
            );
        }
        Err(err) => {
            warn!(session = %session_id, error = %err, "websocket score submission failed");
            send_message(
                outbound_tx,
                &GameOutboundMessage::Error {
                    message: err.to_string(),
                },
            );
        }
    }
}

/// Register a rankings subscription and immediately push the current
/// top-K so the client does not wait for the next submission.
async fn handle_subscribe(
    state: &SharedState,
    session_id: &str,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    subscriptions: &mut HashMap<String, JoinHandle<()>>,
    game_type: String,
) {
    if !subscriptions.contains_key(&game_type) {
        let receiver = sse_service::subscribe(state, &game_type);
        let forwarder = spawn_forwarder(session_id.to_owned(), outbound_tx.clone(), receiver);
        subscriptions.insert(game_type.clone(), forwarder);
    }

    send_message(
        outbound_tx,
        &GameOutboundMessage::Ack {
            action: "subscribe".into(),
            game_type: game_type.clone(),
        },
    );

    let top_k = state.config().broadcast_top_k();
    let entries = score_service::get_top_rankings(state, &game_type, top_k).await;
    send_message(
        outbound_tx,
        &GameOutboundMessage::Rankings { game_type, entries },
    );
}

/// Forward rankings snapshots from a topic onto the session's writer until
/// either side goes away. A lagged receiver skips ahead; snapshots are
/// self-contained so nothing is replayed.
fn spawn_forwarder(
    session_id: String,
    outbound_tx: mpsc::UnboundedSender<Message>,
    mut receiver: tokio::sync::broadcast::Receiver<crate::dto::sse::RankingsEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(snapshot) => {
                    let message = GameOutboundMessage::Rankings {
                        game_type: snapshot.game_type,
                        entries: snapshot.entries,
                    };
                    let Ok(payload) = serde_json::to_string(&message) else {
                        continue;
                    };
                    if outbound_tx.send(Message::Text(payload.into())).is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session = %session_id, skipped, "websocket subscriber lagged; skipping");
                }
            }
        }
    })
}

/// Serialize a payload and push it onto the session's writer channel.
/// A closed writer is handled by the main loop; serialization failures are
/// bugs and only logged.
fn send_message<T>(tx: &mpsc::UnboundedSender<Message>, value: &T)
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    match serde_json::to_string(value) {
        Ok(payload) => {
            let _ = tx.send(Message::Text(payload.into()));
        }
        Err(err) => {
            warn!(error = %err, "failed to serialize websocket message `{value:?}`");
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
