use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};

use crate::{middleware::auth::AuthUser, services::realtime_service::RealtimeSession, AppState};

#[utoipa::path(
    get,
    path = "/api/realtime",
    params(
        ("token" = Option<String>, Query, description = "Bearer token for browsers that cannot set headers")
    ),
    responses(
        (status = 101, description = "Switched to a WebSocket carrying notification events"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn connect(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let session = state.realtime.connect(user.id);
    tracing::info!(user_id = %user.id, "realtime session opened");
    ws.on_upgrade(move |socket| pump(socket, session))
}

/// Forwards hub events to the socket until either side goes away. Dropping
/// the session deregisters it from the hub.
async fn pump(socket: WebSocket, mut session: RealtimeSession) {
    let user_id = session.user_id();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = session.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::error!(%user_id, error = %err, "failed to encode realtime event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(%user_id, error = %err, "realtime socket error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(%user_id, "realtime session closed");
}
