use std::time::Duration;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{blocking, ok_json, ApiError, AppState};
use crate::relay::{CommandKind, Envelope, InboundMessage, OutboundCommand, PendingCommand};
use crate::service::IngestOutcome;

/// Upper bound for a long-poll wait.
const MAX_POLL_SECS: u64 = 60;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/relay/commands", post(send_command))
        .route("/relay/inbound", post(inbound))
        .route("/relay/outbox", get(outbox))
}

#[derive(Deserialize)]
struct CommandBody {
    #[serde(rename = "type")]
    kind: CommandKind,
    #[serde(default)]
    payload: serde_json::Value,
}

async fn send_command(
    State(svc): State<AppState>,
    Json(body): Json<CommandBody>,
) -> Result<Json<OutboundCommand>, ApiError> {
    ok_json(svc.send_command(body.kind, body.payload))
}

async fn inbound(
    State(svc): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Result<Json<IngestOutcome>, ApiError> {
    blocking(svc, move |svc| svc.handle_inbound(message)).await
}

#[derive(Deserialize)]
struct OutboxQuery {
    #[serde(default)]
    after: u64,
    /// Seconds to wait for new commands; 0 returns immediately.
    #[serde(default)]
    timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboxPage {
    commands: Vec<Envelope>,
    last_seq: u64,
    pending: Vec<PendingCommand>,
}

async fn outbox(State(svc): State<AppState>, Query(q): Query<OutboxQuery>) -> Json<OutboxPage> {
    let outbox = svc.outbox();
    let commands = if q.timeout == 0 {
        outbox.since(q.after)
    } else {
        let wait = Duration::from_secs(q.timeout.min(MAX_POLL_SECS));
        outbox.poll(q.after, wait).await
    };
    Json(OutboxPage {
        last_seq: commands.last().map(|e| e.seq).unwrap_or(q.after),
        commands,
        pending: outbox.pending(),
    })
}
