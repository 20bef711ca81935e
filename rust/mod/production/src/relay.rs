use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, warn};

use partline_core::{new_id, now_rfc3339};

// ── Message contract ────────────────────────────────────────────────

/// Outbound command types understood by the line controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    #[serde(rename = "manual-run")]
    ManualRun,
    #[serde(rename = "scanner_trigger")]
    ScannerTrigger,
    #[serde(rename = "mark_on")]
    MarkOn,
    #[serde(rename = "light_on")]
    LightOn,
    /// Emitted by the engine whenever the serial counter is reset.
    #[serde(rename = "serial_reset")]
    SerialReset,
}

/// Operations accepted as the payload of a `manual-run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualOperation {
    Position1Home,
    Position2Scanner,
    Position3Marking,
    Position4,
    Position5,
    JogFwd,
    JogRev,
    StopJog,
    ScannerTrigger,
    Marking,
    LightOn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCommand {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: CommandKind,

    #[serde(default)]
    pub payload: serde_json::Value,

    pub sent_at: String,
}

impl OutboundCommand {
    pub fn new(kind: CommandKind, payload: serde_json::Value) -> Self {
        Self {
            id: new_id(),
            kind,
            payload,
            sent_at: now_rfc3339(),
        }
    }
}

/// Discrete machine signals raised by the line controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "part-presence")]
    PartPresence,
    #[serde(rename = "emergency-stop")]
    EmergencyStop,
    #[serde(rename = "light-curtation")]
    LightCurtation,
}

impl SignalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::PartPresence => "part-presence",
            SignalKind::EmergencyStop => "emergency-stop",
            SignalKind::LightCurtation => "light-curtation",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "part-presence" => Some(SignalKind::PartPresence),
            "emergency-stop" => Some(SignalKind::EmergencyStop),
            "light-curtation" => Some(SignalKind::LightCurtation),
            _ => None,
        }
    }

    /// Text used when the controller sends no message.
    pub fn default_message(self) -> &'static str {
        match self {
            SignalKind::PartPresence => "Part Presence signal detected",
            SignalKind::EmergencyStop => "Emergency Stop signal detected",
            SignalKind::LightCurtation => "Light Curtation signal detected",
        }
    }
}

/// Machine telemetry: `{"type": ..., "data": ...}`.
///
/// `marking_data` and `scanner_data` carry arbitrary data; signals carry
/// an optional `{"message": ...}`. A missing `data` reads as null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawTelemetry", into = "RawTelemetry")]
pub enum Telemetry {
    MarkingData(serde_json::Value),
    ScannerData(serde_json::Value),
    Signal {
        kind: SignalKind,
        message: Option<String>,
    },
}

#[derive(Serialize, Deserialize)]
struct RawTelemetry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl TryFrom<RawTelemetry> for Telemetry {
    type Error = String;

    fn try_from(raw: RawTelemetry) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "marking_data" => Ok(Telemetry::MarkingData(raw.data)),
            "scanner_data" => Ok(Telemetry::ScannerData(raw.data)),
            other => match SignalKind::parse(other) {
                Some(kind) => Ok(Telemetry::Signal {
                    kind,
                    message: raw
                        .data
                        .get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string),
                }),
                None => Err(format!("unknown telemetry type '{other}'")),
            },
        }
    }
}

impl From<Telemetry> for RawTelemetry {
    fn from(t: Telemetry) -> Self {
        match t {
            Telemetry::MarkingData(data) => RawTelemetry {
                kind: "marking_data".into(),
                data,
            },
            Telemetry::ScannerData(data) => RawTelemetry {
                kind: "scanner_data".into(),
                data,
            },
            Telemetry::Signal { kind, message } => RawTelemetry {
                kind: kind.as_str().into(),
                data: match message {
                    Some(m) => serde_json::json!({ "message": m }),
                    None => serde_json::Value::Null,
                },
            },
        }
    }
}

/// Controller acknowledgement of an outbound command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Id of the command being acknowledged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InboundMessage {
    Telemetry(Telemetry),
    Ack(Ack),
}

/// Sink for outbound commands. Sending never blocks and never fails.
pub trait CommandRelay: Send + Sync {
    fn send(&self, command: OutboundCommand);
}

// ── Outbox ──────────────────────────────────────────────────────────

pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// An outbound command with its position in the outbox.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Envelope {
    pub seq: u64,
    #[serde(flatten)]
    pub command: OutboundCommand,
}

/// A sent command still waiting for its ack.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommand {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub sent_at: String,
}

#[derive(Default)]
struct OutboxState {
    last_seq: u64,
    queue: VecDeque<Envelope>,
    pending: VecDeque<PendingCommand>,
}

/// Bounded in-memory queue that transports drain by sequence number.
///
/// When full, the oldest command is dropped.
pub struct Outbox {
    state: Mutex<OutboxState>,
    notify: Notify,
    capacity: usize,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(OutboxState::default()),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OutboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sequence number of the newest command, 0 if nothing was sent yet.
    pub fn last_seq(&self) -> u64 {
        self.lock().last_seq
    }

    /// Commands queued after `after`, oldest first.
    pub fn since(&self, after: u64) -> Vec<Envelope> {
        self.lock()
            .queue
            .iter()
            .filter(|e| e.seq > after)
            .cloned()
            .collect()
    }

    /// Wait up to `timeout` for commands newer than `after`.
    pub async fn poll(&self, after: u64, timeout: Duration) -> Vec<Envelope> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let ready = self.since(after);
        if !ready.is_empty() {
            return ready;
        }
        let _ = tokio::time::timeout(timeout, notified).await;
        self.since(after)
    }

    /// Resolve the pending command named by `ack.reply_to`.
    pub fn acknowledge(&self, ack: &Ack) -> Option<PendingCommand> {
        let reply_to = ack.reply_to.as_deref()?;
        let mut state = self.lock();
        let idx = state.pending.iter().position(|p| p.id == reply_to)?;
        state.pending.remove(idx)
    }

    pub fn pending(&self) -> Vec<PendingCommand> {
        self.lock().pending.iter().cloned().collect()
    }
}

impl CommandRelay for Outbox {
    fn send(&self, command: OutboundCommand) {
        {
            let mut state = self.lock();
            state.last_seq += 1;
            let seq = state.last_seq;

            if state.queue.len() >= self.capacity {
                if let Some(dropped) = state.queue.pop_front() {
                    warn!(
                        "outbox full, dropping command {} (seq={})",
                        dropped.command.id, dropped.seq
                    );
                }
            }
            if state.pending.len() >= self.capacity {
                state.pending.pop_front();
            }
            state.pending.push_back(PendingCommand {
                id: command.id.clone(),
                kind: command.kind,
                sent_at: command.sent_at.clone(),
            });
            debug!("outbox seq={seq} type={:?}", command.kind);
            state.queue.push_back(Envelope { seq, command });
        }
        self.notify.notify_waiters();
    }
}
