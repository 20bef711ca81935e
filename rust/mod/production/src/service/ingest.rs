use serde::Serialize;
use tracing::{error, info, warn};

use partline_core::{new_id, now_rfc3339, ListParams, ListResult};

use super::ProductionService;
use crate::error::ProductionError;
use crate::ident::{render, DeriveContext};
use crate::model::ProductionRecord;
use crate::relay::{
    Ack, CommandKind, CommandRelay, InboundMessage, ManualOperation, OutboundCommand,
    PendingCommand, SignalKind, Telemetry,
};

/// Result of a scanner read compared with the last marked unit.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub matched: bool,
    pub expected: Option<String>,
    pub scanned: String,
}

/// What an inbound message did.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Produced { record: ProductionRecord },
    Scanned { result: ScanResult },
    Signalled {
        signal: SignalKind,
        message: String,
    },
    Acknowledged {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<PendingCommand>,
    },
}

impl ProductionService {
    pub fn handle_inbound(&self, message: InboundMessage) -> Result<IngestOutcome, ProductionError> {
        match message {
            InboundMessage::Telemetry(Telemetry::MarkingData(data)) => {
                let record = self.record_marking(data)?;
                Ok(IngestOutcome::Produced { record })
            }
            InboundMessage::Telemetry(Telemetry::ScannerData(data)) => {
                let result = self.compare_scan(&data)?;
                Ok(IngestOutcome::Scanned { result })
            }
            InboundMessage::Telemetry(Telemetry::Signal { kind, message }) => {
                Ok(self.machine_signal(kind, message))
            }
            InboundMessage::Ack(ack) => Ok(self.acknowledge(ack)),
        }
    }

    /// Log a controller signal. Emergency stops are logged as errors.
    pub fn machine_signal(&self, signal: SignalKind, message: Option<String>) -> IngestOutcome {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| signal.default_message().to_string());
        match signal {
            SignalKind::EmergencyStop => error!("{}: {message}", signal.as_str()),
            SignalKind::PartPresence | SignalKind::LightCurtation => {
                warn!("{}: {message}", signal.as_str())
            }
        }
        IngestOutcome::Signalled { signal, message }
    }

    /// One unit was marked: consume a serial for the selected configuration
    /// and record the unit.
    pub fn record_marking(&self, data: serde_json::Value) -> Result<ProductionRecord, ProductionError> {
        let config = self.selected_configuration()?;
        let schedule = self.get_shifts()?;

        let ((identifier, serial), _next) = self.counter.advance_with(|serial, at| {
            let ctx = DeriveContext {
                at,
                shifts: &schedule.shifts,
                serial,
                year_format: config.year_format,
            };
            render(&config, &ctx).map(|identifier| (identifier, serial))
        })?;

        let record = ProductionRecord {
            id: new_id(),
            serial_number: serial,
            identifier,
            configuration_id: Some(config.id.clone()),
            model_number: config.model_number().map(str::to_string),
            data,
            created_at: now_rfc3339(),
        };
        if let Err(e) = self.records.insert(&record) {
            error!(
                "serial {} consumed but production record was not stored: {e}",
                record.serial_number
            );
            return Err(e);
        }
        info!("unit marked: {} (serial {})", record.identifier, record.serial_number);
        Ok(record)
    }

    /// Compare a scanned code with the identifier of the last marked unit.
    pub fn compare_scan(&self, data: &serde_json::Value) -> Result<ScanResult, ProductionError> {
        let scanned = scanned_code(data);
        let expected = self.records.latest()?.map(|r| r.identifier);
        let matched = expected.as_deref() == Some(scanned.as_str());
        if matched {
            info!("scan matched {scanned}");
        } else {
            warn!("scan mismatch: expected {expected:?}, scanned {scanned}");
        }
        Ok(ScanResult {
            matched,
            expected,
            scanned,
        })
    }

    fn acknowledge(&self, ack: Ack) -> IngestOutcome {
        let command = self.outbox.acknowledge(&ack);
        match (&command, ack.success) {
            (Some(cmd), true) => info!("command {} ({:?}) acknowledged", cmd.id, cmd.kind),
            (Some(cmd), false) => warn!(
                "command {} ({:?}) failed: {}",
                cmd.id,
                cmd.kind,
                ack.message.as_deref().unwrap_or("")
            ),
            (None, _) => info!("ack without pending command: {:?}", ack.message),
        }
        IngestOutcome::Acknowledged {
            success: ack.success,
            message: ack.message,
            command,
        }
    }

    /// Queue an operator command for the line controller.
    pub fn send_command(
        &self,
        kind: CommandKind,
        payload: serde_json::Value,
    ) -> Result<OutboundCommand, ProductionError> {
        match kind {
            CommandKind::SerialReset => {
                return Err(ProductionError::validation(
                    "serial_reset is emitted by the engine, not by clients",
                    vec!["type".into()],
                ))
            }
            CommandKind::ManualRun => {
                serde_json::from_value::<ManualOperation>(payload.clone()).map_err(|_| {
                    ProductionError::validation(
                        format!("unknown manual operation {payload}"),
                        vec!["payload".into()],
                    )
                })?;
            }
            CommandKind::ScannerTrigger | CommandKind::MarkOn | CommandKind::LightOn => {}
        }
        let command = OutboundCommand::new(kind, payload);
        self.outbox.send(command.clone());
        Ok(command)
    }

    pub fn list_records(&self, params: &ListParams) -> Result<ListResult<ProductionRecord>, ProductionError> {
        self.records.list(params)
    }

    pub fn latest_record(&self) -> Result<Option<ProductionRecord>, ProductionError> {
        self.records.latest()
    }
}

/// Scanners report either a bare string or an object carrying `code`.
fn scanned_code(data: &serde_json::Value) -> String {
    match data {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Object(obj) => match obj.get("code").or_else(|| obj.get("data")) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string(),
            None => data.to_string(),
        },
        other => other.to_string(),
    }
}
