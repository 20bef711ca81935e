pub mod configs;
pub mod grade;
pub mod ingest;
pub mod selection;
pub mod serial;
pub mod shifts;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use partline_kv::KVStore;
use partline_sql::SQLStore;

use crate::counter::{Clock, CounterOptions, SerialCounter, SystemClock};
use crate::error::ProductionError;
use crate::relay::{Outbox, DEFAULT_OUTBOX_CAPACITY};
use crate::store::{init_schema, AuditLog, ConfigStore, RecordStore};

pub use configs::Preview;
pub use ingest::{IngestOutcome, ScanResult};
pub use shifts::CurrentShift;

/// Tunables for the production service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub counter: CounterOptions,
    pub outbox_capacity: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            counter: CounterOptions::default(),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

/// Production service — owns the stores, the serial counter and the relay
/// outbox, and implements every boundary operation of the module.
pub struct ProductionService {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) configs: ConfigStore,
    pub(crate) records: RecordStore,
    pub(crate) audit: AuditLog,
    pub(crate) counter: Arc<SerialCounter>,
    pub(crate) outbox: Arc<Outbox>,
}

impl ProductionService {
    pub fn new(
        kv: Arc<dyn KVStore>,
        sql: Arc<dyn SQLStore>,
        options: ServiceOptions,
    ) -> Result<Self, ProductionError> {
        Self::with_clock(kv, sql, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        kv: Arc<dyn KVStore>,
        sql: Arc<dyn SQLStore>,
        options: ServiceOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProductionError> {
        init_schema(sql.as_ref())?;
        let outbox = Arc::new(Outbox::new(options.outbox_capacity));
        let counter = Arc::new(SerialCounter::load(
            kv.clone(),
            outbox.clone(),
            clock,
            options.counter,
        )?);
        Ok(Self {
            kv,
            configs: ConfigStore::new(sql.clone()),
            records: RecordStore::new(sql.clone()),
            audit: AuditLog::new(sql),
            counter,
            outbox,
        })
    }

    pub fn counter(&self) -> &Arc<SerialCounter> {
        &self.counter
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    // ── KV helpers ──

    pub(crate) fn kv_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ProductionError> {
        match self.kv.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn kv_put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ProductionError> {
        let bytes = serde_json::to_vec(value)?;
        self.kv.set(key, &bytes)?;
        Ok(())
    }
}
