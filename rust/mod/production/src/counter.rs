use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{error, info, warn};

use partline_core::now_rfc3339;
use partline_kv::KVStore;

use crate::error::ProductionError;
use crate::model::{SerialCounterState, SerialSettings, TimeOfDay};
use crate::relay::{CommandKind, CommandRelay, OutboundCommand};

/// KV key of the persisted counter singleton.
pub const SERIAL_KEY: &str = "production:serial";

/// Source of the local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the host's local time zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Retry policy for counter persistence.
#[derive(Debug, Clone)]
pub struct CounterOptions {
    /// Total write attempts before giving up (at least 1).
    pub persist_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            persist_attempts: 3,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

/// SerialCounter — the persisted production sequence with a daily reset.
///
/// Mutations (`advance`, resets, configuration) serialize on a writer
/// mutex and only publish a new state after it is durably written, so
/// readers always see the last committed value.
pub struct SerialCounter {
    kv: Arc<dyn KVStore>,
    relay: Arc<dyn CommandRelay>,
    clock: Arc<dyn Clock>,
    options: CounterOptions,
    committed: RwLock<SerialCounterState>,
    writer: Mutex<()>,
}

impl SerialCounter {
    /// Load the counter from `kv`, starting from defaults if nothing is stored.
    pub fn load(
        kv: Arc<dyn KVStore>,
        relay: Arc<dyn CommandRelay>,
        clock: Arc<dyn Clock>,
        options: CounterOptions,
    ) -> Result<Self, ProductionError> {
        let state = match kv.get(SERIAL_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => SerialCounterState::default(),
        };
        info!(
            "serial counter loaded (current={}, resetTime={}, lastReset={:?})",
            state.current_value, state.reset_time, state.last_reset_date
        );
        Ok(Self {
            kv,
            relay,
            clock,
            options,
            committed: RwLock::new(state),
            writer: Mutex::new(()),
        })
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Last committed value.
    ///
    /// Runs the reset check first when no writer holds the lock; a busy
    /// writer or a failing store never delays the read.
    pub fn peek(&self) -> u64 {
        let guard = match self.writer.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        if let Some(_guard) = guard {
            if let Err(e) = self.reset_due(self.clock.now()) {
                warn!("serial reset check during peek failed: {e}");
            }
        }
        self.read().current_value
    }

    /// Snapshot of the committed state.
    pub fn state(&self) -> SerialCounterState {
        self.read().clone()
    }

    /// Increment by one and persist. Returns the new value.
    pub fn advance(&self) -> Result<u64, ProductionError> {
        self.advance_with(|_, _| Ok(())).map(|((), next)| next)
    }

    /// Consume the current value for one produced unit.
    ///
    /// Under the writer lock: run the reset check, hand the value being
    /// consumed and the instant to `render`, then increment and persist.
    /// If `render` or the write fails nothing is committed and the
    /// rendered output is dropped.
    pub fn advance_with<T, F>(&self, render: F) -> Result<(T, u64), ProductionError>
    where
        F: FnOnce(u64, NaiveDateTime) -> Result<T, ProductionError>,
    {
        let _guard = self.lock_writer();
        let now = self.clock.now();
        self.reset_due(now)?;

        let mut next = self.state();
        let consumed = next.current_value;
        let output = render(consumed, now)?;

        next.current_value = consumed.checked_add(1).ok_or_else(|| {
            ProductionError::validation("serial counter overflow", vec!["currentValue".into()])
        })?;
        self.commit(next)?;
        Ok((output, consumed + 1))
    }

    /// Apply the daily reset if `time` is past the reset time and the
    /// reset has not fired on `date` yet. Returns whether it fired.
    pub fn maybe_reset(&self, date: NaiveDate, time: TimeOfDay) -> Result<bool, ProductionError> {
        let _guard = self.lock_writer();
        self.reset_at(date, time)
    }

    pub fn maybe_reset_now(&self) -> Result<bool, ProductionError> {
        let now = self.clock.now();
        self.maybe_reset(now.date(), TimeOfDay::from(now.time()))
    }

    /// Replace the counter parameters. The current value is untouched.
    pub fn configure(
        &self,
        settings: &SerialSettings,
        updated_by: Option<String>,
    ) -> Result<SerialCounterState, ProductionError> {
        let _guard = self.lock_writer();
        let mut next = self.state();
        next.initial_value = settings.initial_value;
        next.reset_value = settings.reset_value;
        next.reset_time = settings.reset_time;
        next.updated_at = Some(now_rfc3339());
        next.updated_by = updated_by;
        self.commit(next.clone())?;
        info!(
            "serial counter configured (initial={}, reset={}, resetTime={})",
            next.initial_value, next.reset_value, next.reset_time
        );
        Ok(next)
    }

    /// Restart the sequence at `settings.initial_value` and adopt the new
    /// schedule. If today's reset time has already passed, today's reset
    /// is considered done.
    pub fn manual_reset(
        &self,
        settings: &SerialSettings,
        updated_by: Option<String>,
    ) -> Result<SerialCounterState, ProductionError> {
        let _guard = self.lock_writer();
        let now = self.clock.now();
        let mut next = self.state();
        next.current_value = settings.initial_value;
        next.initial_value = settings.initial_value;
        next.reset_value = settings.reset_value;
        next.reset_time = settings.reset_time;
        if TimeOfDay::from(now.time()) >= settings.reset_time {
            next.last_reset_date = Some(now.date());
        }
        next.updated_at = Some(now_rfc3339());
        next.updated_by = updated_by;
        self.commit(next.clone())?;

        info!("serial counter manually reset to {}", next.current_value);
        self.notify_reset(&next, "manual");
        Ok(next)
    }

    // ── internals ──

    fn reset_due(&self, now: NaiveDateTime) -> Result<bool, ProductionError> {
        self.reset_at(now.date(), TimeOfDay::from(now.time()))
    }

    /// Caller must hold the writer lock.
    fn reset_at(&self, date: NaiveDate, time: TimeOfDay) -> Result<bool, ProductionError> {
        let current = self.state();
        if time < current.reset_time || current.last_reset_date == Some(date) {
            return Ok(false);
        }

        let mut next = current;
        next.current_value = next.reset_value;
        next.last_reset_date = Some(date);
        self.commit(next.clone())?;

        info!(
            "serial counter reset to {} for {date} (resetTime={})",
            next.current_value, next.reset_time
        );
        self.notify_reset(&next, "scheduled");
        Ok(true)
    }

    fn notify_reset(&self, state: &SerialCounterState, reason: &str) {
        self.relay.send(OutboundCommand::new(
            CommandKind::SerialReset,
            serde_json::json!({
                "reason": reason,
                "currentValue": state.current_value,
                "lastResetDate": state.last_reset_date,
            }),
        ));
    }

    /// Persist `next` with bounded retries, then publish it to readers.
    fn commit(&self, next: SerialCounterState) -> Result<(), ProductionError> {
        let bytes = serde_json::to_vec(&next)?;
        let attempts = self.options.persist_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.kv.set(SERIAL_KEY, &bytes) {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!("serial persist attempt {attempt}/{attempts} failed: {e}");
                    std::thread::sleep(self.options.retry_backoff);
                    attempt += 1;
                }
                Err(e) => {
                    error!("serial persist failed after {attempts} attempts: {e}");
                    return Err(e.into());
                }
            }
        }
        *self.committed.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SerialCounterState> {
        self.committed.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use partline_kv::KVError;

    /// In-memory KV that can be told to fail the next N writes.
    #[derive(Default)]
    pub struct FlakyKv {
        data: Mutex<HashMap<String, Vec<u8>>>,
        pub fail_writes: AtomicU32,
    }

    impl FlakyKv {
        pub fn fail_next(&self, n: u32) {
            self.fail_writes.store(n, Ordering::SeqCst);
        }
    }

    impl KVStore for FlakyKv {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
            let pending = self.fail_writes.load(Ordering::SeqCst);
            if pending > 0 {
                self.fail_writes.store(pending - 1, Ordering::SeqCst);
                return Err(KVError::Storage("injected write failure".into()));
            }
            self.data.lock().unwrap().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<(), KVError> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Clock pinned to a settable instant.
    pub struct FixedClock(pub Mutex<NaiveDateTime>);

    impl FixedClock {
        pub fn at(s: &str) -> Self {
            FixedClock(Mutex::new(
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap(),
            ))
        }

        pub fn set(&self, s: &str) {
            *self.0.lock().unwrap() = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }
}
