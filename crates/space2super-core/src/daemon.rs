// Space2Super Daemon
// Drives the engine from an event source into an emission sink

use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::Clock;
use crate::engine::{Emission, Engine, EventClass};
use crate::event::EventSource;
use crate::input::RawEvent;
use crate::output::EmissionSink;
use crate::role::RoleTable;

/// Poll timeout used by the binary's main loop (milliseconds)
pub const DEFAULT_POLL_TIMEOUT_MS: i32 = 100;

/// Errors that end a daemon run
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Event source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Emission sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Counters reported when a run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub events: u64,
    pub emissions: u64,
    pub failed_emissions: u64,
}

/// One disambiguation session: role table, engine and clock.
pub struct Daemon<C: Clock> {
    table: RoleTable,
    engine: Engine,
    clock: C,
}

impl<C: Clock> Daemon<C> {
    pub fn new(table: RoleTable, engine: Engine, clock: C) -> Self {
        Self {
            table,
            engine,
            clock,
        }
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Event class of a raw event; pointer buttons bypass the role table
    pub fn classify(&self, event: &RawEvent) -> EventClass {
        if event.key.is_pointer_button() {
            EventClass::PointerButton
        } else {
            EventClass::Key(self.table.classify(event.key.code()))
        }
    }

    /// Feed one event through the engine, stamping it with the clock.
    ///
    /// Sink errors are returned; the engine state is already updated.
    pub fn process<S>(&mut self, event: RawEvent, sink: &mut S) -> Result<Option<Emission>, DaemonError>
    where
        S: EmissionSink + ?Sized,
    {
        let class = self.classify(&event);
        let now = self.clock.now();
        self.engine
            .dispatch(class, event.action, now, sink)
            .map_err(|e| DaemonError::Sink(Box::new(e)))
    }

    /// Run until `running` is cleared or the source fails.
    ///
    /// A failed emission is logged and the loop carries on; the next
    /// session starts from a clean state either way.
    pub fn run_until<Src, S>(
        &mut self,
        source: &mut Src,
        sink: &mut S,
        running: &AtomicBool,
        poll_timeout_ms: i32,
    ) -> Result<RunStats, DaemonError>
    where
        Src: EventSource + ?Sized,
        S: EmissionSink + ?Sized,
    {
        let mut stats = RunStats::default();

        while running.load(Ordering::SeqCst) {
            let events = source
                .poll_events(poll_timeout_ms)
                .map_err(|e| DaemonError::Source(Box::new(e)))?;

            for event in events {
                stats.events += 1;
                match self.process(event, sink) {
                    Ok(Some(_)) => stats.emissions += 1,
                    Ok(None) => {}
                    Err(e) => {
                        stats.failed_emissions += 1;
                        log::error!("Failed to emit {}: {}", self.engine.substitute(), e);
                    }
                }
            }
        }

        log::info!(
            "Stopped after {} event(s), {} emission(s), {} failed",
            stats.events,
            stats.emissions,
            stats.failed_emissions
        );
        Ok(stats)
    }
}
