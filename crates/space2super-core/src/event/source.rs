// Space2Super Event Sources
// Ordered stream of raw key/button transitions

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::clock::ManualClock;
use crate::input::RawEvent;

/// Events delivered by one poll; most polls carry a single transition
pub type EventBatch = SmallVec<[RawEvent; 8]>;

/// Produces raw events in the order the host delivered them.
pub trait EventSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Wait up to `timeout_ms` (-1 = forever) and return whatever arrived.
    ///
    /// An empty batch means the wait timed out or was interrupted.
    fn poll_events(&mut self, timeout_ms: i32) -> Result<EventBatch, Self::Error>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    type Error = S::Error;

    fn poll_events(&mut self, timeout_ms: i32) -> Result<EventBatch, Self::Error> {
        (**self).poll_events(timeout_ms)
    }
}

/// Replays a fixed script of timed events against a `ManualClock`.
///
/// Each poll moves the clock to the next event's time and returns that
/// event. Once the script runs out, polls return empty batches and the
/// optional stop flag is cleared so a daemon loop winds down.
#[derive(Debug)]
pub struct ScriptedSource {
    clock: ManualClock,
    script: VecDeque<(u64, RawEvent)>,
    stop: Option<Arc<AtomicBool>>,
}

impl ScriptedSource {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            script: VecDeque::new(),
            stop: None,
        }
    }

    /// Append an event at `ms` milliseconds after the clock origin
    pub fn at(mut self, ms: u64, event: RawEvent) -> Self {
        self.script.push_back((ms, event));
        self
    }

    /// Clear `running` once the script is exhausted
    pub fn stop_when_done(mut self, running: Arc<AtomicBool>) -> Self {
        self.stop = Some(running);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl EventSource for ScriptedSource {
    type Error = Infallible;

    fn poll_events(&mut self, _timeout_ms: i32) -> Result<EventBatch, Self::Error> {
        let mut batch = EventBatch::new();
        match self.script.pop_front() {
            Some((ms, event)) => {
                self.clock.set_ms(ms);
                batch.push(event);
            }
            None => {
                if let Some(ref running) = self.stop {
                    running.store(false, Ordering::SeqCst);
                }
            }
        }
        Ok(batch)
    }
}
