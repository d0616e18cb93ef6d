// Space2Super Emission Sink
// Boundary between the engine and synthetic event injection

use std::convert::Infallible;

use crate::engine::Emission;

/// Accepts emission requests and injects a press followed by a release.
///
/// Implementations must finish the injection before `emit` returns and
/// keep successive requests in order.
pub trait EmissionSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn emit(&mut self, emission: &Emission) -> Result<(), Self::Error>;
}

impl<S: EmissionSink + ?Sized> EmissionSink for &mut S {
    type Error = S::Error;

    fn emit(&mut self, emission: &Emission) -> Result<(), Self::Error> {
        (**self).emit(emission)
    }
}

/// Sink that stores every emission, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    emissions: Vec<Emission>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    /// Drain recorded emissions
    pub fn take(&mut self) -> Vec<Emission> {
        std::mem::take(&mut self.emissions)
    }
}

impl EmissionSink for RecordingSink {
    type Error = Infallible;

    fn emit(&mut self, emission: &Emission) -> Result<(), Self::Error> {
        log::debug!("Recorded emission of {} ({})", emission.key, emission.reason);
        self.emissions.push(*emission);
        Ok(())
    }
}
