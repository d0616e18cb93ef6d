// Space2Super Output Layer
// Emission sinks: uinput injection and an in-memory recorder

mod sink;

#[cfg(feature = "pure-rust")]
mod uinput;

pub use sink::{EmissionSink, RecordingSink};

/// Default name of the virtual keyboard.
///
/// The event loop skips any device whose name contains "(virtual)", so
/// injected events are never observed again.
pub const VIRTUAL_DEVICE_NAME: &str = "Space2Super (virtual) Keyboard";

#[cfg(feature = "pure-rust")]
pub use uinput::{UInputError, VirtualDevice};
