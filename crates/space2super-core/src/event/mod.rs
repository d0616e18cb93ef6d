// Space2Super Event Handling
// Event sources: evdev devices and scripted replays

pub mod source;
#[cfg(feature = "pure-rust")]
pub mod r#loop;

pub use source::{EventBatch, EventSource, ScriptedSource};
#[cfg(feature = "pure-rust")]
pub use r#loop::{DeviceInfo, DeviceKind, EventLoop, EventLoopError, EventLoopResult};
