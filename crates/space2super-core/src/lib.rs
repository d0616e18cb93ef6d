// Space2Super Core Library
// Tap/hold disambiguation of a single key

pub mod action;
pub mod clock;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod event;
pub mod input;
pub mod key;
pub mod output;
pub mod role;

pub use action::Action;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Config, ConfigError, KeySpec};
pub use daemon::{Daemon, DaemonError, RunStats};
pub use engine::{Emission, EmissionReason, Engine, EventClass, SessionState};
pub use event::{EventBatch, EventSource, ScriptedSource};
pub use input::{
    is_key_event, is_keyboard, is_pointer, is_virtual_device, matches_device_filter,
    DeviceCapabilities, RawEvent,
};
pub use key::Key;
pub use output::{EmissionSink, RecordingSink, VIRTUAL_DEVICE_NAME};
pub use role::{KeyNames, KeyRole, RoleResolver, RoleTable};

#[cfg(feature = "pure-rust")]
pub use event::{DeviceInfo, DeviceKind, EventLoop, EventLoopError, EventLoopResult};
#[cfg(feature = "pure-rust")]
pub use output::{UInputError, VirtualDevice};
