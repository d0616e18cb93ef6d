// Space2Super Input Layer
// Device detection, filtering and raw event decoding

mod device;
mod event;
mod filter;

pub use device::{is_keyboard, is_pointer, is_virtual_device, DeviceCapabilities, VIRTUAL_DEVICE_MARKER};
pub use event::{is_key_event, RawEvent, EV_KEY};
pub use filter::matches_device_filter;
