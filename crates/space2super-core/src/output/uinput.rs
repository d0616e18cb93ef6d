// Space2Super uinput Output Layer
// Virtual keyboard that injects the substitute key

use super::EmissionSink;
use crate::engine::Emission;
use crate::{Action, Key};

use evdev::{EventType, InputEvent};

/// Error types for uinput operations
#[derive(Debug, thiserror::Error)]
pub enum UInputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    WriteError(String),
}

/// Virtual uinput keyboard used as the emission sink
pub struct VirtualDevice {
    device: evdev::uinput::VirtualDevice,
    name: String,
    emitted: u64,
}

impl VirtualDevice {
    /// Create a virtual keyboard able to type `substitute`
    pub fn new(name: &str, substitute: Key) -> Result<Self, UInputError> {
        use evdev::uinput::VirtualDeviceBuilder;
        use evdev::AttributeSet;

        // Advertise the standard keyboard range so the host treats the
        // device as a keyboard, plus the substitute if it lies beyond it.
        let mut keys = AttributeSet::new();
        for code in 1..256u16 {
            keys.insert(evdev::Key::new(code));
        }
        keys.insert(evdev::Key::new(substitute.code()));

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .name(name)
            .with_keys(&keys)
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?;

        log::info!("Created virtual keyboard '{}'", name);
        Ok(Self {
            device,
            name: name.to_string(),
            emitted: 0,
        })
    }

    /// Write a single key event followed by SYN_REPORT
    fn write_key_event(&mut self, key: Key, action: Action) -> Result<(), UInputError> {
        let key_event = InputEvent::new(EventType::KEY, key.code(), action.to_i32());
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        self.device
            .emit(&[key_event, syn_event])
            .map_err(|e: std::io::Error| UInputError::WriteError(e.to_string()))
    }

    /// Press and release `key`
    pub fn tap_key(&mut self, key: Key) -> Result<(), UInputError> {
        self.write_key_event(key, Action::Press)?;
        self.write_key_event(key, Action::Release)?;
        self.emitted += 1;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of taps injected so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EmissionSink for VirtualDevice {
    type Error = UInputError;

    fn emit(&mut self, emission: &Emission) -> Result<(), Self::Error> {
        log::debug!("Injecting {} ({})", emission.key, emission.reason);
        self.tap_key(emission.key)
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        log::debug!(
            "Closing virtual keyboard '{}' after {} emission(s)",
            self.name,
            self.emitted
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::VIRTUAL_DEVICE_NAME;

    #[test]
    fn test_virtual_device_creation() {
        // Requires write access to /dev/uinput; skipped otherwise
        match VirtualDevice::new(VIRTUAL_DEVICE_NAME, Key::from(194)) {
            Ok(device) => {
                assert_eq!(device.name(), VIRTUAL_DEVICE_NAME);
                assert_eq!(device.emitted(), 0);
            }
            Err(e) => {
                println!("Skipping test: {}", e);
            }
        }
    }

    #[test]
    fn test_virtual_name_is_filtered_by_event_loop() {
        assert!(crate::input::is_virtual_device(
            VIRTUAL_DEVICE_NAME,
            crate::input::VIRTUAL_DEVICE_MARKER
        ));
    }
}
