// Space2Super Input Layer - Device Detection
// Which devices carry keyboard keys or pointer buttons

use std::collections::HashSet;

/// Name fragment carried by our own uinput device
pub const VIRTUAL_DEVICE_MARKER: &str = "(virtual)";

/// Device capabilities extracted from evdev supported keys
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Whether the device supports EV_KEY events
    pub has_ev_key: bool,
    /// Supported EV_KEY codes
    pub supported_keys: HashSet<u16>,
}

impl DeviceCapabilities {
    pub fn new(has_ev_key: bool, supported_keys: impl IntoIterator<Item = u16>) -> Self {
        Self {
            has_ev_key,
            supported_keys: supported_keys.into_iter().collect(),
        }
    }

    pub fn supports_key(&self, key_code: u16) -> bool {
        self.supported_keys.contains(&key_code)
    }
}

// QWERTY row key codes: Q, W, E, R, T, Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// Representative A-Z and SPACE codes for keyboard detection
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44]; // SPACE, A, Z

// BTN_LEFT
const POINTER_CODE: u16 = 0x110;

/// A device is a keyboard if it has EV_KEY with the QWERTY row, A, Z and SPACE.
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    capabilities.has_ev_key
        && QWERTY_CODES
            .iter()
            .chain(A_Z_SPACE_CODES)
            .all(|code| capabilities.supports_key(*code))
}

/// A device is a pointer if it reports BTN_LEFT.
///
/// Button presses during a hold taint it, so mice and touchpads are watched
/// alongside keyboards.
pub fn is_pointer(capabilities: &DeviceCapabilities) -> bool {
    capabilities.has_ev_key && capabilities.supports_key(POINTER_CODE)
}

/// Check if a device is a virtual device based on its name.
///
/// Our own output device must never be read back, or every emission would
/// be fed to the engine as an Other key press.
pub fn is_virtual_device(name: &str, marker: &str) -> bool {
    name.contains(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keyboard_caps() -> DeviceCapabilities {
        let mut keys = vec![1, 2, 3, 14, 15, 28, 29, 42, 56, 125];
        keys.extend_from_slice(QWERTY_CODES);
        keys.extend_from_slice(A_Z_SPACE_CODES);
        DeviceCapabilities::new(true, keys)
    }

    fn make_mouse_caps() -> DeviceCapabilities {
        DeviceCapabilities::new(true, [272, 273, 274]) // BTN_LEFT, BTN_RIGHT, BTN_MIDDLE
    }

    #[test]
    fn test_is_keyboard_with_full_keyboard() {
        assert!(is_keyboard(&make_keyboard_caps()));
        assert!(!is_pointer(&make_keyboard_caps()));
    }

    #[test]
    fn test_is_keyboard_without_space() {
        let caps = DeviceCapabilities::new(true, QWERTY_CODES.iter().copied().chain([30, 44]));
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_is_keyboard_with_no_ev_key() {
        let mut caps = make_keyboard_caps();
        caps.has_ev_key = false;
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_mouse_is_pointer_not_keyboard() {
        let caps = make_mouse_caps();
        assert!(is_pointer(&caps));
        assert!(!is_keyboard(&caps));
    }

    #[test]
    fn test_is_virtual_device() {
        assert!(is_virtual_device("Space2Super (virtual) Keyboard", VIRTUAL_DEVICE_MARKER));
        assert!(!is_virtual_device("Space2Super Keyboard", VIRTUAL_DEVICE_MARKER));
        assert!(!is_virtual_device("Logitech USB Keyboard", VIRTUAL_DEVICE_MARKER));
    }
}
