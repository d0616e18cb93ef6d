// Space2Super evdev Event Loop
// Passive observation of keyboard and pointer devices

use evdev::{Device, EventType};
use std::os::unix::io::AsRawFd;

use super::source::{EventBatch, EventSource};
use crate::input::{
    is_keyboard, is_pointer, is_virtual_device, matches_device_filter, DeviceCapabilities,
    RawEvent, VIRTUAL_DEVICE_MARKER,
};

/// Result type for event loop operations
pub type EventLoopResult<T> = Result<T, EventLoopError>;

/// Errors that can occur in event loop
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a device contributes to the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DeviceKind {
    #[strum(serialize = "keyboard")]
    Keyboard,
    #[strum(serialize = "pointer")]
    Pointer,
    #[strum(serialize = "keyboard+pointer")]
    Both,
    #[strum(serialize = "other")]
    Other,
}

impl DeviceKind {
    fn of(capabilities: &DeviceCapabilities) -> Self {
        match (is_keyboard(capabilities), is_pointer(capabilities)) {
            (true, true) => DeviceKind::Both,
            (true, false) => DeviceKind::Keyboard,
            (false, true) => DeviceKind::Pointer,
            (false, false) => DeviceKind::Other,
        }
    }

    fn is_input(self) -> bool {
        self != DeviceKind::Other
    }
}

/// Device information for listing devices
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub path: Option<String>,
    pub kind: DeviceKind,
}

/// Event loop over every watched evdev device.
///
/// Devices are opened without grabbing: the host keeps receiving every
/// event, and the daemon only observes, the way an X RECORD client does.
pub struct EventLoop {
    devices: Vec<Device>,
    poll_fds: Vec<libc::pollfd>,
}

impl EventLoop {
    /// Watch every keyboard and pointer device
    pub fn new() -> EventLoopResult<Self> {
        Self::new_filtered(&[])
    }

    /// Watch devices matching the given names/paths (empty = autodetect)
    pub fn new_filtered(filter_names: &[String]) -> EventLoopResult<Self> {
        let devices = Self::find_devices(filter_names)?;
        let poll_fds = Self::create_poll_fds(&devices);
        for device in &devices {
            log::info!("Watching input device '{}'", device.name().unwrap_or("Unknown"));
        }
        Ok(Self { devices, poll_fds })
    }

    fn create_poll_fds(devices: &[Device]) -> Vec<libc::pollfd> {
        devices
            .iter()
            .map(|d| libc::pollfd {
                fd: d.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect()
    }

    fn capabilities(device: &Device) -> DeviceCapabilities {
        let has_ev_key = device.supported_events().contains(EventType::KEY);
        let keys = device
            .supported_keys()
            .map(|keys| keys.iter().map(|k| k.code()).collect::<Vec<_>>())
            .unwrap_or_default();
        DeviceCapabilities::new(has_ev_key, keys)
    }

    /// List all keyboard and pointer devices (for --list-devices)
    pub fn list_devices() -> EventLoopResult<Vec<DeviceInfo>> {
        let mut devices_info = Vec::new();

        for (path, device) in evdev::enumerate() {
            let name = device.name().unwrap_or("Unknown").to_string();
            let kind = DeviceKind::of(&Self::capabilities(&device));
            if !kind.is_input() || is_virtual_device(&name, VIRTUAL_DEVICE_MARKER) {
                continue;
            }
            devices_info.push(DeviceInfo {
                index: devices_info.len(),
                name,
                path: path.to_str().map(|s| s.to_string()),
                kind,
            });
        }

        if devices_info.is_empty() {
            return Err(EventLoopError::DeviceNotFound(
                "No keyboard or pointer devices found".to_string(),
            ));
        }

        Ok(devices_info)
    }

    fn find_devices(filter_names: &[String]) -> EventLoopResult<Vec<Device>> {
        let mut found = Vec::new();

        for (path, device) in evdev::enumerate() {
            let device_name = device.name().unwrap_or("Unknown");
            let device_path = path.to_str().unwrap_or_default();
            let kind = DeviceKind::of(&Self::capabilities(&device));
            let is_virtual = is_virtual_device(device_name, VIRTUAL_DEVICE_MARKER);

            if matches_device_filter(
                device_name,
                device_path,
                filter_names,
                kind.is_input(),
                is_virtual,
            ) {
                log::debug!("Selected {} ({}) as {}", device_name, device_path, kind);
                found.push(device);
            }
        }

        if found.is_empty() {
            return Err(EventLoopError::DeviceNotFound(if filter_names.is_empty() {
                "No keyboard or pointer devices found".to_string()
            } else {
                format!("No device matches {:?}", filter_names)
            }));
        }

        Ok(found)
    }

    /// Poll all devices for key events.
    ///
    /// Returns an empty batch on timeout or EINTR (a signal arrived; the
    /// caller re-checks its running flag). Only fatal I/O errors are errors.
    pub fn poll_for_events(&mut self, timeout_ms: i32) -> EventLoopResult<EventBatch> {
        let mut events = EventBatch::new();

        let poll_result = unsafe {
            libc::poll(
                self.poll_fds.as_mut_ptr(),
                self.poll_fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };

        if poll_result < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(events);
            }
            return Err(EventLoopError::Io(err));
        }

        if poll_result == 0 {
            return Ok(events);
        }

        let mut lost = Vec::new();
        for (i, device) in self.devices.iter_mut().enumerate() {
            let revents = self.poll_fds[i].revents;
            if revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
                lost.push(i);
                continue;
            }
            if revents & libc::POLLIN == 0 {
                continue;
            }
            let device_name = device.name().unwrap_or("Unknown").to_string();
            match device.fetch_events() {
                Ok(device_events) => {
                    events.extend(device_events.filter_map(|event| {
                        RawEvent::from_evdev(event.event_type().0, event.code(), event.value())
                    }));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    log::warn!("Failed to read from '{}': {}", device_name, e);
                    lost.push(i);
                }
            }
        }

        if !lost.is_empty() {
            self.drop_devices(&lost)?;
        }

        Ok(events)
    }

    /// Forget devices that went away (unplugged or revoked)
    fn drop_devices(&mut self, indices: &[usize]) -> EventLoopResult<()> {
        for &i in indices.iter().rev() {
            let device = self.devices.remove(i);
            log::warn!(
                "Input device '{}' disconnected",
                device.name().unwrap_or("Unknown")
            );
        }
        self.poll_fds = Self::create_poll_fds(&self.devices);

        if self.devices.is_empty() {
            return Err(EventLoopError::DeviceNotFound(
                "All watched input devices disconnected".to_string(),
            ));
        }
        Ok(())
    }

    pub fn device_names(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|d| d.name().unwrap_or("Unknown").to_string())
            .collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl EventSource for EventLoop {
    type Error = EventLoopError;

    fn poll_events(&mut self, timeout_ms: i32) -> Result<EventBatch, Self::Error> {
        self.poll_for_events(timeout_ms)
    }
}
