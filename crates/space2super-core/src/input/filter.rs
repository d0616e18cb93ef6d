// Space2Super Input Layer - Device Filtering
// Device matching for autodetection and manual filtering

/// Check if a device should be watched.
///
/// 1. If filter names are given, only devices matching by path or name
///    are used (virtual devices included, the user asked for them).
/// 2. Otherwise virtual devices are skipped and only keyboards and
///    pointers are used.
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    is_input_device: bool,
    is_virtual: bool,
) -> bool {
    if !filter_names.is_empty() {
        return filter_names
            .iter()
            .any(|match_name| device_path == match_name || device_name == match_name);
    }

    !is_virtual && is_input_device
}
