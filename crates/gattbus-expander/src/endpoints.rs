//! Well-known GATT identifiers of the expander service.

/// Expander GATT service.
pub const SERVICE_UUID: &str = "ac866789-aaaa-eeee-a329-969d4bc8621e";

/// Control frames are written here.
pub const DATA_BUNDLE_UUID: &str = "0000a001-0000-1000-8000-00805f9b34fb";

/// Bytes clocked in from the bus by the last frame.
pub const MISO_UUID: &str = "0000a002-0000-1000-8000-00805f9b34fb";

/// Result code of the last frame, published as a notification.
pub const RESULT_UUID: &str = "0000a006-0000-1000-8000-00805f9b34fb";
