//! Codes carried inside a control frame.

/// Device-side cooperative bus lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LockType {
    Released = 0,
    Exclusive = 1,
    Shared = 2,
}

impl LockType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Bus operation requested by a control frame (byte 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BusCommand {
    Write = 0,
    Read = 1,
    Transfer = 2,
    Scan = 3,
}

impl BusCommand {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Returns the firmware name for a decoded result command id.
///
/// Id 5 has no assigned name and renders as `UNKNOWN`, like any other
/// unmapped id.
pub fn command_name(command_id: i64) -> &'static str {
    match command_id {
        1 => "DATA_BUNDLE",
        2 => "CS",
        3 => "COMMAND",
        4 => "LOCK",
        6 => "POWER",
        7 => "SIZE",
        8 => "ADDRESS",
        _ => "UNKNOWN",
    }
}
