//! Devices addressed by a run
//!
//! The runner only needs a device's serial number, which it forwards to the
//! CLI. Talking to the device is the CLI's job.

/// A device the CLI should drive
pub trait Device {
    fn serial_number(&self) -> &str;
}

/// A device known only by its serial number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialDevice(pub String);

impl Device for SerialDevice {
    fn serial_number(&self) -> &str {
        &self.0
    }
}

impl Device for String {
    fn serial_number(&self) -> &str {
        self
    }
}

impl Device for &str {
    fn serial_number(&self) -> &str {
        self
    }
}
