//! Position capability interface and an in-memory implementation.

use std::sync::{Mutex, PoisonError};

use crate::error::DeviceError;

/// # Position capability consumed by the scheduling core.
///
/// Channel-indexed numeric positions (degrees for the servo case). Real
/// implementations wrap GPIO-PWM duty registers or an I2C-addressed PWM
/// driver chip; this crate never implements those, it only consumes the
/// interface.
///
/// Implementations must be callable from the tick context: short,
/// non-blocking, and safe to share.
pub trait PositionDevice: Send + Sync + 'static {
    /// Number of channels the device exposes.
    fn channels(&self) -> usize;

    /// Reads the current position of `channel`.
    fn read(&self, channel: usize) -> Result<f64, DeviceError>;

    /// Writes a position to `channel`.
    fn write(&self, channel: usize, value: f64) -> Result<(), DeviceError>;
}

/// In-memory position device for tests and demos.
///
/// # Example
/// ```
/// use tickmux::actuator::{MemoryDevice, PositionDevice};
///
/// let dev = MemoryDevice::new(4);
/// dev.write(2, 90.0).unwrap();
/// assert_eq!(dev.read(2).unwrap(), 90.0);
/// assert!(dev.read(4).is_err());
/// ```
pub struct MemoryDevice {
    cells: Mutex<Vec<f64>>,
}

impl MemoryDevice {
    /// Creates a device with `channels` positions, all zeroed.
    pub fn new(channels: usize) -> Self {
        Self {
            cells: Mutex::new(vec![0.0; channels]),
        }
    }
}

impl PositionDevice for MemoryDevice {
    fn channels(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn read(&self, channel: usize) -> Result<f64, DeviceError> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells
            .get(channel)
            .copied()
            .ok_or(DeviceError::ChannelOutOfRange {
                channel,
                channels: cells.len(),
            })
    }

    fn write(&self, channel: usize, value: f64) -> Result<(), DeviceError> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        let channels = cells.len();
        match cells.get_mut(channel) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(DeviceError::ChannelOutOfRange { channel, channels }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_read_and_write() {
        let dev = MemoryDevice::new(2);
        assert!(matches!(
            dev.read(2),
            Err(DeviceError::ChannelOutOfRange { channel: 2, channels: 2 })
        ));
        assert!(dev.write(5, 1.0).is_err());
    }

    #[test]
    fn test_roundtrip_within_range() {
        let dev = MemoryDevice::new(3);
        dev.write(0, 180.0).unwrap();
        assert_eq!(dev.read(0).unwrap(), 180.0);
        assert_eq!(dev.read(1).unwrap(), 0.0);
    }
}
