//! Error types used by the scheduling core and the position capability.
//!
//! This module defines two main error enums:
//!
//! - [`SchedulerError`] — configuration and lifecycle errors raised by the
//!   task layer (the lower-level timer source is deliberately more tolerant,
//!   see [`crate::source`]).
//! - [`DeviceError`] — errors surfaced by a [`PositionDevice`](crate::actuator::PositionDevice)
//!   implementation, propagated to callers of `read`/`write`/`position`.
//!
//! Both types provide `as_label()` for short stable identifiers in logs.

use thiserror::Error;

/// # Errors produced by the task and scheduler layer.
///
/// The task layer is strict where the timer source is tolerant: a
/// non-positive frequency or a zero period registers a structurally dead
/// entry at the source level, but fails with [`SchedulerError::InvalidRate`]
/// here.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A non-positive frequency or zero period was supplied to `init`.
    #[error("invalid rate: {detail}")]
    InvalidRate {
        /// Human-readable description of the offending value.
        detail: String,
    },

    /// An operation required a configured task, but `init` was never called
    /// (or `deinit` already cleared the configuration).
    #[error("task is not initialized")]
    NotInitialized,
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use tickmux::SchedulerError;
    ///
    /// let err = SchedulerError::NotInitialized;
    /// assert_eq!(err.as_label(), "scheduler_not_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::InvalidRate { .. } => "scheduler_invalid_rate",
            SchedulerError::NotInitialized => "scheduler_not_initialized",
        }
    }
}

/// # Errors produced by a position capability.
///
/// Implementations (GPIO-PWM, I2C PWM driver chips, in-memory test devices)
/// report out-of-range channel lookups through this type.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The requested channel index does not exist on the device.
    #[error("channel {channel} out of range (device has {channels})")]
    ChannelOutOfRange {
        /// The offending channel index.
        channel: usize,
        /// Number of channels the device actually exposes.
        channels: usize,
    },

    /// No device is currently attached to the actuator.
    #[error("no device attached")]
    Detached,

    /// The device is attached but could not complete the operation.
    #[error("device io failed: {detail}")]
    Io {
        /// Backend-specific description.
        detail: String,
    },
}

impl DeviceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeviceError::ChannelOutOfRange { .. } => "device_channel_out_of_range",
            DeviceError::Detached => "device_detached",
            DeviceError::Io { .. } => "device_io",
        }
    }
}
