//! Input device and operator console adapters.
//!
//! Two seams between the operator and the teleoperation loop live here:
//!
//! - [`SixAxisDevice`] - a 6-DOF input device (3 translation axes, 3
//!   rotation axes, two buttons). [`AxisMapping`] converts the raw axes
//!   into workspace deltas so the loop never sees device conventions.
//! - [`OperatorConsole`] - discrete operator commands (confirm, save,
//!   discard, quit) polled non-blockingly once per loop iteration.
//!
//! [`ScriptedDevice`] and [`QueuedConsole`] are deterministic
//! implementations for tests and headless runs; [`KeyboardConsole`]
//! reads a real terminal.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod console;
mod device;
mod error;

pub use console::{KeyboardConsole, OperatorCommand, OperatorConsole, QueuedConsole};
pub use device::{AxisMapping, DeviceState, ScriptedDevice, SixAxisDevice};
pub use error::DeviceError;

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
