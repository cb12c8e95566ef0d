//! # magtrack - acquisition core for magnetic 6DOF tool tracking devices
//!
//! Drives a tracking device (Polhemus Liberty class) through its lifecycle:
//! - Tool registration against hardware ports, validated on connect
//! - Background acquisition thread committing pose snapshots per tool
//! - Hemisphere calibration pass-through
//! - Tool auto-detection
//!
//! The vendor protocol sits behind the [`TrackerHardware`] trait;
//! [`SimulatedTracker`] is an in-process implementation for tests and demos.
//!
//! ## Quick Start
//! ```no_run
//! use magtrack::{SimulatedTracker, TrackerConfig, TrackingDevice};
//! use std::time::Duration;
//!
//! let mut device = TrackingDevice::new(SimulatedTracker::new(vec![1, 2]), TrackerConfig::from_env());
//! device.add_tool("Pointer", 1);
//! device.add_tool("Reference", 2);
//! device.open_connection().unwrap();
//! device.start_tracking().unwrap();
//!
//! for _ in 0..100 {
//!     for tool in device.all_tools() {
//!         let state = tool.snapshot();
//!         println!("{}: valid={} pos={:?}", tool.name(), state.valid, state.pose.position);
//!     }
//!     std::thread::sleep(Duration::from_millis(16));
//! }
//!
//! device.stop_tracking().unwrap();
//! device.close_connection().unwrap();
//! ```

pub mod error;
pub mod types;
pub mod orientation;
pub mod config;
pub mod hardware;
pub mod tool;
pub mod acquisition;
pub mod device;
pub mod simulated;

pub use error::{ErrorKind, TrackerError};
pub use types::*;
pub use config::TrackerConfig;
pub use hardware::TrackerHardware;
pub use tool::{Tool, ToolHandle, ToolRegistry, ToolState};
pub use acquisition::AcquisitionStats;
pub use device::TrackingDevice;
pub use simulated::{SimulatedTracker, SimulatedTrackerHandle};

/// Result type alias for magtrack operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
