use crate::types::{DeviceState, Port};

/// Errors that can occur while driving a tracking device.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("Cannot connect tracking device: {0}")]
    Connection(String),

    #[error("Tool count mismatch: {registered} tool(s) registered, device reports {reported} channel(s)")]
    ToolCountMismatch { registered: usize, reported: usize },

    #[error("Tool on port {0} is not connected to the device")]
    ToolNotConnected(Port),

    #[error("Cannot start streaming: {0}")]
    Streaming(String),

    #[error("Hardware error: {0}")]
    Hardware(String),

    #[error("Device does not support {0}")]
    Unsupported(&'static str),

    #[error("Cannot {operation} while device is in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: DeviceState,
    },

    #[error("Acquisition stopped: {0}")]
    Acquisition(String),

    #[error("Failed to spawn acquisition thread: {0}")]
    ThreadSpawn(String),

    #[error("Acquisition thread panicked")]
    AcquisitionPanicked,
}

/// Coarse classification of a [`TrackerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The registered tools do not match what the hardware reports.
    Configuration,
    /// The hardware refused or failed a command.
    Hardware,
    /// The background acquisition thread failed.
    Acquisition,
    /// The operation is not valid in the current device state.
    State,
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::ToolCountMismatch { .. } | TrackerError::ToolNotConnected(_) => {
                ErrorKind::Configuration
            }
            TrackerError::Connection(_)
            | TrackerError::Streaming(_)
            | TrackerError::Hardware(_)
            | TrackerError::Unsupported(_) => ErrorKind::Hardware,
            TrackerError::Acquisition(_)
            | TrackerError::ThreadSpawn(_)
            | TrackerError::AcquisitionPanicked => ErrorKind::Acquisition,
            TrackerError::InvalidState { .. } => ErrorKind::State,
        }
    }

    /// Configuration errors are cured by fixing the tool set and reconnecting.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn is_hardware(&self) -> bool {
        self.kind() == ErrorKind::Hardware
    }
}
