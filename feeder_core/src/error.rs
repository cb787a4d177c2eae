use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControlError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("sensor fault: {0}")]
    Sensor(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Map any error surfaced at a hardware seam to a typed ControlError, with
/// special handling for typed hardware errors when the backend is linked in.
pub(crate) fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<feeder_hardware::HwError>() {
        return ControlError::HardwareFault(hw.to_string());
    }
    ControlError::Hardware(e.to_string())
}
