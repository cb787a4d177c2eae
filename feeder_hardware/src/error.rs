use thiserror::Error;

/// Typed hardware errors surfaced by the GPIO backends and the simulator.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("invalid duty cycle: {0}")]
    InvalidDuty(f32),
    #[error("peripheral not present: {0}")]
    NotPresent(&'static str),
}
