//! Lock-free published state shared across contexts.
//!
//! Single-writer discipline: every cell here has exactly one writing context
//! (noted per field); any context may read. Cells are native atomic-width
//! scalars, so no locks sit between the interrupt-side input handling, the
//! control loop and the telemetry reader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// f32 published through its bit pattern in an `AtomicU32`.
#[derive(Debug, Default)]
pub struct SharedF32(AtomicU32);

impl SharedF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    #[inline]
    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Controller outputs, written only by the control-loop context and read by
/// the low-priority telemetry context.
#[derive(Debug, Default)]
pub struct Telemetry {
    pub comp_volt: SharedF32,
    pub speed_volt: SharedF32,
    pub error_volt: SharedF32,
    pub adj_error_volt: SharedF32,
    pub ref_rpm: SharedF32,
    pub steady: AtomicBool,
    pub steady_count: AtomicU32,
}

impl Telemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Operator-side inputs consumed by the control loop.
#[derive(Debug, Default)]
pub struct OperatorInputs {
    /// Motor enable; written only by the panel context.
    pub motor_enabled: AtomicBool,
    /// Torch/solenoid demand; written only by the panel context.
    pub torch_demand: AtomicBool,
    /// Signed reference command in [-1, 1]; written only by the knob owner.
    pub reference: SharedF32,
}

impl OperatorInputs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}
