//! Steady-state detection over the compensation-voltage sequence.

/// Detector tuning.
#[derive(Debug, Clone)]
pub struct SteadyCfg {
    /// Max |Δ compensation| between accepted cycles to count as quiet.
    pub epsilon: f32,
    /// Consecutive quiet cycles required before reporting steady.
    pub threshold: u32,
    /// Refuse to report steady while the output rides the 100% rail.
    pub require_unsaturated: bool,
}

impl Default for SteadyCfg {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            threshold: 5,
            require_unsaturated: true,
        }
    }
}

/// An output pinned to the rail is still slewing against the clamp, not
/// holding an operating point.
const SATURATION_CEILING: f32 = 99.99;

/// Counts consecutive accepted cycles whose compensation delta stays under
/// epsilon. Exposes both the boolean and the raw counter.
#[derive(Debug)]
pub struct SteadyStateDetector {
    cfg: SteadyCfg,
    prev_comp: f32,
    count: u32,
}

impl SteadyStateDetector {
    pub fn new(cfg: SteadyCfg) -> Self {
        Self {
            cfg,
            prev_comp: 0.0,
            count: 0,
        }
    }

    /// Feed one accepted cycle's compensation voltage; returns the steady
    /// flag. Any cycle at or over epsilon resets the run to zero.
    pub fn update(&mut self, comp_volt: f32) -> bool {
        if (comp_volt - self.prev_comp).abs() < self.cfg.epsilon {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
        self.prev_comp = comp_volt;
        self.is_steady()
    }

    pub fn is_steady(&self) -> bool {
        self.count >= self.cfg.threshold
            && (!self.cfg.require_unsaturated || self.prev_comp < SATURATION_CEILING)
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
