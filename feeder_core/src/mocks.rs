//! Test and helper doubles for the hardware seams.

use feeder_traits::{Direction, MotorDrive, SpeedSample, Switch, Tachometer};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Tachometer that replays a fixed sample sequence, then repeats the last
/// sample (same timestamp, so trailing reads are stale by construction).
pub struct ScriptedTach {
    samples: Vec<SpeedSample>,
    idx: usize,
}

impl ScriptedTach {
    pub fn new(samples: impl Into<Vec<SpeedSample>>) -> Self {
        Self {
            samples: samples.into(),
            idx: 0,
        }
    }

    /// Evenly spaced samples: `rpms[i]` stamped `start_us + i * spacing_us`.
    pub fn ramp(rpms: &[f64], start_us: u64, spacing_us: u64) -> Self {
        let samples = rpms
            .iter()
            .enumerate()
            .map(|(i, &rpm)| SpeedSample {
                rpm,
                timestamp_us: start_us + (i as u64) * spacing_us,
            })
            .collect::<Vec<_>>();
        Self::new(samples)
    }
}

impl Tachometer for ScriptedTach {
    fn get_speed(&mut self) -> Result<SpeedSample, Box<dyn Error + Send + Sync>> {
        let sample = if self.idx < self.samples.len() {
            let s = self.samples[self.idx];
            self.idx += 1;
            s
        } else {
            self.samples.last().copied().unwrap_or(SpeedSample {
                rpm: 0.0,
                timestamp_us: 0,
            })
        };
        Ok(sample)
    }
}

/// Everything the spy drive observed, in command order.
#[derive(Debug, Default, Clone)]
pub struct DriveLog {
    pub duties: Vec<f32>,
    pub directions: Vec<Direction>,
}

/// Drive spy recording every duty and direction command. Clone the spy
/// before handing it to the controller to keep an inspection handle.
#[derive(Default, Clone)]
pub struct SpyDrive {
    log: Arc<Mutex<DriveLog>>,
}

impl SpyDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> DriveLog {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.log
            .lock()
            .ok()
            .and_then(|g| g.duties.last().copied())
    }

    pub fn direction_writes(&self) -> Vec<Direction> {
        self.log
            .lock()
            .map(|g| g.directions.clone())
            .unwrap_or_default()
    }
}

impl MotorDrive for SpyDrive {
    fn set_duty(&mut self, duty: f32) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Ok(mut g) = self.log.lock() {
            g.duties.push(duty);
        }
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Ok(mut g) = self.log.lock() {
            g.directions.push(direction);
        }
        Ok(())
    }
}

/// Switch spy recording state transitions.
#[derive(Default, Clone)]
pub struct SpySwitch {
    states: Arc<Mutex<Vec<bool>>>,
}

impl SpySwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<bool> {
        self.states.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Switch for SpySwitch {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Ok(mut g) = self.states.lock() {
            g.push(on);
        }
        Ok(())
    }
}

/// Tachometer that always errors; for driving error-path tests.
pub struct FaultyTach;

impl Tachometer for FaultyTach {
    fn get_speed(&mut self) -> Result<SpeedSample, Box<dyn Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("tachometer offline")))
    }
}
