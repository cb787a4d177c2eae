//! Real GPIO backends (Raspberry Pi, rppal). Linux only.

use crate::HwError;
use feeder_traits::{Direction, MotorDrive, Switch};
use rppal::gpio::{Gpio, OutputPin};
use std::error::Error;

/// L298N-style H-bridge: software-PWM enable pin plus two direction pins.
pub struct HBridgeDrive {
    en: OutputPin,
    in1: OutputPin,
    in2: OutputPin,
    pwm_hz: f64,
}

impl HBridgeDrive {
    pub fn new(en_pin: u8, in1_pin: u8, in2_pin: u8, pwm_hz: f64) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let open = |pin: u8| -> Result<OutputPin, HwError> {
            Ok(gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output_low())
        };
        Ok(Self {
            en: open(en_pin)?,
            in1: open(in1_pin)?,
            in2: open(in2_pin)?,
            pwm_hz,
        })
    }
}

impl MotorDrive for HBridgeDrive {
    fn set_duty(&mut self, duty: f32) -> Result<(), Box<dyn Error + Send + Sync>> {
        if !duty.is_finite() || !(0.0..=1.0).contains(&duty) {
            return Err(Box::new(HwError::InvalidDuty(duty)));
        }
        self.en
            .set_pwm_frequency(self.pwm_hz, f64::from(duty))
            .map_err(|e| Box::new(HwError::Gpio(e.to_string())) as _)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), Box<dyn Error + Send + Sync>> {
        // IN1 low / IN2 high is clockwise on the deployed wiring.
        match direction {
            Direction::Clockwise => {
                self.in1.set_low();
                self.in2.set_high();
            }
            Direction::CounterClockwise => {
                self.in1.set_high();
                self.in2.set_low();
            }
        }
        tracing::debug!(?direction, "h-bridge direction");
        Ok(())
    }
}

/// Plain GPIO output used for the torch solenoid and indicator LEDs.
pub struct GpioSwitch {
    pin: OutputPin,
}

impl GpioSwitch {
    pub fn new(pin: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self {
            pin: gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output_low(),
        })
    }
}

impl Switch for GpioSwitch {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}
