//! Synthetic MPU6050 that gets unplugged on a schedule.

use nodecheck_core::config::ImuSettings;
use nodecheck_core::sensors::{Axes, ImuSensor, MotionReading, STANDARD_GRAVITY, SensorError};

/// Polls the sensor stays attached, then polls it stays detached.
#[derive(Debug, Clone, Copy)]
pub struct Dropouts {
    pub attached: u32,
    pub detached: u32,
}

pub struct SyntheticImu {
    schedule: Dropouts,
    tick: u32,
}

impl SyntheticImu {
    pub fn new(schedule: Dropouts) -> Self {
        Self {
            schedule,
            tick: 0,
        }
    }

    fn attached(&self) -> bool {
        let period = self.schedule.attached + self.schedule.detached;
        period == 0 || self.tick % period < self.schedule.attached
    }

    /// A board slowly rocking about X while resting flat.
    fn sample(&self) -> MotionReading {
        let t = self.tick as f32 * 0.5;
        let tilt = 0.3 * (t / 3.0).sin();
        MotionReading::new(
            Axes::new(
                STANDARD_GRAVITY * tilt.sin(),
                0.02 * (t * 1.7).cos(),
                STANDARD_GRAVITY * tilt.cos(),
            ),
            Axes::new(0.1 * (t / 3.0).cos(), -0.003, 0.001),
        )
    }
}

impl ImuSensor for SyntheticImu {
    async fn initialize(&mut self) -> Result<(), SensorError> {
        if self.attached() {
            Ok(())
        } else {
            Err(SensorError::NotFound {
                sensor: "MPU6050",
                found: 0xFF,
            })
        }
    }

    async fn configure(&mut self, settings: &ImuSettings) -> Result<(), SensorError> {
        log::debug!("simulated sensor configured: {:?}", settings);
        Ok(())
    }

    async fn read(&mut self) -> Result<MotionReading, SensorError> {
        let reading = if self.attached() {
            self.sample()
        } else {
            MotionReading::ZERO
        };
        self.tick = self.tick.wrapping_add(1);
        Ok(reading)
    }
}
