//! InvenSense MPU6050 accelerometer/gyroscope driver
//!
//! Async driver over `embedded-hal-async` I2C. Only the pieces the bring-up
//! image needs: detect/reset, full-scale ranges, low-pass filter and a burst
//! read of the six motion axes.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::debug;

use super::{
    AccelRange, Axes, FilterBandwidth, GyroRange, ImuSensor, MotionReading, STANDARD_GRAVITY,
    SensorError,
};
use crate::config::ImuSettings;

/// Address with AD0 tied low.
pub const DEFAULT_ADDRESS: u8 = 0x68;

const SENSOR: &str = "MPU6050";
const WHO_AM_I_VALUE: u8 = 0x68;
const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

/// Register map (MPU-6000/6050 register map, rev 4.2)
mod reg {
    pub const SMPLRT_DIV: u8 = 0x19;
    pub const CONFIG: u8 = 0x1A;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const SIGNAL_PATH_RESET: u8 = 0x68;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const WHO_AM_I: u8 = 0x75;
}

const PWR_DEVICE_RESET: u8 = 0x80;
const PWR_CLOCK_PLL_XGYRO: u8 = 0x01;
const SIGNAL_PATH_RESET_ALL: u8 = 0x07;
const FULL_SCALE_SHIFT: u8 = 3;
const FULL_SCALE_MASK: u8 = 0b0001_1000;
const DLPF_MASK: u8 = 0b0000_0111;

/// Polls of the reset bit before giving up (1 ms apart).
const RESET_POLL_LIMIT: u32 = 100;
const SETTLE_MS: u32 = 100;

/// Accel (6) + temperature (2) + gyro (6).
const BURST_LEN: usize = 14;

pub struct Mpu6050<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    accel_range: AccelRange,
    gyro_range: GyroRange,
}

impl<I: I2c, D: DelayNs> Mpu6050<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            accel_range: AccelRange::G2,
            gyro_range: GyroRange::Dps250,
        }
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    pub fn accel_range(&self) -> AccelRange {
        self.accel_range
    }

    pub fn gyro_range(&self) -> GyroRange {
        self.gyro_range
    }

    /// Detect, reset and bring the part up with its power-on ranges.
    ///
    /// Leaves the sensor at ±2 g, ±500 °/s, 260 Hz bandwidth, running off
    /// the X-gyro PLL.
    pub async fn begin(&mut self) -> Result<(), SensorError> {
        let id = self.read_register(reg::WHO_AM_I, "read WHO_AM_I").await?;
        if id != WHO_AM_I_VALUE {
            debug!("{} answered with unexpected id {:#04x}", SENSOR, id);
            return Err(SensorError::NotFound {
                sensor: SENSOR,
                found: id,
            });
        }

        self.write_register(reg::PWR_MGMT_1, PWR_DEVICE_RESET, "reset")
            .await?;
        self.wait_for_reset().await?;
        self.delay.delay_ms(SETTLE_MS).await;

        self.write_register(
            reg::SIGNAL_PATH_RESET,
            SIGNAL_PATH_RESET_ALL,
            "reset signal paths",
        )
        .await?;
        self.delay.delay_ms(SETTLE_MS).await;

        self.write_register(reg::SMPLRT_DIV, 0, "set sample rate divider")
            .await?;
        self.set_filter_bandwidth(FilterBandwidth::Hz260).await?;
        self.set_gyro_range(GyroRange::Dps500).await?;
        self.set_accel_range(AccelRange::G2).await?;

        self.write_register(reg::PWR_MGMT_1, PWR_CLOCK_PLL_XGYRO, "select clock")
            .await?;
        self.delay.delay_ms(SETTLE_MS).await;
        Ok(())
    }

    /// The reset bit clears itself once the part has rebooted.
    async fn wait_for_reset(&mut self) -> Result<(), SensorError> {
        for _ in 0..RESET_POLL_LIMIT {
            let power = self
                .read_register(reg::PWR_MGMT_1, "poll reset state")
                .await?;
            if power & PWR_DEVICE_RESET == 0 {
                return Ok(());
            }
            self.delay.delay_ms(1).await;
        }
        Err(SensorError::Timeout {
            sensor: SENSOR,
            operation: "device reset",
        })
    }

    pub async fn set_accel_range(&mut self, range: AccelRange) -> Result<(), SensorError> {
        self.update_register(
            reg::ACCEL_CONFIG,
            FULL_SCALE_MASK,
            range.bits() << FULL_SCALE_SHIFT,
            "set accelerometer range",
        )
        .await?;
        self.accel_range = range;
        Ok(())
    }

    pub async fn set_gyro_range(&mut self, range: GyroRange) -> Result<(), SensorError> {
        self.update_register(
            reg::GYRO_CONFIG,
            FULL_SCALE_MASK,
            range.bits() << FULL_SCALE_SHIFT,
            "set gyroscope range",
        )
        .await?;
        self.gyro_range = range;
        Ok(())
    }

    pub async fn set_filter_bandwidth(
        &mut self,
        bandwidth: FilterBandwidth,
    ) -> Result<(), SensorError> {
        self.update_register(
            reg::CONFIG,
            DLPF_MASK,
            bandwidth.bits(),
            "set filter bandwidth",
        )
        .await
    }

    /// Burst-read accelerometer and gyroscope, scaled to m/s² and rad/s.
    pub async fn read_motion(&mut self) -> Result<MotionReading, SensorError> {
        let mut raw = [0u8; BURST_LEN];
        self.i2c
            .write_read(self.address, &[reg::ACCEL_XOUT_H], &mut raw)
            .await
            .map_err(|e| {
                debug!("{} burst read failed: {:?}", SENSOR, e);
                SensorError::Bus {
                    sensor: SENSOR,
                    operation: "read motion data",
                }
            })?;

        let word = |offset: usize| f32::from(i16::from_be_bytes([raw[offset], raw[offset + 1]]));
        let accel_scale = STANDARD_GRAVITY / self.accel_range.lsb_per_g();
        let gyro_scale = DEG_TO_RAD / self.gyro_range.lsb_per_dps();

        // Bytes 6..8 hold the die temperature.
        Ok(MotionReading::new(
            Axes::new(
                word(0) * accel_scale,
                word(2) * accel_scale,
                word(4) * accel_scale,
            ),
            Axes::new(
                word(8) * gyro_scale,
                word(10) * gyro_scale,
                word(12) * gyro_scale,
            ),
        ))
    }

    async fn read_register(
        &mut self,
        register: u8,
        operation: &'static str,
    ) -> Result<u8, SensorError> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .await
            .map_err(|e| {
                debug!("{} {} failed: {:?}", SENSOR, operation, e);
                SensorError::Bus {
                    sensor: SENSOR,
                    operation,
                }
            })?;
        Ok(value[0])
    }

    async fn write_register(
        &mut self,
        register: u8,
        value: u8,
        operation: &'static str,
    ) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[register, value])
            .await
            .map_err(|e| {
                debug!("{} {} failed: {:?}", SENSOR, operation, e);
                SensorError::Bus {
                    sensor: SENSOR,
                    operation,
                }
            })
    }

    async fn update_register(
        &mut self,
        register: u8,
        mask: u8,
        bits: u8,
        operation: &'static str,
    ) -> Result<(), SensorError> {
        let current = self.read_register(register, operation).await?;
        self.write_register(register, (current & !mask) | (bits & mask), operation)
            .await
    }
}

impl<I: I2c, D: DelayNs> ImuSensor for Mpu6050<I, D> {
    async fn initialize(&mut self) -> Result<(), SensorError> {
        self.begin().await
    }

    async fn configure(&mut self, settings: &ImuSettings) -> Result<(), SensorError> {
        self.set_accel_range(settings.accel_range).await?;
        self.set_gyro_range(settings.gyro_range).await?;
        self.set_filter_bandwidth(settings.bandwidth).await
    }

    async fn read(&mut self) -> Result<MotionReading, SensorError> {
        self.read_motion().await
    }
}
