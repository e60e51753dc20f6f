//! Motion sensor abstraction
//!
//! The reconnection monitor only needs three things from a sensor: detect it,
//! apply settings, read six values. [`ImuSensor`] captures that so the
//! monitor can run against the real MPU6050 or a scripted fake.

pub mod mpu6050;

use core::fmt;
use core::future::Future;

use thiserror_no_std::Error;

use crate::config::ImuSettings;

pub use mpu6050::Mpu6050;

/// Standard gravity in m/s² per g.
pub const STANDARD_GRAVITY: f32 = 9.80665;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} not found (WHO_AM_I read {found:#04x})")]
    NotFound { sensor: &'static str, found: u8 },
    #[error("{sensor} failed to {operation}: I2C communication error")]
    Bus {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor} stuck in {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// Accelerometer full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// AFS_SEL field value.
    pub const fn bits(self) -> u8 {
        match self {
            Self::G2 => 0,
            Self::G4 => 1,
            Self::G8 => 2,
            Self::G16 => 3,
        }
    }

    /// Raw counts per g.
    pub const fn lsb_per_g(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}

/// Gyroscope full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// FS_SEL field value.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Dps250 => 0,
            Self::Dps500 => 1,
            Self::Dps1000 => 2,
            Self::Dps2000 => 3,
        }
    }

    /// Raw counts per degree/second.
    pub const fn lsb_per_dps(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

/// Digital low-pass filter cutoff (accelerometer figure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBandwidth {
    Hz260,
    Hz184,
    Hz94,
    Hz44,
    Hz21,
    Hz10,
    Hz5,
}

impl FilterBandwidth {
    /// DLPF_CFG field value.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Hz260 => 0,
            Self::Hz184 => 1,
            Self::Hz94 => 2,
            Self::Hz44 => 3,
            Self::Hz21 => 4,
            Self::Hz10 => 5,
            Self::Hz5 => 6,
        }
    }
}

/// Three-axis vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Axes {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Axes {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One accelerometer + gyroscope sample.
///
/// Acceleration is in m/s², rotation in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReading {
    pub acceleration: Axes,
    pub rotation: Axes,
}

impl MotionReading {
    pub const ZERO: Self = Self::new(Axes::ZERO, Axes::ZERO);

    pub const fn new(acceleration: Axes, rotation: Axes) -> Self {
        Self {
            acceleration,
            rotation,
        }
    }

    /// The six components in print order.
    pub const fn components(&self) -> [f32; 6] {
        [
            self.acceleration.x,
            self.acceleration.y,
            self.acceleration.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ]
    }

    /// True when every component is exactly zero.
    ///
    /// This is how a detached MPU6050 shows up, but it is only a heuristic:
    /// a sensor in free fall with no rotation reads the same.
    pub fn is_all_zero(&self) -> bool {
        self.components().iter().all(|value| *value == 0.0)
    }
}

impl fmt::Display for MotionReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.acceleration;
        let g = self.rotation;
        write!(
            f,
            "Accel: {:.2}, {:.2}, {:.2} | Gyro: {:.2}, {:.2}, {:.2}",
            a.x, a.y, a.z, g.x, g.y, g.z
        )
    }
}

/// Combined accelerometer/gyroscope on a bus.
pub trait ImuSensor {
    /// Detect and reset the part. Used at boot and for every reconnection attempt.
    fn initialize(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Apply range and filter settings.
    fn configure(
        &mut self,
        settings: &ImuSettings,
    ) -> impl Future<Output = Result<(), SensorError>>;

    /// Read one sample.
    fn read(&mut self) -> impl Future<Output = Result<MotionReading, SensorError>>;
}
