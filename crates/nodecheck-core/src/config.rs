//! Compile-time board configuration for the two bring-up images
//!
//! Neither image has a runtime configuration surface. The values below are
//! the wiring and timing of the physical nodes and are baked into the
//! firmware.

use crate::diagnostics::WiringHint;
use crate::sensors::{AccelRange, FilterBandwidth, GyroRange};

/// SSD1306 address with SA0 tied low.
pub const OLED_PRIMARY_ADDRESS: u8 = 0x3C;

/// SSD1306 address with SA0 tied high.
pub const OLED_FALLBACK_ADDRESS: u8 = 0x3D;

/// GPIO numbers of the two-wire bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cPins {
    pub sda: u8,
    pub scl: u8,
}

/// Measurement settings applied after every successful sensor (re)initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuSettings {
    pub accel_range: AccelRange,
    pub gyro_range: GyroRange,
    pub bandwidth: FilterBandwidth,
}

impl ImuSettings {
    /// ±8 g, ±500 °/s, 21 Hz low-pass.
    pub const BRINGUP: Self = Self {
        accel_range: AccelRange::G8,
        gyro_range: GyroRange::Dps500,
        bandwidth: FilterBandwidth::Hz21,
    };
}

impl Default for ImuSettings {
    fn default() -> Self {
        Self::BRINGUP
    }
}

/// Sensor node: MPU6050 reconnection monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuNodeConfig {
    pub pins: I2cPins,
    pub bus_frequency_khz: u32,
    pub settings: ImuSettings,
    /// Wait after boot so a freshly attached serial monitor sees the banner.
    pub console_settle_ms: u32,
    /// Pause between "Reading sensor data..." and the first poll.
    pub post_init_ms: u32,
    /// Pacing after a good reading.
    pub poll_interval_ms: u32,
    /// Pacing after every reconnection attempt, successful or not.
    pub retry_delay_ms: u32,
}

impl ImuNodeConfig {
    pub const DEFAULT: Self = Self {
        pins: I2cPins { sda: 22, scl: 21 },
        bus_frequency_khz: 100,
        settings: ImuSettings::BRINGUP,
        console_settle_ms: 2000,
        post_init_ms: 1000,
        poll_interval_ms: 500,
        retry_delay_ms: 500,
    };
}

impl Default for ImuNodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Gateway node: OLED counter.
///
/// Note the bus pins are swapped relative to [`ImuNodeConfig`]; that matches
/// how the two boards are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OledNodeConfig {
    pub pins: I2cPins,
    pub bus_frequency_khz: u32,
    pub primary_address: u8,
    pub fallback_address: u8,
    pub console_settle_ms: u32,
    pub refresh_interval_ms: u32,
}

impl OledNodeConfig {
    pub const DEFAULT: Self = Self {
        pins: I2cPins { sda: 21, scl: 22 },
        bus_frequency_khz: 100,
        primary_address: OLED_PRIMARY_ADDRESS,
        fallback_address: OLED_FALLBACK_ADDRESS,
        console_settle_ms: 2000,
        refresh_interval_ms: 1000,
    };

    /// Wiring checklist printed when no display answers.
    pub const fn wiring_hints(&self) -> [WiringHint; 4] {
        [
            WiringHint::Power {
                signal: "VCC",
                rail: "3V3",
            },
            WiringHint::Power {
                signal: "GND",
                rail: "GND",
            },
            WiringHint::Gpio {
                signal: "SDA",
                gpio: self.pins.sda,
            },
            WiringHint::Gpio {
                signal: "SCL",
                gpio: self.pins.scl,
            },
        ]
    }
}

impl Default for OledNodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_pins_are_swapped_between_boards() {
        let imu = ImuNodeConfig::DEFAULT.pins;
        let oled = OledNodeConfig::DEFAULT.pins;
        assert_eq!(imu.sda, oled.scl);
        assert_eq!(imu.scl, oled.sda);
    }

    #[test]
    fn test_default_pins_match_firmware_gpios() {
        // imu_check routes GPIO22/GPIO21, oled_check GPIO21/GPIO22
        assert_eq!(ImuNodeConfig::DEFAULT.pins, I2cPins { sda: 22, scl: 21 });
        assert_eq!(OledNodeConfig::DEFAULT.pins, I2cPins { sda: 21, scl: 22 });
    }

    #[test]
    fn test_wiring_hints_follow_configured_pins() {
        let mut config = OledNodeConfig::DEFAULT;
        config.pins = I2cPins { sda: 4, scl: 5 };

        let hints = config.wiring_hints();
        assert_eq!(
            hints[2],
            WiringHint::Gpio {
                signal: "SDA",
                gpio: 4
            }
        );
        assert_eq!(
            hints[3],
            WiringHint::Gpio {
                signal: "SCL",
                gpio: 5
            }
        );
    }
}
