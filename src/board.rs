//! Board bring-up shared by both images
//!
//! The two nodes differ only in which GPIO carries which I2C signal, so the
//! bus setup takes the pins as parameters.

use embassy_time::{Duration, Timer};
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::{i2c::master::Config as I2cConfig, time::Rate};
use log::{LevelFilter, info};

/// Route `log` output to UART0.
///
/// The bootloader leaves the console at 115200 baud.
pub fn init_logger() {
    esp_println::logger::init_logger(LevelFilter::Info);
}

/// Initialize the I2C bus hardware
///
/// Creates I2C0 as a bus master on the given pins.
pub fn create_i2c_bus<'d>(
    i2c0: esp_hal::peripherals::I2C0<'d>,
    sda: impl PeripheralOutput<'d>,
    scl: impl PeripheralOutput<'d>,
    frequency_khz: u32,
) -> esp_hal::i2c::master::I2c<'d, esp_hal::Async> {
    let bus = esp_hal::i2c::master::I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(frequency_khz)),
    )
    .expect("I2C bus frequency out of range")
    .with_sda(sda)
    .with_scl(scl)
    .into_async();
    info!("I2C bus ready at {} kHz", frequency_khz);
    bus
}

/// Park the image after a fatal startup error.
///
/// The executor keeps running so the console stays responsive.
pub async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
