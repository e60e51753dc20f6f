//! Hardware-independent core library for nodecheck
//!
//! nodecheck is a pair of bring-up images for a sensor node: one polls an
//! MPU6050 over I2C and keeps trying to reconnect when it drops off the bus,
//! the other proves an SSD1306 OLED is alive by drawing a counter.
//!
//! Everything that does not touch ESP32 registers lives here so it can be
//! unit-tested on the host and reused by the desktop simulator:
//!
//! - [`sensors`]: the [`sensors::ImuSensor`] trait and the MPU6050 driver
//! - [`monitor`]: the connected/lost state machine around a sensor
//! - [`display`]: opening the SSD1306 panel and the two screens
//! - [`counter`]: the display counter loop
//! - [`diagnostics`]: every console message either image prints
//!
//! It is `#![no_std]` and allocation-free.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod counter;
pub mod diagnostics;
pub mod display;
pub mod error;
pub mod monitor;
pub mod sensors;

#[cfg(test)]
mod test_support;

pub use error::StartupError;
