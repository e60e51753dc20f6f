//! OLED display support
//!
//! The panel is driven by the `ssd1306` crate in async buffered-graphics
//! mode: `embedded-graphics` draws into a RAM frame and `flush` pushes the
//! changed region over I2C. [`screens`] holds the two frames the gateway
//! image shows.

pub mod screens;

use embedded_hal_async::i2c::I2c;
use log::debug;
use ssd1306::mode::BufferedGraphicsModeAsync;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306Async};

pub const DISPLAY_WIDTH_PX: u32 = 128;
pub const DISPLAY_HEIGHT_PX: u32 = 64;

/// 128x64 SSD1306 on I2C with a local frame buffer.
pub type Panel<I2C> =
    Ssd1306Async<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsModeAsync<DisplaySize128x64>>;

/// Run the panel power-up sequence at `address`.
///
/// A panel that does not acknowledge hands the bus back so another address
/// can be tried.
pub async fn open_panel<I2C: I2c>(i2c: I2C, address: u8) -> Result<Panel<I2C>, I2C> {
    let mut panel = Ssd1306Async::new(
        I2CDisplayInterface::new_custom_address(i2c, address),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();

    match panel.init().await {
        Ok(()) => Ok(panel),
        Err(e) => {
            debug!("SSD1306 init at {:#04x} failed: {:?}", address, e);
            Err(panel.release().release())
        }
    }
}
