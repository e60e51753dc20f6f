//! Gateway OLED counter
//!
//! Finds the panel at its primary address or the fallback, shows a test
//! banner, then redraws a once-a-second counter forever.
//!
//! Only the startup search is checked. Once the panel is up, a failed frame
//! write is logged at debug level and otherwise ignored: the counter and its
//! console line keep going whether or not the panel is still there.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, info};

use crate::config::OledNodeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::display::{Panel, open_panel, screens};
use crate::error::StartupError;

pub struct CounterLoop<I2C> {
    panel: Panel<I2C>,
    address: u8,
    config: OledNodeConfig,
    count: u32,
}

impl<I2C: I2c> CounterLoop<I2C> {
    /// Look for the panel at both addresses and show the banner.
    pub async fn start<D, K>(
        i2c: I2C,
        config: OledNodeConfig,
        delay: &mut D,
        sink: &mut K,
    ) -> Result<Self, StartupError>
    where
        D: DelayNs,
        K: DiagnosticSink,
    {
        delay.delay_ms(config.console_settle_ms).await;
        sink.emit(Diagnostic::OledBanner);

        let Some((mut panel, address)) = Self::find_panel(i2c, &config, sink).await else {
            sink.emit(Diagnostic::CheckConnections);
            for hint in config.wiring_hints() {
                sink.emit(Diagnostic::Wiring(hint));
            }
            return Err(StartupError::DisplayNotFound {
                primary: config.primary_address,
                fallback: config.fallback_address,
            });
        };
        sink.emit(Diagnostic::OledFound { address });

        panel.clear_buffer();
        if let Err(e) = screens::draw_banner(&mut panel) {
            debug!("Banner not drawn: {:?}", e);
        }
        if let Err(e) = panel.flush().await {
            debug!("Banner not shown: {:?}", e);
        }
        sink.emit(Diagnostic::TestPattern);

        Ok(Self {
            panel,
            address,
            config,
            count: 0,
        })
    }

    async fn find_panel<K: DiagnosticSink>(
        i2c: I2C,
        config: &OledNodeConfig,
        sink: &mut K,
    ) -> Option<(Panel<I2C>, u8)> {
        let i2c = match open_panel(i2c, config.primary_address).await {
            Ok(panel) => return Some((panel, config.primary_address)),
            Err(i2c) => i2c,
        };
        sink.emit(Diagnostic::OledNotFound);
        sink.emit(Diagnostic::TryingFallback {
            address: config.fallback_address,
        });

        match open_panel(i2c, config.fallback_address).await {
            Ok(panel) => Some((panel, config.fallback_address)),
            Err(_) => {
                sink.emit(Diagnostic::OledStillNotFound {
                    address: config.fallback_address,
                });
                None
            }
        }
    }

    /// Updates shown so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Address the panel answered on.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Wait one refresh interval, then advance and redraw the counter.
    pub async fn tick<D, K>(&mut self, delay: &mut D, sink: &mut K) -> u32
    where
        D: DelayNs,
        K: DiagnosticSink,
    {
        delay.delay_ms(self.config.refresh_interval_ms).await;
        self.count = self.count.wrapping_add(1);

        self.panel.clear_buffer();
        if let Err(e) = screens::draw_counter(&mut self.panel, self.count) {
            debug!("Frame {} not drawn: {:?}", self.count, e);
        }
        if let Err(e) = self.panel.flush().await {
            debug!("Frame {} not shown: {:?}", self.count, e);
        }

        sink.emit(Diagnostic::CounterUpdate(self.count));
        self.count
    }

    pub async fn run<D, K>(&mut self, delay: &mut D, sink: &mut K) -> !
    where
        D: DelayNs,
        K: DiagnosticSink,
    {
        info!("Counting on display at {:#04X}", self.address);
        loop {
            self.tick(delay, sink).await;
        }
    }
}
