//! Desktop simulator for the nodecheck bring-up images.
//!
//! Runs the same core loops as the firmware against emulated hardware.
//!
//! ```text
//! nodecheck-simulator [oled] [--address 0x3c|0x3d|none]
//! nodecheck-simulator imu [--polls N] [--attached N] [--detached N]
//! nodecheck-simulator --help
//! ```
//!
//! `oled` (the default) opens an SDL2 window showing the emulated SSD1306.
//!
//! | Key | Action                          |
//! |-----|---------------------------------|
//! | U   | Unplug / replug the panel       |
//! | Q   | Quit                            |
//!
//! `imu` prints the sensor console to the terminal while a synthetic
//! MPU6050 drops off the bus on a fixed schedule.

mod imu;
mod panel;

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use embassy_futures::block_on;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    sdl2::Keycode,
};
use embedded_hal_async::delay::DelayNs;
use log::{error, info};

use nodecheck_core::config::{
    ImuNodeConfig, OLED_FALLBACK_ADDRESS, OLED_PRIMARY_ADDRESS, OledNodeConfig,
};
use nodecheck_core::counter::CounterLoop;
use nodecheck_core::diagnostics::LogSink;
use nodecheck_core::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use nodecheck_core::monitor::ReconnectMonitor;

use imu::{Dropouts, SyntheticImu};
use panel::SimulatedPanel;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 4;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Desktop simulator for the nodecheck bring-up images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Gateway image: OLED banner and counter in an SDL2 window
    Oled {
        /// Panel strap address: 0x3c, 0x3d or none for an empty bus
        #[arg(long, value_parser = parse_address, default_value = "0x3c")]
        address: Strap,
    },
    /// Sensor image: MPU6050 console with scheduled dropouts
    Imu {
        /// Stop after this many polls instead of running forever
        #[arg(long)]
        polls: Option<u32>,
        /// Polls the sensor stays on the bus
        #[arg(long, default_value_t = 10)]
        attached: u32,
        /// Polls the sensor stays off the bus
        #[arg(long, default_value_t = 6)]
        detached: u32,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Oled {
            address: Strap(Some(OLED_PRIMARY_ADDRESS)),
        }
    }
}

/// Where the emulated panel answers, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Strap(Option<u8>);

fn parse_address(value: &str) -> Result<Strap, String> {
    match value.to_ascii_lowercase().as_str() {
        "none" => Ok(Strap(None)),
        "0x3c" | "3c" => Ok(Strap(Some(OLED_PRIMARY_ADDRESS))),
        "0x3d" | "3d" => Ok(Strap(Some(OLED_FALLBACK_ADDRESS))),
        other => Err(format!("unsupported panel address '{other}'")),
    }
}

// ---------------------------------------------------------------------------
// Delays
// ---------------------------------------------------------------------------

/// Sleeps the thread.
struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}

/// Keeps the window alive while the counter loop waits.
struct WindowDelay {
    window: Window,
    display: SimulatorDisplay<BinaryColor>,
    panel: SimulatedPanel,
    quit: bool,
}

impl WindowDelay {
    fn pump(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let frame_start = Instant::now();

            if let Err(e) = self.panel.render(&mut self.display) {
                error!("Render error: {:?}", e);
            }
            self.window.update(&self.display);

            for event in self.window.events() {
                match event {
                    SimulatorEvent::Quit => self.quit = true,
                    SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                        Keycode::Q | Keycode::Escape => self.quit = true,
                        Keycode::U => {
                            if self.panel.toggle_attached() {
                                info!("Panel plugged back in");
                            } else {
                                info!("Panel unplugged");
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }

            let now = Instant::now();
            if self.quit || now >= deadline {
                return;
            }
            let frame_end = frame_start + FRAME_DURATION;
            std::thread::sleep(frame_end.min(deadline).saturating_duration_since(now));
        }
    }
}

impl DelayNs for WindowDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.pump(Duration::from_nanos(ns.into()));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.pump(Duration::from_millis(ms.into()));
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

fn run_oled(address: Option<u8>) {
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: U=Unplug/replug panel  Q=Quit");

    let panel = SimulatedPanel::new(address);
    let output_settings = OutputSettingsBuilder::new()
        .scale(WINDOW_SCALE)
        .theme(BinaryColorTheme::OledBlue)
        .build();
    let mut delay = WindowDelay {
        window: Window::new("nodecheck OLED", &output_settings),
        display: SimulatorDisplay::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)),
        panel: panel.clone(),
        quit: false,
    };
    let mut sink = LogSink;

    let started = block_on(CounterLoop::start(
        panel,
        OledNodeConfig::DEFAULT,
        &mut delay,
        &mut sink,
    ));
    match started {
        Ok(mut counter) => {
            while !delay.quit {
                block_on(counter.tick(&mut delay, &mut sink));
            }
        }
        Err(e) => {
            error!("{}", e);
            // Mirror the firmware: park with the window open until quit.
            while !delay.quit {
                delay.pump(Duration::from_secs(1));
            }
        }
    }
}

fn run_imu(polls: Option<u32>, dropouts: Dropouts) {
    info!(
        "Sensor attached for {} polls, detached for {}",
        dropouts.attached, dropouts.detached
    );

    let mut delay = StdDelay;
    let mut sink = LogSink;
    let started = block_on(ReconnectMonitor::start(
        SyntheticImu::new(dropouts),
        ImuNodeConfig::DEFAULT,
        &mut delay,
        &mut sink,
    ));
    let mut monitor = match started {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    match polls {
        Some(polls) => {
            for _ in 0..polls {
                block_on(monitor.poll(&mut delay, &mut sink));
            }
        }
        None => block_on(monitor.run(&mut delay, &mut sink)),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli.command.unwrap_or_default() {
        Command::Oled { address } => run_oled(address.0),
        Command::Imu {
            polls,
            attached,
            detached,
        } => run_imu(polls, Dropouts { attached, detached }),
    }

    info!("Simulator exiting");
}
