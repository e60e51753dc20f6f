//! Console diagnostics
//!
//! Both images talk to a human on a serial monitor. Every line they can
//! print is a [`Diagnostic`] variant with fixed text, so the control logic
//! stays testable and the firmware only decides where the lines go.

use core::fmt;

use log::Level;

use crate::sensors::MotionReading;

/// One entry of the wiring checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiringHint {
    /// Module pin goes to a supply rail.
    Power {
        signal: &'static str,
        rail: &'static str,
    },
    /// Module pin goes to a GPIO.
    Gpio { signal: &'static str, gpio: u8 },
}

impl fmt::Display for WiringHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power { signal, rail } => write!(f, "  {signal} → {rail}"),
            Self::Gpio { signal, gpio } => write!(f, "  {signal} → GPIO {gpio}"),
        }
    }
}

/// A human-readable console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diagnostic {
    // Sensor image
    ImuBanner,
    Initializing,
    ImuNotFound,
    ImuFound,
    BlankLine,
    ReadingStarted,
    Reading(MotionReading),
    ConnectionLost,
    Reconnected,

    // Display image
    OledBanner,
    OledNotFound,
    TryingFallback { address: u8 },
    OledStillNotFound { address: u8 },
    CheckConnections,
    Wiring(WiringHint),
    OledFound { address: u8 },
    TestPattern,
    CounterUpdate(u32),
}

impl Diagnostic {
    /// Log level the line is emitted at.
    pub const fn level(&self) -> Level {
        match self {
            Self::ImuNotFound
            | Self::OledNotFound
            | Self::OledStillNotFound { .. }
            | Self::CheckConnections
            | Self::Wiring(_) => Level::Error,
            Self::ConnectionLost => Level::Warn,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImuBanner => f.write_str("=== MPU6050 Test ==="),
            Self::Initializing => f.write_str("Initializing..."),
            Self::ImuNotFound => f.write_str("ERROR: Failed to find MPU6050 chip!"),
            Self::ImuFound => f.write_str("SUCCESS: MPU6050 Found!"),
            Self::BlankLine => Ok(()),
            Self::ReadingStarted => f.write_str("Reading sensor data..."),
            Self::Reading(reading) => write!(f, "{reading}"),
            Self::ConnectionLost => {
                f.write_str("Communication lost. Will attempt to reconnect silently...")
            }
            Self::Reconnected => f.write_str("SUCCESS: Reconnected to MPU6050!"),
            Self::OledBanner => f.write_str("=== Gateway OLED Test ==="),
            Self::OledNotFound => f.write_str("ERROR: OLED not found!"),
            Self::TryingFallback { address } => {
                write!(f, "Trying alternate address {address:#04X}...")
            }
            Self::OledStillNotFound { address } => {
                write!(f, "ERROR: OLED still not found at {address:#04X}!")
            }
            Self::CheckConnections => f.write_str("Check connections:"),
            Self::Wiring(hint) => write!(f, "{hint}"),
            Self::OledFound { address } => write!(f, "SUCCESS: OLED found at {address:#04X}"),
            Self::TestPattern => f.write_str("OLED displaying test pattern"),
            Self::CounterUpdate(count) => write!(f, "OLED update: {count}"),
        }
    }
}

/// Destination for [`Diagnostic`] lines.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &mut T {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade at each line's own level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        log::log!(diagnostic.level(), "{}", diagnostic);
    }
}
