//! Fatal startup errors
//!
//! Runtime faults are handled inside the loops. A part that is missing at
//! boot is different: nothing in the firmware can fix that, so it is raised
//! to the caller, which reports it and parks.

use thiserror_no_std::Error;

use crate::sensors::SensorError;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    #[error("Motion sensor not found: {0}")]
    SensorNotFound(SensorError),
    #[error("No display at {primary:#04X} or {fallback:#04X}")]
    DisplayNotFound { primary: u8, fallback: u8 },
}
