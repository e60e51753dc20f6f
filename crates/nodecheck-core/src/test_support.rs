//! Fakes shared by the unit tests

use core::cell::RefCell;
use core::convert::Infallible;
use core::ops::Range;
use std::rc::Rc;
use std::vec::Vec;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// Address NAK from the fake bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nak;

impl i2c::Error for Nak {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

#[derive(Debug)]
pub struct BusState {
    /// Addresses that acknowledge.
    pub present: Vec<u8>,
    /// Register file of whatever answers; auto-incrementing pointer.
    pub registers: [u8; 256],
    /// `(register, mask)` bits that read back as zero right after being written.
    pub self_clearing: Option<(u8, u8)>,
    /// Every write, in order.
    pub writes: Vec<(u8, Vec<u8>)>,
}

/// Shared-handle I2C fake. Clones see the same state.
#[derive(Debug, Clone)]
pub struct FakeBus {
    state: Rc<RefCell<BusState>>,
}

impl FakeBus {
    pub fn with_devices(present: &[u8]) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                present: present.to_vec(),
                registers: [0; 256],
                self_clearing: None,
                writes: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> core::cell::RefMut<'_, BusState> {
        self.state.borrow_mut()
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.state.borrow().registers[reg as usize]
    }

    pub fn set_register(&self, reg: u8, value: u8) {
        self.state.borrow_mut().registers[reg as usize] = value;
    }

    /// Writes sent to `address`, oldest first.
    pub fn writes_to(&self, address: u8) -> Vec<Vec<u8>> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, bytes)| bytes.clone())
            .collect()
    }

    /// Display RAM bytes sent to `address`: writes led by the 0x40 data
    /// control byte, minus that byte.
    pub fn data_bytes_to(&self, address: u8) -> usize {
        self.writes_to(address)
            .iter()
            .filter(|w| w.first() == Some(&0x40))
            .map(|w| w.len() - 1)
            .sum()
    }

    pub fn detach_all(&self) {
        self.state.borrow_mut().present.clear();
    }
}

impl ErrorType for FakeBus {
    type Error = Nak;
}

impl I2c for FakeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if !state.present.contains(&address) {
            return Err(Nak);
        }

        let mut pointer = 0usize;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    state.writes.push((address, bytes.to_vec()));
                    if let Some((&reg, values)) = bytes.split_first() {
                        pointer = reg as usize;
                        for (offset, value) in values.iter().enumerate() {
                            let index = (pointer + offset) % 256;
                            let value = match state.self_clearing {
                                Some((r, mask)) if r as usize == index => *value & !mask,
                                _ => *value,
                            };
                            state.registers[index] = value;
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for (offset, slot) in buffer.iter_mut().enumerate() {
                        *slot = state.registers[(pointer + offset) % 256];
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that records what was asked for instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.waits_ms.push(us / 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}

/// Sink that keeps every diagnostic.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<Diagnostic>,
}

impl RecordingSink {
    pub fn count(&self, diagnostic: &Diagnostic) -> usize {
        self.lines.iter().filter(|line| *line == diagnostic).count()
    }

    pub fn count_matching(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.lines.iter().filter(|line| predicate(line)).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.lines.push(diagnostic);
    }
}

const CANVAS_WIDTH: usize = 128;
const CANVAS_HEIGHT: usize = 64;

/// Panel-sized draw target that also counts lit pixels landing off-panel.
#[derive(Debug)]
pub struct Canvas {
    pixels: [[bool; CANVAS_WIDTH]; CANVAS_HEIGHT],
    pub clipped: usize,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pixels: [[false; CANVAS_WIDTH]; CANVAS_HEIGHT],
            clipped: 0,
        }
    }

    pub fn rows(&self, range: Range<usize>) -> &[[bool; CANVAS_WIDTH]] {
        &self.pixels[range]
    }

    /// Rows with at least one lit pixel, top to bottom.
    pub fn lit_rows(&self) -> Vec<usize> {
        (0..CANVAS_HEIGHT)
            .filter(|y| self.pixels[*y].iter().any(|lit| *lit))
            .collect()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            match (usize::try_from(coord.x), usize::try_from(coord.y)) {
                (Ok(x), Ok(y)) if x < CANVAS_WIDTH && y < CANVAS_HEIGHT => {
                    self.pixels[y][x] = color.is_on();
                }
                _ if color.is_on() => self.clipped += 1,
                _ => {}
            }
        }
        Ok(())
    }
}
