//! Emulated SSD1306 on an I2C bus.
//!
//! Decodes the command (`0x00`) and data (`0x40`) writes the `ssd1306`
//! crate sends and keeps a copy of display RAM that the window renders from.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal_async::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use log::trace;

const WIDTH: usize = 128;
const PAGES: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct NoDevice;

impl i2c::Error for NoDevice {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// Panel RAM and the addressing registers that matter for drawing.
#[derive(Debug)]
struct PanelState {
    ram: [u8; WIDTH * PAGES],
    powered: bool,
    columns: (usize, usize),
    pages: (usize, usize),
    column: usize,
    page: usize,
}

impl PanelState {
    fn new() -> Self {
        Self {
            ram: [0; WIDTH * PAGES],
            powered: false,
            columns: (0, WIDTH - 1),
            pages: (0, PAGES - 1),
            column: 0,
            page: 0,
        }
    }

    fn command(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while let Some((&op, args)) = rest.split_first() {
            let argc = argument_count(op).min(args.len());
            let (args, tail) = args.split_at(argc);
            match (op, args) {
                (0xAE, _) => self.powered = false,
                (0xAF, _) => self.powered = true,
                (0x21, [start, end]) => {
                    self.columns = (*start as usize % WIDTH, *end as usize % WIDTH);
                    self.column = self.columns.0;
                }
                (0x22, [start, end]) => {
                    self.pages = (*start as usize % PAGES, *end as usize % PAGES);
                    self.page = self.pages.0;
                }
                _ => trace!("panel: ignoring command {:#04x} {:02x?}", op, args),
            }
            rest = tail;
        }
    }

    /// Horizontal addressing: column first, wrapping into the next page.
    fn data(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.ram[self.page * WIDTH + self.column] = *byte;
            if self.column >= self.columns.1 {
                self.column = self.columns.0;
                self.page = if self.page >= self.pages.1 {
                    self.pages.0
                } else {
                    self.page + 1
                };
            } else {
                self.column += 1;
            }
        }
    }
}

/// Bytes of parameters following each command the driver may send.
fn argument_count(op: u8) -> usize {
    match op {
        0x21 | 0x22 => 2,
        0x20 | 0x81 | 0x8D | 0xA8 | 0xAD | 0xD3 | 0xD5 | 0xD9 | 0xDA | 0xDB => 1,
        _ => 0,
    }
}

/// Bus handle with one panel optionally attached. Clones share the panel.
#[derive(Debug, Clone)]
pub struct SimulatedPanel {
    address: Option<u8>,
    attached: Rc<Cell<bool>>,
    state: Rc<RefCell<PanelState>>,
}

impl SimulatedPanel {
    /// A bus with a panel strapped to `address`, or an empty bus.
    pub fn new(address: Option<u8>) -> Self {
        Self {
            address,
            attached: Rc::new(Cell::new(true)),
            state: Rc::new(RefCell::new(PanelState::new())),
        }
    }

    /// Pull the panel off the bus or plug it back in. RAM is kept.
    pub fn toggle_attached(&self) -> bool {
        let attached = !self.attached.get();
        self.attached.set(attached);
        attached
    }

    /// Copy panel RAM into `target`. A powered-down panel shows black.
    pub fn render<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let state = self.state.borrow();
        target.clear(BinaryColor::Off)?;
        if !state.powered {
            return Ok(());
        }
        let pixels = state.ram.iter().enumerate().flat_map(|(index, byte)| {
            let x = (index % WIDTH) as i32;
            let page = (index / WIDTH) as i32;
            (0..8)
                .filter(move |bit| byte & (1 << bit) != 0)
                .map(move |bit| Pixel(Point::new(x, page * 8 + bit), BinaryColor::On))
        });
        target.draw_iter(pixels)
    }
}

impl ErrorType for SimulatedPanel {
    type Error = NoDevice;
}

impl I2c for SimulatedPanel {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if !self.attached.get() || self.address != Some(address) {
            return Err(NoDevice);
        }
        let mut state = self.state.borrow_mut();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => match bytes.split_first() {
                    Some((0x00, commands)) => state.command(commands),
                    Some((0x40, data)) => state.data(data),
                    Some((control, _)) => trace!("panel: unknown control byte {:#04x}", control),
                    None => {}
                },
                Operation::Read(buffer) => buffer.fill(0),
            }
        }
        Ok(())
    }
}
