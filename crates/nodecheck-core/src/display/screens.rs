//! Gateway OLED screens
//!
//! Text is laid out like a serial terminal: each line starts at the left
//! edge directly below the previous one. Two sizes are used, a small font
//! for labels and a large one for the status word and the counter.

use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use super::DISPLAY_WIDTH_PX;

/// Divider under the title lines.
pub const RULE: &str = "---------------";

const COUNT_PREFIX: &str = "Count:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Large,
}

impl TextSize {
    fn style(self) -> MonoTextStyle<'static, BinaryColor> {
        match self {
            Self::Small => MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
            Self::Large => MonoTextStyle::new(&FONT_10X20, BinaryColor::On),
        }
    }

    pub const fn line_height(self) -> i32 {
        match self {
            Self::Small => 10,
            Self::Large => 20,
        }
    }

    pub const fn char_width(self) -> u32 {
        match self {
            Self::Small => 6,
            Self::Large => 10,
        }
    }

    /// Whether `text` fits on one line of the panel.
    pub fn fits(self, text: &str) -> bool {
        text.len() as u32 * self.char_width() <= DISPLAY_WIDTH_PX
    }
}

/// Stacks lines top to bottom.
pub struct TextCursor<'a, D> {
    target: &'a mut D,
    y: i32,
}

impl<'a, D> TextCursor<'a, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(target: &'a mut D) -> Self {
        Self { target, y: 0 }
    }

    /// Top edge of the next line.
    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn line(&mut self, text: &str, size: TextSize) -> Result<(), D::Error> {
        Text::with_baseline(text, Point::new(0, self.y), size.style(), Baseline::Top)
            .draw(&mut *self.target)?;
        self.y += size.line_height();
        Ok(())
    }
}

/// Shown once after the panel comes up.
pub fn draw_banner<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let mut cursor = TextCursor::new(target);
    cursor.line("Gateway Node", TextSize::Small)?;
    cursor.line("OLED Test", TextSize::Small)?;
    cursor.line(RULE, TextSize::Small)?;
    cursor.line("SUCCESS!", TextSize::Large)
}

/// Shown on every counter tick.
///
/// From six digits up the label no longer fits one large line, so the
/// number moves to a line of its own.
pub fn draw_counter<D>(target: &mut D, count: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    // prefix, space and the ten digits of u32::MAX
    let mut label: String<17> = String::new();
    let written = write!(label, "{COUNT_PREFIX} {count}");
    debug_assert!(written.is_ok(), "counter label overflow");

    let mut cursor = TextCursor::new(target);
    cursor.line("Gateway OLED OK", TextSize::Small)?;
    cursor.line(RULE, TextSize::Small)?;
    if TextSize::Large.fits(&label) {
        cursor.line(&label, TextSize::Large)
    } else {
        cursor.line(COUNT_PREFIX, TextSize::Large)?;
        cursor.line(&label[COUNT_PREFIX.len() + 1..], TextSize::Large)
    }
}
