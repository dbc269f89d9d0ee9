use core::convert::Infallible;
use embedded_hal::digital::v2::{OutputPin, PinState};

use crate::nixie::{
    glyphs_from_digits, glyphs_from_text, glyphs_from_time, DisplayConfig, Frame, Glyph,
    NixieEncoder, Polarity, TestPattern, POSITIONS,
};

/// Bits per shift register.
pub const CODEWORD_BITS: u32 = 12;

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    match pin.set_state(PinState::from(high)) {
        Ok(()) => (),
        Err(never) => match never {},
    }
}

fn pulse<P: OutputPin<Error = Infallible>>(pin: &mut P) {
    drive(pin, true);
    drive(pin, false);
}

/// Eight 12-bit shift registers clocked in parallel.
///
/// Each register has its own serial data line. All of them share one shift
/// clock and one latch, so a whole frame goes out in 12 clocks.
pub struct ShiftChain<D, SH, ST> {
    /// Indexed by physical line. Line 7 feeds the leftmost tube.
    data: [D; POSITIONS],
    shift_clock: SH,
    latch: ST,
}

impl<D, SH, ST> ShiftChain<D, SH, ST>
where
    D: OutputPin<Error = Infallible>,
    SH: OutputPin<Error = Infallible>,
    ST: OutputPin<Error = Infallible>,
{
    pub fn new(data: [D; POSITIONS], mut shift_clock: SH, mut latch: ST) -> Self {
        drive(&mut shift_clock, false);
        drive(&mut latch, false);
        Self {
            data,
            shift_clock,
            latch,
        }
    }

    /// Clock out `frame` MSB first and latch it onto the tubes.
    pub fn shift_out(&mut self, frame: &Frame) {
        for bit in (0..CODEWORD_BITS).rev() {
            for (line, pin) in self.data.iter_mut().enumerate() {
                let word = frame[POSITIONS - 1 - line];
                drive(pin, (word >> bit) & 1 != 0);
            }
            pulse(&mut self.shift_clock);
        }
        pulse(&mut self.latch);
    }
}

/// The eight tubes: encoder settings plus the register chain.
pub struct NixieDisplay<D, SH, ST> {
    encoder: NixieEncoder,
    chain: ShiftChain<D, SH, ST>,
    frame: Frame,
}

impl<D, SH, ST> NixieDisplay<D, SH, ST>
where
    D: OutputPin<Error = Infallible>,
    SH: OutputPin<Error = Infallible>,
    ST: OutputPin<Error = Infallible>,
{
    /// Blanks the tubes straight away, since the registers power up with
    /// random contents.
    pub fn new(chain: ShiftChain<D, SH, ST>, config: DisplayConfig) -> Self {
        let mut display = Self {
            encoder: NixieEncoder::new(config),
            chain,
            frame: [config.polarity.blank(); POSITIONS],
        };
        display.blank();
        display
    }

    pub fn config(&self) -> &DisplayConfig {
        self.encoder.config()
    }

    /// Codewords most recently latched.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Takes effect on the next `show_*` call.
    pub fn set_enable_mask(&mut self, mask: u8) {
        self.encoder.set_enable_mask(mask);
    }

    /// Takes effect on the next `show_*` call.
    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.encoder.set_polarity(polarity);
    }

    pub fn show_glyphs(&mut self, glyphs: &[Glyph; POSITIONS]) {
        self.frame = self.encoder.encode(glyphs);
        self.chain.shift_out(&self.frame);
    }

    /// Up to eight digits with an optional leading `-`.
    pub fn show_integer(&mut self, text: &str) {
        self.show_glyphs(&glyphs_from_text(text, true));
    }

    /// Like [`show_integer`](Self::show_integer), with `.` taking a tube of
    /// its own.
    pub fn show_decimal(&mut self, text: &str) {
        self.show_glyphs(&glyphs_from_text(text, true));
    }

    pub fn show_time(&mut self, hour: u8, minute: u8, second: u8) {
        self.show_glyphs(&glyphs_from_time(hour, minute, second));
    }

    pub fn show_digits(&mut self, digits: [u8; POSITIONS]) {
        self.show_glyphs(&glyphs_from_digits(digits));
    }

    pub fn show_pattern(&mut self, pattern: TestPattern) {
        self.show_glyphs(&pattern.glyphs());
    }

    pub fn blank(&mut self) {
        self.show_glyphs(&[Glyph::Blank; POSITIONS]);
    }
}
