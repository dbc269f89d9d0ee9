//! Codewords for IN-14 tubes behind 12-bit shift registers.
//!
//! Each tube position is one 12-bit word: bits 0..=8 light the digits 1..9,
//! bit 11 lights the 0, and bits 9 and 10 are the left and right decimal
//! points.

/// Bits of a codeword that reach the shift register.
pub const CODE_MASK: u16 = 0x0FFF;
/// Number of tubes.
pub const POSITIONS: usize = 8;

/// Register bit for each digit value. Follows the tube wiring, not the digit.
pub const BIT_OF_DIGIT: [u8; 10] = [11, 0, 1, 2, 3, 4, 5, 6, 7, 8];
pub const LEFT_DOT_BIT: u8 = 9;
pub const RIGHT_DOT_BIT: u8 = 10;

/// Eight codewords, leftmost tube first.
pub type Frame = [u16; POSITIONS];

/// What one tube shows.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    /// `0..=9`. Anything larger shows as blank.
    Digit(u8),
    /// Left decimal point only
    Dot,
    /// Both decimal points, used as a minus sign
    Sign,
    #[default]
    Blank,
}

impl Glyph {
    /// Codeword before polarity is applied.
    pub const fn raw(self) -> u16 {
        match self {
            Self::Digit(d) if (d as usize) < BIT_OF_DIGIT.len() => 1 << BIT_OF_DIGIT[d as usize],
            Self::Digit(_) | Self::Blank => 0,
            Self::Dot => 1 << LEFT_DOT_BIT,
            Self::Sign => (1 << LEFT_DOT_BIT) | (1 << RIGHT_DOT_BIT),
        }
    }
}

/// Whether a set register bit lights its cathode or turns it off.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Default for Polarity {
    fn default() -> Self {
        if cfg!(feature = "active-low") {
            Self::ActiveLow
        } else {
            Self::ActiveHigh
        }
    }
}

impl Polarity {
    /// Invert the low 12 bits for active-low drivers. Higher bits pass through.
    pub const fn apply(self, raw: u16) -> u16 {
        match self {
            Self::ActiveHigh => raw,
            Self::ActiveLow => raw ^ CODE_MASK,
        }
    }

    /// Codeword that lights nothing.
    pub const fn blank(self) -> u16 {
        self.apply(0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    pub polarity: Polarity,
    /// One bit per tube, bit 7 is the leftmost. Cleared bits stay dark.
    pub enable_mask: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            polarity: Polarity::default(),
            enable_mask: 0xFF,
        }
    }
}

impl DisplayConfig {
    pub const fn is_enabled(&self, position: usize) -> bool {
        position < POSITIONS && self.enable_mask & (0x80 >> position) != 0
    }
}

/// Turns glyphs into the final codewords for the shift chain.
#[derive(Debug, Default, Clone)]
pub struct NixieEncoder {
    config: DisplayConfig,
}

impl NixieEncoder {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn set_enable_mask(&mut self, mask: u8) {
        self.config.enable_mask = mask;
    }

    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.config.polarity = polarity;
    }

    pub fn encode(&self, glyphs: &[Glyph; POSITIONS]) -> Frame {
        let polarity = self.config.polarity;
        let mut frame = [polarity.blank(); POSITIONS];
        for (position, (code, glyph)) in frame.iter_mut().zip(glyphs).enumerate() {
            if self.config.is_enabled(position) {
                *code = polarity.apply(glyph.raw());
            }
        }
        frame
    }
}

/// Lay out `text` over the tubes, left-aligned.
///
/// With `accept_sign` a leading `-` takes one tube as [`Glyph::Sign`].
/// Digits map to themselves, `.` to [`Glyph::Dot`] and anything else to a
/// blank tube. Characters beyond the eighth tube are dropped.
pub fn glyphs_from_text(text: &str, accept_sign: bool) -> [Glyph; POSITIONS] {
    let mut glyphs = [Glyph::Blank; POSITIONS];
    let mut rest = text;
    let mut slots = glyphs.iter_mut();

    if accept_sign {
        if let Some(unsigned) = text.strip_prefix('-') {
            if let Some(slot) = slots.next() {
                *slot = Glyph::Sign;
            }
            rest = unsigned;
        }
    }

    for (slot, c) in slots.zip(rest.chars()) {
        *slot = match c {
            '0'..='9' => Glyph::Digit(c as u8 - b'0'),
            '.' => Glyph::Dot,
            _ => Glyph::Blank,
        };
    }
    glyphs
}

/// `HH.MM.SS`. Each part is reduced mod 100 and zero padded.
pub fn glyphs_from_time(hour: u8, minute: u8, second: u8) -> [Glyph; POSITIONS] {
    let pair = |v: u8| {
        let v = v % 100;
        [Glyph::Digit(v / 10), Glyph::Digit(v % 10)]
    };
    let [h1, h0] = pair(hour);
    let [m1, m0] = pair(minute);
    let [s1, s0] = pair(second);
    [h1, h0, Glyph::Dot, m1, m0, Glyph::Dot, s1, s0]
}

pub fn glyphs_from_digits(digits: [u8; POSITIONS]) -> [Glyph; POSITIONS] {
    digits.map(Glyph::Digit)
}

/// One step of the power-on tube check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TestPattern {
    Integer(&'static str),
    Decimal(&'static str),
    Time(u8, u8, u8),
}

impl TestPattern {
    pub fn glyphs(self) -> [Glyph; POSITIONS] {
        match self {
            Self::Integer(text) | Self::Decimal(text) => glyphs_from_text(text, true),
            Self::Time(h, m, s) => glyphs_from_time(h, m, s),
        }
    }
}

/// Shown once at boot, one step per second. The long entries check that
/// text past the last tube is cut off.
pub const SELF_TEST: [TestPattern; 9] = [
    TestPattern::Integer("01234567"),
    TestPattern::Decimal("135.4567"),
    TestPattern::Time(12, 53, 20),
    TestPattern::Integer("-1234"),
    TestPattern::Decimal("-135.45"),
    TestPattern::Time(12, 53, 20),
    TestPattern::Integer("-0123456789"),
    TestPattern::Decimal("-135.456789"),
    TestPattern::Time(23, 59, 59),
];

#[cfg(test)]
mod tests {
    use super::*;
    use super::Glyph::*;

    fn bit_of(code: u16) -> Option<u8> {
        (code.count_ones() == 1).then(|| code.trailing_zeros() as u8)
    }

    #[test]
    fn digit_wiring() {
        assert_eq!(bit_of(Digit(0).raw()), Some(11));
        assert_eq!(bit_of(Digit(1).raw()), Some(0));
        assert_eq!(bit_of(Digit(9).raw()), Some(8));
        for d in 0..10 {
            assert_eq!(bit_of(Digit(d).raw()), Some(BIT_OF_DIGIT[d as usize]));
        }
        assert_eq!(Digit(10).raw(), 0);
        assert_eq!(Blank.raw(), 0);
        assert_eq!(Dot.raw(), 0x200);
        assert_eq!(Sign.raw(), 0x600);
    }

    #[test]
    fn active_low_inverts_low_twelve_bits() {
        let p = Polarity::ActiveLow;
        assert_eq!(p.apply(0x0800), 0x07FF);
        assert_eq!(p.apply(0xF000), 0xFFFF);
        assert_eq!(p.apply(0xA555), 0xAAAA);
        assert_eq!(p.blank(), 0x0FFF);
        assert_eq!(Polarity::ActiveHigh.apply(0xA555), 0xA555);
        assert_eq!(Polarity::ActiveHigh.blank(), 0);
    }

    #[test]
    fn default_config() {
        let config = DisplayConfig::default();
        assert_eq!(config.enable_mask, 0xFF);
        #[cfg(not(feature = "active-low"))]
        assert_eq!(config.polarity, Polarity::ActiveHigh);
        assert!(config.is_enabled(0) && config.is_enabled(7));
        assert!(!config.is_enabled(8));
    }

    #[test]
    fn text_with_sign_and_dot() {
        assert_eq!(
            glyphs_from_text("-135.45", true),
            [Sign, Digit(1), Digit(3), Digit(5), Dot, Digit(4), Digit(5), Blank]
        );
        // Without sign handling the minus is just an unknown character
        assert_eq!(glyphs_from_text("-1", false), [Blank, Digit(1), Blank, Blank, Blank, Blank, Blank, Blank]);
        assert_eq!(glyphs_from_text("", true), [Blank; POSITIONS]);
        assert_eq!(glyphs_from_text("1a2", true)[..3], [Digit(1), Blank, Digit(2)]);
    }

    #[test]
    fn text_is_cut_at_eight_positions() {
        assert_eq!(
            glyphs_from_text("-0123456789", true),
            [Sign, Digit(0), Digit(1), Digit(2), Digit(3), Digit(4), Digit(5), Digit(6)]
        );
        assert_eq!(glyphs_from_text("0123456789", true)[7], Digit(7));
    }

    #[test]
    fn time_template() {
        assert_eq!(
            glyphs_from_time(12, 53, 20),
            [Digit(1), Digit(2), Dot, Digit(5), Digit(3), Dot, Digit(2), Digit(0)]
        );
        assert_eq!(glyphs_from_time(7, 5, 0)[..2], [Digit(0), Digit(7)]);
        assert_eq!(glyphs_from_time(123, 0, 0)[..2], [Digit(2), Digit(3)]);
    }

    #[test]
    fn enable_mask_blanks_positions() {
        let mut enc = NixieEncoder::new(DisplayConfig {
            polarity: Polarity::ActiveHigh,
            enable_mask: 0b1000_0001,
        });
        let frame = enc.encode(&glyphs_from_digits([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(frame, [Digit(1).raw(), 0, 0, 0, 0, 0, 0, Digit(8).raw()]);

        enc.set_polarity(Polarity::ActiveLow);
        let frame = enc.encode(&glyphs_from_digits([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(frame[0], !Digit(1).raw() & CODE_MASK);
        assert_eq!(frame[1..7], [0x0FFF; 6]);

        enc.set_enable_mask(0);
        assert_eq!(enc.encode(&[Sign; POSITIONS]), [0x0FFF; POSITIONS]);
    }

    #[test]
    fn self_test_fits_the_tubes() {
        assert_eq!(SELF_TEST[0].glyphs(), glyphs_from_digits([0, 1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(SELF_TEST[1].glyphs()[3], Dot);
        assert_eq!(SELF_TEST[7].glyphs()[7], Digit(6));
    }
}
