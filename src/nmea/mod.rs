use chrono::{NaiveDate, NaiveTime};
use tinyvec::ArrayVec;

pub mod line;
pub mod parser;

pub use line::LineAssembler;
pub use parser::{parse_sentence, NmeaParser};

/// Upper bound on tokenized fields per sentence.
pub const MAX_FIELDS: usize = 20;
/// Longest raw sentence kept for diagnostics.
pub const RAW_SENTENCE_MAX: usize = 81;
pub const KNOTS_TO_MPS: f32 = 0.514444;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SentenceKind {
    Rmc,
    Gga,
}

impl SentenceKind {
    /// Only GPS (`GP`) and multi-constellation (`GN`) talkers are recognised.
    pub fn classify(line: &[u8]) -> Option<Self> {
        match line.get(..6)? {
            b"$GPRMC" | b"$GNRMC" => Some(Self::Rmc),
            b"$GPGGA" | b"$GNGGA" => Some(Self::Gga),
            _ => None,
        }
    }

    pub const fn min_fields(self) -> usize {
        match self {
            Self::Rmc => 10,
            Self::Gga => 11,
        }
    }
}

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumError {
    #[error("no '*' delimiter")]
    Missing,
    #[error("checksum digits missing or not hex")]
    BadDigits,
    #[error("expected {expect:02X}, computed {saw:02X}")]
    Mismatch { expect: u8, saw: u8 },
}

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaError {
    #[error("{kind:?} sentence failed checksum: {error}")]
    Checksum { kind: SentenceKind, error: ChecksumError },
    #[error("{kind:?} sentence is not ASCII text")]
    NotUtf8 { kind: SentenceKind },
    #[error("{kind:?} sentence has {found} fields, needs {needed}")]
    TooFewFields {
        kind: SentenceKind,
        found: usize,
        needed: usize,
    },
}

impl NmeaError {
    pub fn kind(&self) -> SentenceKind {
        match *self {
            Self::Checksum { kind, .. } | Self::NotUtf8 { kind } | Self::TooFewFields { kind, .. } => kind,
        }
    }
}

/// XOR of every byte in `body`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |sum, b| sum ^ b)
}

fn hex_value(c: u8) -> Option<u8> {
    char::from(c).to_digit(16).map(|d| d as u8)
}

/// Checks `[$]body*HH[...]`: the XOR of everything between the optional `$`
/// and the first `*` must equal the two hex digits after it.
pub fn verify_checksum(line: &[u8]) -> Result<(), ChecksumError> {
    let body = line.strip_prefix(b"$").unwrap_or(line);
    let star = body
        .iter()
        .position(|&b| b == b'*')
        .ok_or(ChecksumError::Missing)?;
    let &[hi, lo, ..] = &body[star + 1..] else {
        return Err(ChecksumError::BadDigits);
    };
    let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) else {
        return Err(ChecksumError::BadDigits);
    };

    let expect = (hi << 4) | lo;
    let saw = checksum(&body[..star]);
    if expect == saw {
        Ok(())
    } else {
        Err(ChecksumError::Mismatch { expect, saw })
    }
}

/// Comma/asterisk separated fields of one sentence, borrowed from the line.
///
/// Empty fields in the middle are kept, but a delimiter that ends the line
/// does not open a new empty field. Once `MAX_FIELDS` is reached the last
/// field runs to the end of the line.
#[derive(Debug, Default, Clone)]
pub struct Fields<'a>(ArrayVec<[&'a str; MAX_FIELDS]>);

impl<'a> Fields<'a> {
    pub fn split(line: &'a str) -> Self {
        let mut fields = ArrayVec::new();
        let mut start = 0;
        for (i, b) in line.bytes().enumerate() {
            if fields.len() == MAX_FIELDS - 1 {
                break;
            }
            if b == b',' || b == b'*' {
                fields.push(&line[start..i]);
                start = i + 1;
            }
        }
        if start < line.len() || fields.is_empty() {
            fields.push(&line[start..]);
        }
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field `i`, or `None` when absent or empty.
    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.0.get(i).copied().filter(|f| !f.is_empty())
    }
}

/// Degrees-minutes (`ddmm.mmmm` / `dddmm.mmmm`) to decimal degrees.
pub fn dm_to_deg(field: &str) -> Option<f32> {
    let value: f32 = field.parse().ok().filter(|v: &f32| v.is_finite())?;
    let degrees = libm::truncf(value / 100.0);
    let minutes = value - degrees * 100.0;
    Some(degrees + minutes / 60.0)
}

/// The text of the last accepted sentence, truncated to `RAW_SENTENCE_MAX`.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawSentence(ArrayVec<[u8; RAW_SENTENCE_MAX]>);

impl RawSentence {
    pub fn new(line: &[u8]) -> Self {
        let mut raw = ArrayVec::new();
        raw.extend_from_slice(&line[..line.len().min(RAW_SENTENCE_MAX)]);
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.0.as_slice()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RawSentence {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]:a}", self.0.as_slice())
    }
}

/// Recommended minimum data. Every value is `None` when its field was empty
/// or malformed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rmc {
    pub time: Option<NaiveTime>,
    pub fix_valid: Option<bool>,
    pub latitude: Option<f32>,
    pub longitude: Option<f32>,
    /// Ground speed in m/s
    pub speed: Option<f32>,
    pub date: Option<NaiveDate>,
    pub raw: RawSentence,
}

/// Fix data. Only the altitude is used.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gga {
    /// Metres above mean sea level
    pub altitude: Option<f32>,
    pub raw: RawSentence,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sentence {
    Rmc(Rmc),
    Gga(Gga),
    /// Any sentence type we do not decode
    Other,
}
