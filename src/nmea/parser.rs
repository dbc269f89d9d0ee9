use chrono::{NaiveDate, NaiveTime};

use super::{
    dm_to_deg, verify_checksum, Fields, Gga, LineAssembler, NmeaError, RawSentence, Rmc, Sentence,
    SentenceKind, KNOTS_TO_MPS,
};

/// Byte-at-a-time NMEA decoder: line assembly plus sentence parsing.
pub struct NmeaParser<const N: usize> {
    line: LineAssembler<N>,
}

impl<const N: usize> Default for NmeaParser<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NmeaParser<N> {
    pub fn new() -> Self {
        Self {
            line: LineAssembler::new(),
        }
    }

    /// Returns `Some` once per completed line.
    pub fn process_byte(&mut self, b: u8) -> Option<Result<Sentence, NmeaError>> {
        self.line.feed(b).map(|line| parse_sentence(&line))
    }

    /// Lines discarded for being too long.
    pub fn overflows(&self) -> u32 {
        self.line.overflows()
    }
}

/// Decode one complete line (terminator already stripped).
///
/// Sentences other than RMC/GGA come back as `Sentence::Other` without any
/// integrity checks.
pub fn parse_sentence(line: &[u8]) -> Result<Sentence, NmeaError> {
    let Some(kind) = SentenceKind::classify(line) else {
        return Ok(Sentence::Other);
    };
    verify_checksum(line).map_err(|error| NmeaError::Checksum { kind, error })?;
    let text = core::str::from_utf8(line).map_err(|_| NmeaError::NotUtf8 { kind })?;

    let fields = Fields::split(text);
    if fields.len() < kind.min_fields() {
        return Err(NmeaError::TooFewFields {
            kind,
            found: fields.len(),
            needed: kind.min_fields(),
        });
    }

    let raw = RawSentence::new(line);
    Ok(match kind {
        SentenceKind::Rmc => Sentence::Rmc(parse_rmc(&fields, raw)),
        SentenceKind::Gga => Sentence::Gga(parse_gga(&fields, raw)),
    })
}

// $G?RMC,hhmmss.ss,A,llll.ll,a,yyyyy.yy,a,x.x,x.x,ddmmyy,x.x,a*hh
fn parse_rmc(fields: &Fields, raw: RawSentence) -> Rmc {
    let latitude = fields
        .get(3)
        .and_then(dm_to_deg)
        .map(|deg| if fields.get(4) == Some("S") { -deg } else { deg });
    let longitude = fields
        .get(5)
        .and_then(dm_to_deg)
        .map(|deg| if fields.get(6) == Some("W") { -deg } else { deg });

    Rmc {
        time: fields.get(1).and_then(parse_hms),
        fix_valid: match fields.get(2) {
            Some("A") => Some(true),
            Some("V") => Some(false),
            _ => None,
        },
        latitude,
        longitude,
        speed: fields.get(7).and_then(parse_f32).map(|knots| knots * KNOTS_TO_MPS),
        date: fields.get(9).and_then(parse_dmy),
        raw,
    }
}

// $G?GGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,q,nn,h.h,alt,M,geo,M,age,ref*hh
fn parse_gga(fields: &Fields, raw: RawSentence) -> Gga {
    Gga {
        altitude: fields.get(9).and_then(parse_f32),
        raw,
    }
}

fn parse_f32(field: &str) -> Option<f32> {
    field.parse().ok().filter(|v: &f32| v.is_finite())
}

/// Two ASCII digits at `bytes[i..i + 2]`.
fn two_digits(bytes: &[u8], i: usize) -> Option<u32> {
    match bytes.get(i..i + 2)? {
        &[hi @ b'0'..=b'9', lo @ b'0'..=b'9'] => Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0')),
        _ => None,
    }
}

/// `hhmmss` with any fractional seconds ignored. Second 60 is kept as a
/// leap second.
fn parse_hms(field: &str) -> Option<NaiveTime> {
    let b = field.as_bytes();
    let (hour, minute) = (two_digits(b, 0)?, two_digits(b, 2)?);
    match two_digits(b, 4)? {
        60 => NaiveTime::from_hms_milli_opt(hour, minute, 59, 1_000),
        second => NaiveTime::from_hms_opt(hour, minute, second),
    }
}

/// `ddmmyy`, with the two-digit year taken as 2000 + yy.
fn parse_dmy(field: &str) -> Option<NaiveDate> {
    let b = field.as_bytes();
    if b.len() != 6 {
        return None;
    }
    let year = 2000 + two_digits(b, 4)? as i32;
    NaiveDate::from_ymd_opt(year, two_digits(b, 2)?, two_digits(b, 0)?)
}
