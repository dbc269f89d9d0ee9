use chrono::{NaiveDate, NaiveTime};

use crate::{
    nmea::{Gga, NmeaError, RawSentence, Rmc, SentenceKind},
    time::localize,
};

/// Which time of day the tubes should show.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockMode {
    #[default]
    Local,
    Utc,
}

/// Receiver and decoder statistics. All counters wrap.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Bytes pushed into the receive ring
    pub rx_bytes: u32,
    /// Bytes overwritten in the ring before the decoder got to them
    pub rx_overruns: u32,
    /// Complete lines handed to the decoder
    pub rx_lines: u32,
    /// Lines thrown away for being too long
    pub line_overflows: u32,
    pub rmc_ok: u32,
    pub rmc_bad: u32,
    pub gga_ok: u32,
    pub gga_bad: u32,
    /// Last RMC or GGA sentence that decoded successfully
    pub last_sentence: RawSentence,
}

/// Everything the clock knows from the GPS feed.
///
/// Written only by [`Gps::poll`](crate::gps::Gps::poll). A value stays `None`
/// until the receiver has reported it once, and keeps its last good value
/// when a later sentence leaves the field empty or garbled.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Telemetry {
    utc_time: Option<NaiveTime>,
    utc_date: Option<NaiveDate>,
    local_time: Option<NaiveTime>,
    local_date: Option<NaiveDate>,
    latitude: Option<f32>,
    longitude: Option<f32>,
    altitude: Option<f32>,
    speed: Option<f32>,
    fix_valid: Option<bool>,
    diagnostics: Diagnostics,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn utc_time(&self) -> Option<NaiveTime> {
        self.utc_time
    }

    pub fn utc_date(&self) -> Option<NaiveDate> {
        self.utc_date
    }

    pub fn local_time(&self) -> Option<NaiveTime> {
        self.local_time
    }

    pub fn local_date(&self) -> Option<NaiveDate> {
        self.local_date
    }

    /// Degrees, north positive
    pub fn latitude(&self) -> Option<f32> {
        self.latitude
    }

    /// Degrees, east positive
    pub fn longitude(&self) -> Option<f32> {
        self.longitude
    }

    /// Metres above mean sea level
    pub fn altitude(&self) -> Option<f32> {
        self.altitude
    }

    /// Ground speed in m/s
    pub fn speed(&self) -> Option<f32> {
        self.speed
    }

    /// Status flag of the last RMC that carried one
    pub fn fix_valid(&self) -> Option<bool> {
        self.fix_valid
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Time of day to show in the given mode.
    pub fn clock(&self, mode: ClockMode) -> Option<NaiveTime> {
        match mode {
            ClockMode::Local => self.local_time,
            ClockMode::Utc => self.utc_time,
        }
    }

    pub(crate) fn apply_rmc(&mut self, rmc: &Rmc) {
        self.utc_time = rmc.time.or(self.utc_time);
        self.utc_date = rmc.date.or(self.utc_date);
        self.latitude = rmc.latitude.or(self.latitude);
        self.longitude = rmc.longitude.or(self.longitude);
        self.speed = rmc.speed.or(self.speed);
        self.fix_valid = rmc.fix_valid.or(self.fix_valid);

        if let Some(utc_time) = self.utc_time {
            let (time, date) = localize(utc_time, self.utc_date, self.longitude);
            self.local_time = Some(time);
            // Without a UTC date the previous local date is left alone
            self.local_date = date.or(self.local_date);
        }

        let diag = &mut self.diagnostics;
        diag.rmc_ok = diag.rmc_ok.wrapping_add(1);
        diag.last_sentence = rmc.raw;
    }

    pub(crate) fn apply_gga(&mut self, gga: &Gga) {
        self.altitude = gga.altitude.or(self.altitude);

        let diag = &mut self.diagnostics;
        diag.gga_ok = diag.gga_ok.wrapping_add(1);
        diag.last_sentence = gga.raw;
    }

    pub(crate) fn record_error(&mut self, error: &NmeaError) {
        let diag = &mut self.diagnostics;
        let counter = match error.kind() {
            SentenceKind::Rmc => &mut diag.rmc_bad,
            SentenceKind::Gga => &mut diag.gga_bad,
        };
        *counter = counter.wrapping_add(1);
    }

    pub(crate) fn record_line(&mut self) {
        self.diagnostics.rx_lines = self.diagnostics.rx_lines.wrapping_add(1);
    }

    /// Copy the receive side counters, truncated to the diagnostic width.
    pub(crate) fn sync_receiver(&mut self, rx_bytes: usize, rx_overruns: usize, line_overflows: u32) {
        let diag = &mut self.diagnostics;
        diag.rx_bytes = rx_bytes as u32;
        diag.rx_overruns = rx_overruns as u32;
        diag.line_overflows = line_overflows;
    }
}
