use crate::{
    nmea::{NmeaParser, Sentence},
    rb::Consumer,
    telemetry::Telemetry,
};

/// Which sentence types changed the telemetry during one poll.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Update {
    #[default]
    None,
    Rmc,
    Gga,
    Both,
}

impl Update {
    const RMC: u8 = 0b01;
    const GGA: u8 = 0b10;

    /// `0` none, `1` RMC, `2` GGA, `3` both.
    pub const fn bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Rmc => Self::RMC,
            Self::Gga => Self::GGA,
            Self::Both => Self::RMC | Self::GGA,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & (Self::RMC | Self::GGA) {
            0 => Self::None,
            Self::RMC => Self::Rmc,
            Self::GGA => Self::Gga,
            _ => Self::Both,
        }
    }

    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.bits() | other.bits())
    }

    pub const fn rmc(self) -> bool {
        self.bits() & Self::RMC != 0
    }

    pub const fn gga(self) -> bool {
        self.bits() & Self::GGA != 0
    }
}

/// Consumer half of the receive path: drains the UART ring into the NMEA
/// decoder and folds every decoded sentence into the telemetry.
pub struct Gps<const N: usize> {
    rx: Consumer<N>,
    parser: NmeaParser<N>,
}

impl<const N: usize> Gps<N> {
    pub fn new(rx: Consumer<N>) -> Self {
        Self {
            rx,
            parser: NmeaParser::new(),
        }
    }

    /// Process every byte received so far. Never blocks.
    pub fn poll(&mut self, telemetry: &mut Telemetry) -> Update {
        let mut update = Update::None;

        while let Some(b) = self.rx.pop() {
            let Some(result) = self.parser.process_byte(b) else {
                continue;
            };
            telemetry.record_line();
            match result {
                Ok(Sentence::Rmc(ref rmc)) => {
                    trace!("RMC {}", rmc.raw);
                    telemetry.apply_rmc(rmc);
                    update = update.union(Update::Rmc);
                }
                Ok(Sentence::Gga(ref gga)) => {
                    trace!("GGA {}", gga.raw);
                    telemetry.apply_gga(gga);
                    update = update.union(Update::Gga);
                }
                Ok(Sentence::Other) => (),
                Err(e) => {
                    warn!("NMEA error: {}", e);
                    telemetry.record_error(&e);
                }
            }
        }

        telemetry.sync_receiver(self.rx.received(), self.rx.overruns(), self.parser.overflows());
        update
    }
}
