#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod display;
pub mod gps;
pub mod nixie;
pub mod nmea;
pub mod rb;
pub mod telemetry;
pub mod time;

pub use display::{NixieDisplay, ShiftChain};
pub use gps::{Gps, Update};
pub use nixie::{DisplayConfig, Glyph, NixieEncoder, Polarity};
pub use telemetry::{ClockMode, Diagnostics, Telemetry};

#[cfg(feature = "firmware")]
mod firmware {
    use core::sync::atomic::{AtomicUsize, Ordering};
    use defmt_brtt as _; // global logger
    use panic_probe as _;
    use stm32l4xx_hal as _; // memory layout

    // same panicking *behavior* as `panic-probe` but doesn't print a panic message
    // this prevents the panic message being printed *twice* when `defmt::panic` is invoked
    #[defmt::panic_handler]
    fn panic() -> ! {
        cortex_m::asm::udf()
    }

    static COUNT: AtomicUsize = AtomicUsize::new(0);
    defmt::timestamp!("{=usize}", {
        // NOTE(no-CAS) `timestamps` runs with interrupts disabled
        let n = COUNT.load(Ordering::Relaxed);
        COUNT.store(n + 1, Ordering::Relaxed);
        n
    });
}
