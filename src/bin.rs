#![no_main]
#![no_std]

use nixie_clock as _;
use nixie_clock::{
    display::{NixieDisplay, ShiftChain},
    gps::{Gps, Update},
    nixie::{DisplayConfig, SELF_TEST},
    rb::{ByteRing, Producer},
    telemetry::{ClockMode, Telemetry},
};

use chrono::Timelike;
use defmt::{debug, info, trace, warn};
use rtic_monotonics::{create_systick_token, systick::Systick};
use rtic_sync::{
    channel::{Receiver, Sender},
    make_channel,
};
use stm32l4xx_hal::{
    gpio::{Alternate, ErasedPin, Output, PushPull, PA2, PA3, PB4, PB5},
    pac::LPUART1,
    prelude::*,
    serial::{self, Config, Serial},
};

type LpUart1 = Serial<LPUART1, (PA2<Alternate<PushPull, 8>>, PA3<Alternate<PushPull, 8>>)>;

type Tubes = NixieDisplay<ErasedPin<Output<PushPull>>, PB4<Output<PushPull>>, PB5<Output<PushPull>>>;

const UART_RX_BUFSIZE: usize = 256;
const GPS_BAUD: u32 = 9600;
/// Long enough to batch a few bytes, short enough that a 256 byte ring
/// never fills at 9600 baud.
const GPS_POLL_MS: u32 = 20;
const CLOCK_MODE: ClockMode = ClockMode::Local;

static UART_RX: ByteRing<UART_RX_BUFSIZE> = ByteRing::new();

#[rtic::app(
    device = stm32l4xx_hal::pac,
    dispatchers = [EXTI2, EXTI3],
)]
mod app {
    use super::*;

    // Shared resources go here
    #[shared]
    struct Shared {
        telemetry: Telemetry,
    }

    // Local resources go here
    #[local]
    struct Local {
        uart: LpUart1,
        rx_send: Producer<UART_RX_BUFSIZE>,
        display: Tubes,
    }

    ////////////////////////////////////////////////////////////////////////////
    // Main thread tasks ///////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        trace!("init enter");

        let mut flash = cx.device.FLASH.constrain();
        let mut rcc = cx.device.RCC.constrain();
        let mut pwr = cx.device.PWR.constrain(&mut rcc.apb1r1);
        let clocks = rcc.cfgr.sysclk(16.MHz()).freeze(&mut flash.acr, &mut pwr);

        let mut gpioa = cx.device.GPIOA.split(&mut rcc.ahb2);
        let mut gpiob = cx.device.GPIOB.split(&mut rcc.ahb2);

        // Create SysTick monotonic for task scheduling
        Systick::start(cx.core.SYST, clocks.sysclk().raw(), create_systick_token!());

        // Shift register chain, serial data line n feeds register n
        let data = [
            gpioa.pa0.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpioa.pa1.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpioa.pa4.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpioa.pa5.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpioa.pa6.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpioa.pa7.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpioa.pa8.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper).erase(),
            gpiob.pb0.into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper).erase(),
        ];
        let shift_clock = gpiob
            .pb4
            .into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper);
        let latch = gpiob
            .pb5
            .into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper);
        let display = NixieDisplay::new(
            ShiftChain::new(data, shift_clock, latch),
            DisplayConfig::default(),
        );
        info!("display config: {}", display.config());

        // Initialize UART for GPS
        let tx = gpioa
            .pa2
            .into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
        let rx = gpioa
            .pa3
            .into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);

        let mut uart = Serial::lpuart1(
            cx.device.LPUART1,
            (tx, rx),
            Config::default().baudrate(GPS_BAUD.bps()),
            clocks,
            &mut rcc.apb1r2,
        );
        uart.listen(serial::Event::Rxne);

        // The interrupt owns the producer, the GPS task the consumer
        let (rx_send, rx_recv) = UART_RX.try_split().unwrap();
        debug!("gps rx ring: {} bytes", UART_RX.capacity());

        let (redraw_tx, redraw_rx) = make_channel!(Update, 4);

        // Spawn tasks
        display_task::spawn(redraw_rx).map_err(|_| ()).unwrap();
        gps_task::spawn(Gps::new(rx_recv), redraw_tx)
            .map_err(|_| ())
            .unwrap();

        info!("done initializing!");
        trace!("init exit");
        (
            Shared {
                telemetry: Telemetry::new(),
            },
            Local {
                uart,
                rx_send,
                display,
            },
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        trace!("idle enter");

        loop {
            // Only sleep in release mode, since the debugger doesn't interact with sleep very nicely
            #[cfg(debug_assertions)]
            cortex_m::asm::nop();
            #[cfg(not(debug_assertions))]
            cortex_m::asm::wfi();
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Hardware interrupt handlers /////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////

    // Move received bytes into the ring. Never blocks and never disarms RXNE.
    #[task(binds = LPUART1, priority = 10, local = [uart, rx_send])]
    fn on_uart(cx: on_uart::Context) {
        loop {
            match cx.local.uart.read() {
                Ok(b) => cx.local.rx_send.push(b),
                Err(nb::Error::WouldBlock) => break,
                // Reading cleared the error flags; the line recovers on its own
                Err(nb::Error::Other(_)) => (),
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Periodic tasks //////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////

    // Decode GPS data
    #[task(priority = 2, shared = [telemetry])]
    async fn gps_task(
        mut cx: gps_task::Context,
        mut gps: Gps<UART_RX_BUFSIZE>,
        mut redraw: Sender<'static, Update, 4>,
    ) {
        trace!("gps_task enter");

        loop {
            let update = cx.shared.telemetry.lock(|t| gps.poll(t));
            if update != Update::None {
                trace!("gps update: {}", update);
                if redraw.try_send(update).is_err() {
                    warn!("display fell behind, dropped {}", update);
                }
            }
            Systick::delay(GPS_POLL_MS.millis()).await;
        }
    }

    #[task(priority = 1, shared = [telemetry], local = [display])]
    async fn display_task(
        mut cx: display_task::Context,
        mut redraw_events: Receiver<'static, Update, 4>,
    ) {
        let display = cx.local.display;

        info!("tube self test");
        for pattern in SELF_TEST {
            display.show_pattern(pattern);
            Systick::delay(1.secs()).await;
        }
        for d in 0..10 {
            display.show_digits([d; 8]);
            Systick::delay(200.millis()).await;
        }
        display.blank();

        while let Ok(event) = redraw_events.recv().await {
            debug!("display_task loop, got event {}", event);
            if !event.rmc() {
                continue;
            }

            let telemetry = cx.shared.telemetry.lock(|t| *t);
            debug!("{}", telemetry.diagnostics());
            if let Some(time) = telemetry.clock(CLOCK_MODE) {
                display.show_time(time.hour() as u8, time.minute() as u8, time.second() as u8);
            }
        }
    }
}
