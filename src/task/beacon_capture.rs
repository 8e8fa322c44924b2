//! Beacon capture task
//!
//! A PWM slice free-runs as a 16-bit counter at the capture tick rate. Every
//! falling edge of the receiver output samples it and feeds the beacon
//! decoder. The counter wrap is detected by sampling it more often than it
//! wraps; a wrap seen by an edge sample is handed to the decoder as the
//! pending rollover flag.

use beacon_robot::service::beacon_decoder::{self, BeaconDecoder};
use beacon_robot::system::config::CAPTURE_TICK_HZ;
use beacon_robot::system::event::{self, Events};
use beacon_robot::system::pins::Line;
use defmt::{info, warn};
use embassy_futures::select::{select3, Either3};
use embassy_rp::gpio::Flex;
use embassy_rp::pwm::{self, Pwm};
use embassy_time::{Duration, Ticker};

use crate::task::resources::{BeaconResources, BoardPins};

/// Wrap detection interval, well under half a counter period (52 ms)
const WRAP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Free-running counter with wrap detection
struct CaptureCounter<'d> {
    pwm: Pwm<'d>,
    last: u16,
}

impl CaptureCounter<'_> {
    /// Current count, and whether the counter wrapped since the last sample
    fn sample(&mut self) -> (u16, bool) {
        let now = self.pwm.counter();
        let wrapped = now < self.last;
        self.last = now;
        (now, wrapped)
    }

    fn restart(&mut self) {
        self.pwm.set_counter(0);
        self.last = 0;
    }
}

/// Beacon capture task
///
/// Timestamps receiver edges, tracks counter wraps and applies decoder control.
#[embassy_executor::task]
pub async fn beacon_capture(r: BeaconResources) {
    let mut pins = BoardPins::new([(Line::Beacon, Flex::new(r.receiver_pin))]);
    let mut decoder = BeaconDecoder::new();
    if let Err(e) = decoder.init(&mut pins) {
        warn!("beacon decoder not started: {}", e);
        return;
    }

    let divider = (embassy_rp::clocks::clk_sys_freq() / CAPTURE_TICK_HZ) as u8;
    let mut config = pwm::Config::default();
    config.divider = divider.into();
    config.top = u16::MAX;
    let mut counter = CaptureCounter {
        pwm: Pwm::new_free(r.counter_slice, config),
        last: 0,
    };

    let Some(receiver) = pins.get(Line::Beacon) else {
        return;
    };
    let mut wrap_poll = Ticker::every(WRAP_POLL_INTERVAL);
    info!("beacon capture started");

    loop {
        match select3(
            receiver.wait_for_falling_edge(),
            wrap_poll.next(),
            beacon_decoder::wait_control(),
        )
        .await
        {
            Either3::First(()) => {
                let (captured, mut pending) = counter.sample();
                if let Some(team) = decoder.on_capture(captured, &mut pending) {
                    event::post(Events::BeaconFound(team));
                }
                // Wrap came after the edge
                if pending {
                    decoder.on_rollover();
                }
            }
            Either3::Second(()) => {
                if counter.sample().1 {
                    decoder.on_rollover();
                }
            }
            Either3::Third(control) => {
                counter.restart();
                decoder.apply(control);
            }
        }
    }
}
