//! Beacon period decoder
//!
//! The two beacons emit square waves of different fixed periods. A free-running
//! 16-bit capture counter is timestamped on every falling edge of the receiver
//! output; a rollover counter extends it to 32 bits. The difference between two
//! consecutive timestamps is the period, which is classified into Team A,
//! Team B or noise.
//!
//! # Rollover handling
//! The counter overflow raises a flag that the periodic rollover handler turns
//! into `rollover += 1`. A capture can race that handler: if the flag is
//! already pending and the captured count is in the lower half of the range,
//! the edge happened after the wrap, so the capture consumes the flag itself
//! before forming the timestamp. A pending flag with an upper-half count
//! belongs to a wrap that happened after the edge and is left alone.
//!
//! Callers read and clear the hardware flag inside a critical section so the
//! 32-bit timestamp is never torn.
//!
//! Classification is reported on every qualifying edge while the decoder is
//! armed. Consumers act on the first one and ignore the rest.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::system::config::{PERIOD_A, PERIOD_B, PERIOD_TOL};
use crate::system::error::Error;
use crate::system::event::Team;
use crate::system::pins::{configure_all, ConfigurePin, Line, PinMode};

/// Captured counts below this value were taken after a pending wrap
const ROLLOVER_SPLIT: u16 = 0x8000;

/// Decoder control signal, raised by the statecharts
static DECODER_CONTROL: Signal<CriticalSectionRawMutex, DecoderControl> = Signal::new();

/// Starts or stops the decoder
pub fn control(control: DecoderControl) {
    DECODER_CONTROL.signal(control);
}

/// Waits for the next control request
pub async fn wait_control() -> DecoderControl {
    DECODER_CONTROL.wait().await
}

/// Decoder control requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderControl {
    Start,
    Stop,
}

/// Classifies a measured period, in capture ticks
///
/// Each beacon owns a closed window of `PERIOD_TOL` ticks on either side of
/// its nominal period. Anything else is noise.
pub fn classify(period: u32) -> Option<Team> {
    if period.abs_diff(PERIOD_A) <= PERIOD_TOL {
        Some(Team::A)
    } else if period.abs_diff(PERIOD_B) <= PERIOD_TOL {
        Some(Team::B)
    } else {
        None
    }
}

/// Edge timestamp to period to team
#[derive(Debug, Default)]
pub struct BeaconDecoder {
    armed: bool,
    last_time: u32,
    rollover: u16,
    period: u32,
}

impl BeaconDecoder {
    pub const fn new() -> Self {
        Self {
            armed: false,
            last_time: 0,
            rollover: 0,
            period: 0,
        }
    }

    /// Configures the receiver input
    pub fn init<P: ConfigurePin>(&mut self, pins: &mut P) -> Result<(), Error> {
        configure_all(pins, &[(Line::Beacon, PinMode::Input)])?;
        self.stop();
        Ok(())
    }

    /// Arms the decoder from a clean slate. The capture counter is expected
    /// to restart from zero at the same time.
    pub fn start(&mut self) {
        self.last_time = 0;
        self.rollover = 0;
        self.period = 0;
        self.armed = true;
        debug!("beacon decoder armed");
    }

    /// Disarms the decoder; edges are ignored until the next start
    pub fn stop(&mut self) {
        self.armed = false;
        debug!("beacon decoder disarmed");
    }

    pub fn apply(&mut self, control: DecoderControl) {
        match control {
            DecoderControl::Start => self.start(),
            DecoderControl::Stop => self.stop(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Last measured period, in ticks
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Counter overflow handler
    pub fn on_rollover(&mut self) {
        self.rollover = self.rollover.wrapping_add(1);
    }

    /// Handles one captured edge
    ///
    /// `rollover_pending` is the counter overflow flag as read together with
    /// `captured`. It is cleared when this capture accounts for the wrap; the
    /// caller must then clear the hardware flag as well.
    pub fn on_capture(&mut self, captured: u16, rollover_pending: &mut bool) -> Option<Team> {
        if *rollover_pending && captured < ROLLOVER_SPLIT {
            self.on_rollover();
            *rollover_pending = false;
        }
        if !self.armed {
            return None;
        }

        let this_time = (u32::from(self.rollover) << 16) | u32::from(captured);
        self.period = this_time.wrapping_sub(self.last_time);
        self.last_time = this_time;

        classify(self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds edges `period` ticks apart, wrapping the 16-bit counter like the
    /// hardware would
    fn edges(decoder: &mut BeaconDecoder, start: u32, period: u32, count: u32) -> Vec<Option<Team>> {
        let mut results = Vec::new();
        let mut counter = start;
        let mut wraps_seen = start >> 16;
        for _ in 0..count {
            counter += period;
            while wraps_seen < counter >> 16 {
                decoder.on_rollover();
                wraps_seen += 1;
            }
            let mut pending = false;
            results.push(decoder.on_capture(counter as u16, &mut pending));
        }
        results
    }

    #[test]
    fn classification_bands() {
        assert_eq!(classify(375), Some(Team::A));
        assert_eq!(classify(1375), Some(Team::B));
        assert_eq!(classify(390), Some(Team::A));
        assert_eq!(classify(360), Some(Team::A));
        assert_eq!(classify(1390), Some(Team::B));
        assert_eq!(classify(1391), None);
        assert_eq!(classify(391), None);
        assert_eq!(classify(900), None);
        assert_eq!(classify(0), None);
    }

    #[test]
    fn disarmed_decoder_reports_nothing() {
        let mut decoder = BeaconDecoder::new();
        let mut pending = false;
        assert_eq!(decoder.on_capture(375, &mut pending), None);
        assert_eq!(decoder.on_capture(750, &mut pending), None);
    }

    #[test]
    fn reports_on_every_qualifying_edge() {
        let mut decoder = BeaconDecoder::new();
        decoder.start();
        let results = edges(&mut decoder, 0, 1375, 5);
        assert!(results.iter().all(|r| *r == Some(Team::B)));
    }

    #[test]
    fn period_spans_a_counter_rollover() {
        let mut decoder = BeaconDecoder::new();
        decoder.start();
        let mut pending = false;
        decoder.on_capture(0xFF00, &mut pending);

        decoder.on_rollover();
        // 0xFF00 -> 0x1_0077 is 375 ticks
        assert_eq!(decoder.on_capture(0x0077, &mut pending), Some(Team::A));
        assert_eq!(decoder.period(), 375);
    }

    #[test]
    fn capture_consumes_pending_wrap_in_lower_half() {
        let mut decoder = BeaconDecoder::new();
        decoder.start();
        let mut pending = false;
        decoder.on_capture(0xFF00, &mut pending);

        // The wrap happened but the rollover handler has not run yet
        let mut pending = true;
        assert_eq!(decoder.on_capture(0x0077, &mut pending), Some(Team::A));
        assert!(!pending);
    }

    #[test]
    fn capture_leaves_pending_wrap_in_upper_half() {
        let mut decoder = BeaconDecoder::new();
        decoder.start();
        let mut pending = false;
        decoder.on_capture(0xF000, &mut pending);

        // Edge came just before the wrap; the handler will count it
        let mut pending = true;
        assert_eq!(decoder.on_capture(0xF177, &mut pending), Some(Team::A));
        assert!(pending);
        decoder.on_rollover();

        let mut pending = false;
        // 0xF177 -> 0x1_0124 is 4013 ticks: noise
        assert_eq!(decoder.on_capture(0x0124, &mut pending), None);
        assert_eq!(decoder.period(), 0x1_0124 - 0xF177);
    }

    #[test]
    fn many_wraps_keep_classifying() {
        let mut decoder = BeaconDecoder::new();
        decoder.start();
        let results = edges(&mut decoder, 0xFE00, 375, 400);
        // The first edge measures from the arm point and is noise
        assert!(results[1..].iter().all(|r| *r == Some(Team::A)));
    }

    #[test]
    fn restart_clears_history() {
        let mut decoder = BeaconDecoder::new();
        decoder.start();
        edges(&mut decoder, 0, 375, 3);
        decoder.stop();
        assert!(!decoder.is_armed());

        decoder.apply(DecoderControl::Start);
        assert!(decoder.is_armed());
        assert_eq!(decoder.period(), 0);
        let mut pending = false;
        // Measured from the restarted counter
        assert_eq!(decoder.on_capture(1380, &mut pending), Some(Team::B));
    }
}
