//! Timer service task
//!
//! Owns the deadline table of the single-shot statechart timers and posts a
//! timeout event to the robot service whenever one expires.

use beacon_robot::system::event::{self, Events};
use beacon_robot::system::timer::{self, TimerTable};
use defmt::debug;
use embassy_futures::select::{select, Either};
use embassy_time::{Instant, Timer};

/// Timer service task
///
/// Waits for the earliest armed deadline or a new arm request, whichever comes first.
#[embassy_executor::task]
pub async fn timers() {
    let mut table = TimerTable::new();
    loop {
        let expiry = async {
            match table.next() {
                Some((_, at)) => Timer::at(at).await,
                None => core::future::pending().await,
            }
        };
        let next = select(timer::wait(), expiry).await;
        match next {
            Either::First(request) => {
                debug!("arm {} for {} ms", request.timer, request.duration.as_millis());
                table.arm(request, Instant::now());
            }
            Either::Second(()) => {
                for id in table.expire(Instant::now()) {
                    event::post(Events::Timeout(id));
                }
            }
        }
    }
}
