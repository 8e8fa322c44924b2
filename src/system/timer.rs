//! Single-shot timers
//!
//! Statecharts arm timers by id; the timer service posts
//! [`Events::Timeout`](crate::system::event::Events::Timeout) when one expires.
//! Re-arming a running timer restarts it. There is no cancel: a state that no
//! longer cares about a timer ignores the late timeout.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant};

use crate::system::config::TIMER_QUEUE_DEPTH;

/// Timer identifiers, one per logical timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    /// Match clock
    Game,
    /// Settle time after identification
    Stop,
    /// Forward / reverse leg
    Movement,
    /// Fallback for the fire-complete line
    Shooting,
    /// Fallback for the reload-complete line
    Reloading,
}

impl TimerId {
    /// Number of timers
    pub const COUNT: usize = 5;

    /// Every timer, in index order
    pub const ALL: [TimerId; Self::COUNT] = [
        TimerId::Game,
        TimerId::Stop,
        TimerId::Movement,
        TimerId::Shooting,
        TimerId::Reloading,
    ];

    /// Slot of this timer in per-timer tables
    pub const fn index(self) -> usize {
        match self {
            TimerId::Game => 0,
            TimerId::Stop => 1,
            TimerId::Movement => 2,
            TimerId::Shooting => 3,
            TimerId::Reloading => 4,
        }
    }
}

/// Request to (re)arm a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmTimer {
    pub timer: TimerId,
    pub duration: Duration,
}

/// Timer service queue
pub static TIMER_CHANNEL: Channel<CriticalSectionRawMutex, ArmTimer, TIMER_QUEUE_DEPTH> =
    Channel::new();

/// Arms `timer` to fire once after `duration`
pub fn arm(timer: TimerId, duration: Duration) -> bool {
    let posted = TIMER_CHANNEL.try_send(ArmTimer { timer, duration }).is_ok();
    if !posted {
        warn!("timer queue full, {:?} not armed", timer);
    }
    posted
}

/// Receives the next arm request
pub async fn wait() -> ArmTimer {
    TIMER_CHANNEL.receive().await
}

/// Deadlines of the armed timers
#[derive(Debug, Clone, Default)]
pub struct TimerTable {
    deadlines: [Option<Instant>; TimerId::COUNT],
}

impl TimerTable {
    pub const fn new() -> Self {
        Self {
            deadlines: [None; TimerId::COUNT],
        }
    }

    /// Arms `request.timer` relative to `now`, replacing any running deadline
    pub fn arm(&mut self, request: ArmTimer, now: Instant) {
        self.deadlines[request.timer.index()] = Some(now + request.duration);
    }

    /// Earliest running deadline
    pub fn next(&self) -> Option<(TimerId, Instant)> {
        TimerId::ALL
            .iter()
            .zip(self.deadlines.iter())
            .filter_map(|(timer, deadline)| deadline.map(|at| (*timer, at)))
            .min_by_key(|(_, at)| *at)
    }

    /// Removes and returns every timer due at `now`, earliest first
    pub fn expire(&mut self, now: Instant) -> heapless::Vec<TimerId, { TimerId::COUNT }> {
        let mut due = heapless::Vec::new();
        while let Some((timer, at)) = self.next() {
            if at > now {
                break;
            }
            self.deadlines[timer.index()] = None;
            // Never more than one entry per timer
            let _ = due.push(timer);
        }
        due
    }

    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.deadlines[timer.index()].is_some()
    }
}
