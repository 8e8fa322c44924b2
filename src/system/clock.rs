//! Match clock
//!
//! The clock counts one long minute tick, then a fixed number of one-second
//! ticks, and then expires exactly once. It is driven by the game timer and
//! only advances while a sub-machine is running.

use embassy_time::Duration;

use crate::system::config::Config;

/// What the owner should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Re-arm the game timer for this long
    Rearm(Duration),
    /// Match is over
    Expired,
    /// Already expired, nothing to do
    Idle,
}

/// Minutes and seconds elapsed in the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GameClock {
    minutes: u8,
    seconds: u8,
    expired: bool,
}

impl GameClock {
    pub const fn new() -> Self {
        Self {
            minutes: 0,
            seconds: 0,
            expired: false,
        }
    }

    /// Resets the clock and returns the duration of the first tick
    pub fn arm(&mut self, config: &Config) -> Duration {
        *self = Self::new();
        config.game_minute
    }

    /// Advances the clock by one timer expiry
    pub fn tick(&mut self, config: &Config) -> ClockTick {
        if self.expired {
            return ClockTick::Idle;
        }
        if self.minutes < config.game_minute_ticks {
            self.minutes += 1;
            info!("match minute {}", self.minutes);
            ClockTick::Rearm(config.game_minute)
        } else if self.seconds < config.game_second_ticks {
            info!("match minute {} + {} s", self.minutes, self.seconds);
            self.seconds += 1;
            ClockTick::Rearm(config.game_second)
        } else {
            self.expired = true;
            ClockTick::Expired
        }
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_then_seconds_then_expiry() {
        let config = Config::default();
        let mut clock = GameClock::new();
        assert_eq!(clock.arm(&config), Duration::from_secs(60));

        assert_eq!(clock.tick(&config), ClockTick::Rearm(Duration::from_secs(60)));
        for _ in 0..18 {
            assert_eq!(clock.tick(&config), ClockTick::Rearm(Duration::from_secs(1)));
        }
        assert_eq!((clock.minutes(), clock.seconds()), (1, 18));
        assert_eq!(clock.tick(&config), ClockTick::Expired);
        assert!(clock.is_expired());
    }

    #[test]
    fn expires_only_once() {
        let config = Config {
            game_second_ticks: 0,
            ..Config::default()
        };
        let mut clock = GameClock::new();
        clock.arm(&config);
        clock.tick(&config);
        assert_eq!(clock.tick(&config), ClockTick::Expired);
        assert_eq!(clock.tick(&config), ClockTick::Idle);
        assert_eq!(clock.tick(&config), ClockTick::Idle);
    }

    #[test]
    fn arming_resets_progress() {
        let config = Config::default();
        let mut clock = GameClock::new();
        clock.arm(&config);
        clock.tick(&config);
        clock.tick(&config);
        clock.arm(&config);
        assert_eq!((clock.minutes(), clock.seconds()), (0, 0));
    }
}
