//! Configuration
//!
//! Timing and classification constants, and the [`Config`] the statecharts are
//! built with.

use embassy_time::Duration;

// Beacon classification, in capture counter ticks (1.25 MHz, 0.8 us per tick)
/// Capture counter frequency
pub const CAPTURE_TICK_HZ: u32 = 1_250_000;
/// Ticks per 4 us
const FOUR_US: u32 = 5;
/// Team A beacon period (300 us, ~3333 Hz)
pub const PERIOD_A: u32 = 75 * FOUR_US;
/// Team B beacon period (1100 us, ~909 Hz)
pub const PERIOD_B: u32 = 275 * FOUR_US;
/// Half-width of each classification window
pub const PERIOD_TOL: u32 = 3 * FOUR_US;

// Match clock
/// Length of the minute tick
pub const GAME_MINUTE: Duration = Duration::from_secs(60);
/// Length of each second tick
pub const GAME_SECOND: Duration = Duration::from_secs(1);
/// Minute ticks before the second ticks start
pub const GAME_MINUTE_TICKS: u8 = 1;
/// Second ticks before the match ends
pub const GAME_SECOND_TICKS: u8 = 18;

// Statechart timers
/// Settle time between the end of alignment and play
pub const STOP_TIMEOUT: Duration = Duration::from_secs(1);
/// Duration of each forward / reverse leg
pub const MOVEMENT_TIMEOUT: Duration = Duration::from_millis(2500);
/// Fallback if the fire-complete line never toggles
pub const SHOOTING_TIMEOUT: Duration = Duration::from_secs(10);
/// Fallback if the reload-complete line never toggles
pub const RELOADING_TIMEOUT: Duration = Duration::from_secs(5);

// Queues
/// Robot service queue depth
pub const ROBOT_QUEUE_DEPTH: usize = 10;
/// Command serializer queue depth
pub const BUS_QUEUE_DEPTH: usize = 8;
/// Timer service queue depth
pub const TIMER_QUEUE_DEPTH: usize = 8;
/// Requests the serializer will hold while a transfer is in flight
pub const DEFERRAL_CAPACITY: usize = 3;

/// Event checker poll interval
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Statechart configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub game_minute: Duration,
    pub game_second: Duration,
    pub game_minute_ticks: u8,
    pub game_second_ticks: u8,
    pub stop_timeout: Duration,
    pub movement_timeout: Duration,
    pub shooting_timeout: Duration,
    pub reloading_timeout: Duration,
    /// Use the movement-update line to end forward / reverse legs.
    /// Off by default: the legs are timed.
    pub movement_feedback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_minute: GAME_MINUTE,
            game_second: GAME_SECOND,
            game_minute_ticks: GAME_MINUTE_TICKS,
            game_second_ticks: GAME_SECOND_TICKS,
            stop_timeout: STOP_TIMEOUT,
            movement_timeout: MOVEMENT_TIMEOUT,
            shooting_timeout: SHOOTING_TIMEOUT,
            reloading_timeout: RELOADING_TIMEOUT,
            movement_feedback: false,
        }
    }
}
