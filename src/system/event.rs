//! System Events
//!
//! Defines the robot's event vocabulary and the robot service queue.
//!
//! Producers (event checkers, the beacon decoder, the timer service) post
//! without blocking; the robot service drains the queue in FIFO order and
//! feeds each event to the top-level statechart.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::system::command::LauncherOpcode;
use crate::system::config::ROBOT_QUEUE_DEPTH;
use crate::system::timer::TimerId;

/// Robot service queue
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, Events, ROBOT_QUEUE_DEPTH> =
    Channel::new();

/// Posts an event to the robot service without blocking
///
/// Returns `false` when the queue is full and the event was dropped. Safe to
/// call from interrupt context.
pub fn post(event: Events) -> bool {
    let posted = EVENT_CHANNEL.try_send(event).is_ok();
    if !posted {
        warn!("robot queue full, dropped {:?}", event);
    }
    posted
}

/// Receives the next event for the robot service
pub async fn wait() -> Events {
    EVENT_CHANNEL.receive().await
}

/// Team identity, resolved once while identifying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Team {
    A,
    B,
}

impl Team {
    /// Launcher opcode that announces this team
    pub const fn announcement(self) -> LauncherOpcode {
        match self {
            Team::A => LauncherOpcode::TeamA,
            Team::B => LauncherOpcode::TeamB,
        }
    }
}

/// Robot events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Events {
    /// Start button changed level while waiting
    StartButtonPressed,
    /// Beacon decoder classified a period
    BeaconFound(Team),
    /// Sub-machine finished aligning on a beacon
    AlignComplete(Team),
    /// Identification done, the match can start
    PlayBall(Team),
    /// Forward leg finished
    EnteredField,
    /// Reverse leg finished
    EnteredReload,
    /// Launcher reported the shot
    FireComplete,
    /// Reload finished
    ReloadButtonPressed,
    /// Match clock ran out, carries the team for the record
    GameOver(Option<Team>),
    /// A single-shot timer expired
    Timeout(TimerId),
}
