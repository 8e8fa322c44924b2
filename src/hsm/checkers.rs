//! Input event checkers
//!
//! The start button and the two peripheral status lines are polled. Each
//! checker compares the current level with the level seen on the previous
//! poll and turns a change into a robot event when the statechart is in a
//! state that cares. The last level is latched on every poll, relevant or
//! not, so a change that happens while nobody listens is not reported late.

use crate::hsm::playing::PlayingState;
use crate::hsm::robot::{RobotHsm, RobotState};
use crate::system::config::Config;
use crate::system::error::Error;
use crate::system::event::Events;
use crate::system::pins::{configure_all, ConfigurePin, Line, PinMode};

/// Raw levels of the polled inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputLevels {
    pub start_button: bool,
    /// High once the launcher has fired, low once it is reloaded
    pub fire_update: bool,
    pub movement_update: bool,
}

/// Configures the polled inputs
pub fn configure_inputs<P: ConfigurePin>(pins: &mut P) -> Result<(), Error> {
    configure_all(
        pins,
        &[
            (Line::StartButton, PinMode::InputPullUp),
            (Line::FireUpdate, PinMode::Input),
            (Line::MovementUpdate, PinMode::Input),
        ],
    )
}

/// Level change detector
#[derive(Debug, Clone, Copy)]
struct Edge {
    last: bool,
}

impl Edge {
    /// Latches `level` and reports whether it differs from the last one
    fn changed(&mut self, level: bool) -> bool {
        let changed = level != self.last;
        self.last = level;
        changed
    }
}

pub struct EventCheckers {
    start_button: Edge,
    fire_update: Edge,
    movement_update: Edge,
    movement_feedback: bool,
}

impl EventCheckers {
    /// Starts from the levels read right after the inputs were configured
    pub fn new(config: &Config, initial: InputLevels) -> Self {
        Self {
            start_button: Edge {
                last: initial.start_button,
            },
            fire_update: Edge {
                last: initial.fire_update,
            },
            movement_update: Edge {
                last: initial.movement_update,
            },
            movement_feedback: config.movement_feedback,
        }
    }

    /// Any start button change while waiting starts the match
    pub fn check_start_button(&mut self, level: bool, robot: &RobotHsm) -> Option<Events> {
        let changed = self.start_button.changed(level);
        (changed && robot.query() == RobotState::Waiting).then_some(Events::StartButtonPressed)
    }

    /// Rising edge ends a shot, falling edge ends a reload
    pub fn check_fire_update(&mut self, level: bool, robot: &RobotHsm) -> Option<Events> {
        if !self.fire_update.changed(level) || robot.query() != RobotState::Playing {
            return None;
        }
        match (robot.playing(), level) {
            (PlayingState::Shooting, true) => Some(Events::FireComplete),
            (PlayingState::Reloading, false) => Some(Events::ReloadButtonPressed),
            _ => None,
        }
    }

    /// Any change ends the current drive leg, when feedback is enabled
    pub fn check_movement_update(&mut self, level: bool, robot: &RobotHsm) -> Option<Events> {
        let changed = self.movement_update.changed(level);
        if !changed || !self.movement_feedback || robot.query() != RobotState::Playing {
            return None;
        }
        match robot.playing() {
            PlayingState::MovingFwd => Some(Events::EnteredField),
            PlayingState::MovingRev => Some(Events::EnteredReload),
            _ => None,
        }
    }

    /// Runs every checker once, in a fixed order
    pub fn poll(&mut self, levels: InputLevels, robot: &RobotHsm) -> heapless::Vec<Events, 3> {
        let mut events = heapless::Vec::new();
        let checks = [
            self.check_start_button(levels.start_button, robot),
            self.check_fire_update(levels.fire_update, robot),
            self.check_movement_update(levels.movement_update, robot),
        ];
        // At most one event per checker, so this never overflows
        for event in checks.into_iter().flatten() {
            let _ = events.push(event);
        }
        events
    }
}
