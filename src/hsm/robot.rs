//! Robot statechart
//!
//! Top level of the match:
//!
//! ```text
//! Waiting --StartButtonPressed--> Identifying --PlayBall--> Playing --GameOver--> GameOver
//! ```
//!
//! Leaving `Waiting` starts the match clock and raises the flag. The clock is
//! driven by [`TimerId::Game`] expiries that the running sub-machine lets
//! through; once it runs out the expiry is remapped to [`Events::GameOver`].
//! `GameOver` is terminal.

use crate::hsm::identifying::{IdentifyingHsm, IdentifyingState};
use crate::hsm::playing::{PlayingHsm, PlayingState};
use crate::hsm::{self, Entry, Handled, Hsm, Signal};
use crate::system::clock::{ClockTick, GameClock};
use crate::system::command::{DriveOpcode, LauncherOpcode};
use crate::system::config::Config;
use crate::system::event::{Events, Team};
use crate::system::services::Services;
use crate::system::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RobotState {
    Waiting,
    Identifying,
    Playing,
    GameOver,
}

pub struct RobotHsm {
    state: RobotState,
    team: Option<Team>,
    clock: GameClock,
    config: Config,
    identifying: IdentifyingHsm,
    playing: PlayingHsm,
}

impl RobotHsm {
    pub const fn new(config: Config) -> Self {
        Self {
            state: RobotState::Waiting,
            team: None,
            clock: GameClock::new(),
            config,
            identifying: IdentifyingHsm::new(config),
            playing: PlayingHsm::new(config),
        }
    }

    /// Enters `Waiting` from scratch. A running sub-machine is exited first
    /// and both sub-machines are reset.
    pub fn start<S: Services>(&mut self, services: &mut S) {
        if matches!(self.state, RobotState::Identifying | RobotState::Playing) {
            hsm::exit(self, services);
        }
        self.team = None;
        self.clock = GameClock::new();
        self.identifying = IdentifyingHsm::new(self.config);
        self.playing = PlayingHsm::new(self.config);
        hsm::start(self, Entry::Fresh, services);
    }

    /// Feeds one event through the statechart
    pub fn run<S: Services>(&mut self, event: Events, services: &mut S) -> Handled {
        hsm::run(self, event, services)
    }

    pub fn query(&self) -> RobotState {
        self.state
    }

    pub fn identifying(&self) -> IdentifyingState {
        self.identifying.query()
    }

    pub fn playing(&self) -> PlayingState {
        self.playing.query()
    }

    /// Team in play, known once identification is done
    pub fn team(&self) -> Option<Team> {
        self.team
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Counts game timer expiries the sub-machine let through
    fn count_game_time<S: Services>(&mut self, handled: Handled, services: &mut S) -> Handled {
        if handled.event() != Some(Events::Timeout(TimerId::Game)) {
            return handled;
        }
        match self.clock.tick(&self.config) {
            ClockTick::Rearm(duration) => {
                services.arm_timer(TimerId::Game, duration);
                Handled::Consume
            }
            ClockTick::Expired => {
                info!("match clock expired");
                Handled::Remap(Events::GameOver(self.team))
            }
            ClockTick::Idle => Handled::Consume,
        }
    }

    fn waiting<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => Handled::Consume,
            Signal::Exit => {
                let first_tick = self.clock.arm(&self.config);
                services.arm_timer(TimerId::Game, first_tick);
                services.send(LauncherOpcode::FlagUp.into());
                info!("match started");
                Handled::Consume
            }
            Signal::Event(event) => Handled::Propagate(event),
        }
    }

    fn identifying_state<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(entry) => {
                self.identifying.start(entry, services);
                Handled::Consume
            }
            Signal::Exit => {
                self.identifying.exit(services);
                Handled::Consume
            }
            Signal::Event(event) => {
                let handled = self.identifying.run(event, services);
                self.count_game_time(handled, services)
            }
        }
    }

    fn playing_state<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(entry) => {
                match self.team {
                    Some(team) => self.playing.start(entry, team, services),
                    None => warn!("playing entered without a team"),
                }
                Handled::Consume
            }
            Signal::Exit => {
                self.playing.exit(services);
                Handled::Consume
            }
            Signal::Event(event) => {
                let handled = self.playing.run(event, services);
                self.count_game_time(handled, services)
            }
        }
    }

    fn game_over<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.send(DriveOpcode::Stop.into());
                services.send(LauncherOpcode::FlagDown.into());
                info!(
                    "game over, team {:?}, {} reload cycles",
                    self.team,
                    self.playing.cycles()
                );
                Handled::Consume
            }
            Signal::Exit => Handled::Consume,
            Signal::Event(event) => Handled::Propagate(event),
        }
    }
}

impl Hsm for RobotHsm {
    type State = RobotState;
    const NAME: &'static str = "robot";
    const INITIAL: RobotState = RobotState::Waiting;

    fn state(&self) -> RobotState {
        self.state
    }

    fn set_state(&mut self, state: RobotState) {
        self.state = state;
    }

    fn handle<S: Services>(&mut self, state: RobotState, signal: Signal, services: &mut S) -> Handled {
        match state {
            RobotState::Waiting => self.waiting(signal, services),
            RobotState::Identifying => self.identifying_state(signal, services),
            RobotState::Playing => self.playing_state(signal, services),
            RobotState::GameOver => self.game_over(signal, services),
        }
    }

    fn transition(&mut self, state: RobotState, event: Events) -> Option<RobotState> {
        match (state, event) {
            (RobotState::Waiting, Events::StartButtonPressed) => Some(RobotState::Identifying),
            (RobotState::Identifying, Events::PlayBall(team)) => {
                self.team = Some(team);
                Some(RobotState::Playing)
            }
            (RobotState::Playing, Events::GameOver(_)) => Some(RobotState::GameOver),
            _ => None,
        }
    }
}
