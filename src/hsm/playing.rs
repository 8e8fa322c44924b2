//! Playing sub-machine
//!
//! One scoring cycle: drive forward into the field, rotate until our own
//! beacon is in sight, fire, back out to the reload zone and wait for the
//! reload. Then go again until the match clock runs out.
//!
//! Each leg can end on its timer or on a status line from the peripheral,
//! whichever comes first. The first forward and reverse legs use the shorter
//! launch-distance opcodes.

use crate::hsm::{self, Entry, Handled, Hsm, Signal};
use crate::service::beacon_decoder::DecoderControl;
use crate::system::command::{DriveOpcode, LauncherOpcode};
use crate::system::config::Config;
use crate::system::event::{Events, Team};
use crate::system::services::Services;
use crate::system::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayingState {
    MovingFwd,
    AligningShot,
    Shooting,
    MovingRev,
    Reloading,
}

pub struct PlayingHsm {
    state: PlayingState,
    team: Option<Team>,
    /// Completed reload cycles
    cycles: u8,
    config: Config,
}

impl PlayingHsm {
    pub const fn new(config: Config) -> Self {
        Self {
            state: PlayingState::MovingFwd,
            team: None,
            cycles: 0,
            config,
        }
    }

    /// Starts playing for `team`
    pub fn start<S: Services>(&mut self, entry: Entry, team: Team, services: &mut S) {
        self.team = Some(team);
        if entry == Entry::Fresh {
            self.cycles = 0;
        }
        hsm::start(self, entry, services);
    }

    pub fn run<S: Services>(&mut self, event: Events, services: &mut S) -> Handled {
        hsm::run(self, event, services)
    }

    pub fn exit<S: Services>(&mut self, services: &mut S) {
        hsm::exit(self, services);
    }

    pub fn query(&self) -> PlayingState {
        self.state
    }

    pub fn cycles(&self) -> u8 {
        self.cycles
    }

    fn first_cycle(&self) -> bool {
        self.cycles == 0
    }

    fn moving_fwd<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.arm_timer(TimerId::Movement, self.config.movement_timeout);
                let opcode = if self.first_cycle() {
                    DriveOpcode::DriveFwd0
                } else {
                    DriveOpcode::DriveFwd
                };
                services.send(opcode.into());
                Handled::Consume
            }
            Signal::Exit => {
                services.send(DriveOpcode::Stop.into());
                Handled::Consume
            }
            Signal::Event(Events::Timeout(TimerId::Movement)) => Handled::Remap(Events::EnteredField),
            Signal::Event(event) => Handled::Propagate(event),
        }
    }

    fn aligning_shot<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.beacon(DecoderControl::Start);
                services.send(DriveOpcode::RotateCcw.into());
                Handled::Consume
            }
            Signal::Exit => {
                services.beacon(DecoderControl::Stop);
                services.send(DriveOpcode::Stop.into());
                Handled::Consume
            }
            Signal::Event(Events::BeaconFound(team)) if Some(team) == self.team => {
                Handled::Remap(Events::AlignComplete(team))
            }
            Signal::Event(event) => Handled::Propagate(event),
        }
    }

    fn shooting<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.send(LauncherOpcode::Fire.into());
                services.arm_timer(TimerId::Shooting, self.config.shooting_timeout);
                Handled::Consume
            }
            Signal::Exit => Handled::Consume,
            Signal::Event(Events::Timeout(TimerId::Shooting)) => Handled::Remap(Events::FireComplete),
            Signal::Event(event) => Handled::Propagate(event),
        }
    }

    fn moving_rev<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.arm_timer(TimerId::Movement, self.config.movement_timeout);
                let opcode = if self.first_cycle() {
                    DriveOpcode::DriveRev0
                } else {
                    DriveOpcode::DriveRev
                };
                services.send(opcode.into());
                Handled::Consume
            }
            Signal::Exit => {
                services.send(DriveOpcode::Stop.into());
                Handled::Consume
            }
            Signal::Event(Events::Timeout(TimerId::Movement)) => Handled::Remap(Events::EnteredReload),
            Signal::Event(event) => Handled::Propagate(event),
        }
    }

    fn reloading<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.arm_timer(TimerId::Reloading, self.config.reloading_timeout);
                Handled::Consume
            }
            Signal::Exit => Handled::Consume,
            Signal::Event(Events::Timeout(TimerId::Reloading)) => {
                Handled::Remap(Events::ReloadButtonPressed)
            }
            Signal::Event(event) => Handled::Propagate(event),
        }
    }
}

impl Hsm for PlayingHsm {
    type State = PlayingState;
    const NAME: &'static str = "playing";
    const INITIAL: PlayingState = PlayingState::MovingFwd;

    fn state(&self) -> PlayingState {
        self.state
    }

    fn set_state(&mut self, state: PlayingState) {
        self.state = state;
    }

    fn handle<S: Services>(&mut self, state: PlayingState, signal: Signal, services: &mut S) -> Handled {
        match state {
            PlayingState::MovingFwd => self.moving_fwd(signal, services),
            PlayingState::AligningShot => self.aligning_shot(signal, services),
            PlayingState::Shooting => self.shooting(signal, services),
            PlayingState::MovingRev => self.moving_rev(signal, services),
            PlayingState::Reloading => self.reloading(signal, services),
        }
    }

    fn transition(&mut self, state: PlayingState, event: Events) -> Option<PlayingState> {
        match (state, event) {
            (PlayingState::MovingFwd, Events::EnteredField) => Some(PlayingState::AligningShot),
            (PlayingState::AligningShot, Events::AlignComplete(_)) => Some(PlayingState::Shooting),
            (PlayingState::Shooting, Events::FireComplete) => Some(PlayingState::MovingRev),
            (PlayingState::MovingRev, Events::EnteredReload) => Some(PlayingState::Reloading),
            (PlayingState::Reloading, Events::ReloadButtonPressed) => {
                self.cycles = self.cycles.saturating_add(1);
                debug!("reload cycle {} done", self.cycles);
                Some(PlayingState::MovingFwd)
            }
            _ => None,
        }
    }
}
