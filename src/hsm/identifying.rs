//! Identifying sub-machine
//!
//! Spins in place until the beacon decoder classifies a period, announces the
//! team to the launcher, then holds still for a settle time before handing
//! [`Events::PlayBall`] to the robot.

use crate::hsm::{self, Entry, Handled, Hsm, Signal};
use crate::service::beacon_decoder::DecoderControl;
use crate::system::command::{CommandRequest, DriveOpcode};
use crate::system::config::Config;
use crate::system::event::{Events, Team};
use crate::system::services::Services;
use crate::system::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentifyingState {
    /// Rotating with the decoder armed
    Align,
    /// Stopped, waiting out the settle timer
    Idling,
}

pub struct IdentifyingHsm {
    state: IdentifyingState,
    team: Option<Team>,
    config: Config,
}

impl IdentifyingHsm {
    pub const fn new(config: Config) -> Self {
        Self {
            state: IdentifyingState::Align,
            team: None,
            config,
        }
    }

    pub fn start<S: Services>(&mut self, entry: Entry, services: &mut S) {
        if entry == Entry::Fresh {
            self.team = None;
        }
        hsm::start(self, entry, services);
    }

    pub fn run<S: Services>(&mut self, event: Events, services: &mut S) -> Handled {
        hsm::run(self, event, services)
    }

    pub fn exit<S: Services>(&mut self, services: &mut S) {
        hsm::exit(self, services);
    }

    pub fn query(&self) -> IdentifyingState {
        self.state
    }

    /// Team recorded when alignment completed
    pub fn team(&self) -> Option<Team> {
        self.team
    }

    fn align<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.beacon(DecoderControl::Start);
                services.send(DriveOpcode::RotateCcw.into());
                Handled::Consume
            }
            Signal::Exit => {
                services.beacon(DecoderControl::Stop);
                Handled::Consume
            }
            Signal::Event(Events::BeaconFound(team)) => {
                info!("beacon says team {:?}", team);
                services.send(CommandRequest::from(team.announcement()));
                Handled::Remap(Events::AlignComplete(team))
            }
            Signal::Event(event) => Handled::Propagate(event),
        }
    }

    fn idling<S: Services>(&mut self, signal: Signal, services: &mut S) -> Handled {
        match signal {
            Signal::Entry(_) => {
                services.send(DriveOpcode::Stop.into());
                services.arm_timer(TimerId::Stop, self.config.stop_timeout);
                Handled::Consume
            }
            Signal::Exit => Handled::Consume,
            Signal::Event(Events::Timeout(TimerId::Stop)) => match self.team {
                Some(team) => Handled::Remap(Events::PlayBall(team)),
                None => Handled::Propagate(Events::Timeout(TimerId::Stop)),
            },
            Signal::Event(event) => Handled::Propagate(event),
        }
    }
}

impl Hsm for IdentifyingHsm {
    type State = IdentifyingState;
    const NAME: &'static str = "identifying";
    const INITIAL: IdentifyingState = IdentifyingState::Align;

    fn state(&self) -> IdentifyingState {
        self.state
    }

    fn set_state(&mut self, state: IdentifyingState) {
        self.state = state;
    }

    fn handle<S: Services>(
        &mut self,
        state: IdentifyingState,
        signal: Signal,
        services: &mut S,
    ) -> Handled {
        match state {
            IdentifyingState::Align => self.align(signal, services),
            IdentifyingState::Idling => self.idling(signal, services),
        }
    }

    fn transition(&mut self, state: IdentifyingState, event: Events) -> Option<IdentifyingState> {
        match (state, event) {
            (IdentifyingState::Align, Events::AlignComplete(team)) => {
                self.team = Some(team);
                Some(IdentifyingState::Idling)
            }
            _ => None,
        }
    }
}
