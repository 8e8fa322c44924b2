//! Hierarchical state machine dispatch
//!
//! All three statecharts share one dispatch protocol. Each state has a single
//! handler that receives either a pseudo-event ([`Signal::Entry`],
//! [`Signal::Exit`]) or a domain event, and answers with a [`Handled`]:
//!
//! - `Propagate(event)`: the event passes through unchanged
//! - `Remap(event)`: the handler replaced it, e.g. a sub-machine's completion
//!   translated into the parent's vocabulary
//! - `Consume`: the event stops here
//!
//! [`run`] feeds the event to the current state's handler, matches whatever
//! comes back against that state's transition table and, on a match, runs the
//! exit handler of the old state strictly before the entry handler of the new
//! one. Entry and exit results never reach the caller.
//!
//! Nesting is two levels deep: the robot's `Identifying` and `Playing` handlers
//! start, run and exit their sub-machine.

pub mod checkers;
pub mod identifying;
pub mod playing;
pub mod robot;

use crate::system::event::Events;
use crate::system::services::Services;

/// How a state is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Entry {
    /// Reset to the machine's initial state
    Fresh,
    /// Resume whatever state the machine was in
    History,
}

/// What a state handler is asked to process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    Entry(Entry),
    Exit,
    Event(Events),
}

/// Outcome of a state handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handled {
    Propagate(Events),
    Remap(Events),
    Consume,
}

impl Handled {
    /// The event that continues upward, if any
    pub fn event(self) -> Option<Events> {
        match self {
            Handled::Propagate(event) | Handled::Remap(event) => Some(event),
            Handled::Consume => None,
        }
    }
}

/// Bound for values that can be logged in both `log` and `defmt` builds
#[cfg(feature = "defmt")]
pub trait Loggable: core::fmt::Debug + defmt::Format {}
#[cfg(feature = "defmt")]
impl<T: core::fmt::Debug + defmt::Format> Loggable for T {}

/// Bound for values that can be logged in both `log` and `defmt` builds
#[cfg(not(feature = "defmt"))]
pub trait Loggable: core::fmt::Debug {}
#[cfg(not(feature = "defmt"))]
impl<T: core::fmt::Debug> Loggable for T {}

/// A flat level of the statechart
pub trait Hsm {
    type State: Copy + PartialEq + Loggable;

    /// Machine name for the transition log
    const NAME: &'static str;
    /// State entered on a fresh start
    const INITIAL: Self::State;

    fn state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State);

    /// Per-state handler
    fn handle<S: Services>(&mut self, state: Self::State, signal: Signal, services: &mut S)
        -> Handled;

    /// Transition table of `state`. May update extended state (counters,
    /// recorded team) for the transition it accepts.
    fn transition(&mut self, state: Self::State, event: Events) -> Option<Self::State>;
}

/// Enters the machine, resetting it first unless `entry` asks for history
pub fn start<M: Hsm, S: Services>(machine: &mut M, entry: Entry, services: &mut S) {
    if entry == Entry::Fresh {
        machine.set_state(M::INITIAL);
    }
    let state = machine.state();
    debug!("{}: start in {:?} ({:?})", M::NAME, state, entry);
    machine.handle(state, Signal::Entry(entry), services);
}

/// Runs the exit handler of the current state
pub fn exit<M: Hsm, S: Services>(machine: &mut M, services: &mut S) {
    let state = machine.state();
    machine.handle(state, Signal::Exit, services);
}

/// Dispatches one domain event and performs at most one transition
pub fn run<M: Hsm, S: Services>(machine: &mut M, event: Events, services: &mut S) -> Handled {
    let current = machine.state();
    let handled = machine.handle(current, Signal::Event(event), services);
    if let Some(event) = handled.event() {
        if let Some(next) = machine.transition(current, event) {
            transition(machine, next, services);
        }
    }
    handled
}

/// Exit the current state, switch, then enter `next` with history
fn transition<M: Hsm, S: Services>(machine: &mut M, next: M::State, services: &mut S) {
    let previous = machine.state();
    machine.handle(previous, Signal::Exit, services);
    machine.set_state(next);
    info!("{}: {:?} -> {:?}", M::NAME, previous, next);
    machine.handle(next, Signal::Entry(Entry::History), services);
}


#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        On,
    }

    /// Toggle that logs every signal it sees and remaps the start button
    struct Switch {
        state: Light,
        seen: Vec<(Light, Signal)>,
    }

    impl Hsm for Switch {
        type State = Light;
        const NAME: &'static str = "switch";
        const INITIAL: Light = Light::Off;

        fn state(&self) -> Light {
            self.state
        }

        fn set_state(&mut self, state: Light) {
            self.state = state;
        }

        fn handle<S: Services>(&mut self, state: Light, signal: Signal, _services: &mut S) -> Handled {
            self.seen.push((state, signal));
            match signal {
                Signal::Event(Events::StartButtonPressed) => Handled::Remap(Events::FireComplete),
                Signal::Event(Events::EnteredField) => Handled::Consume,
                Signal::Event(event) => Handled::Propagate(event),
                _ => Handled::Consume,
            }
        }

        fn transition(&mut self, state: Light, event: Events) -> Option<Light> {
            match (state, event) {
                (Light::Off, Events::FireComplete) => Some(Light::On),
                (Light::On, Events::FireComplete) => Some(Light::Off),
                _ => None,
            }
        }
    }

    fn switch() -> Switch {
        Switch {
            state: Light::On,
            seen: Vec::new(),
        }
    }

    #[test]
    fn fresh_start_resets_to_initial_state() {
        let mut machine = switch();
        start(&mut machine, Entry::Fresh, &mut Recorder::default());
        assert_eq!(machine.state, Light::Off);
        assert_eq!(machine.seen, [(Light::Off, Signal::Entry(Entry::Fresh))]);
    }

    #[test]
    fn history_start_resumes() {
        let mut machine = switch();
        start(&mut machine, Entry::History, &mut Recorder::default());
        assert_eq!(machine.state, Light::On);
    }

    #[test]
    fn exit_runs_before_entry_exactly_once() {
        let mut machine = switch();
        start(&mut machine, Entry::Fresh, &mut Recorder::default());
        machine.seen.clear();

        let handled = run(&mut machine, Events::StartButtonPressed, &mut Recorder::default());

        assert_eq!(handled, Handled::Remap(Events::FireComplete));
        assert_eq!(
            machine.seen,
            [
                (Light::Off, Signal::Event(Events::StartButtonPressed)),
                (Light::Off, Signal::Exit),
                (Light::On, Signal::Entry(Entry::History)),
            ]
        );
    }

    #[test]
    fn propagated_event_without_match_stays_put() {
        let mut machine = switch();
        start(&mut machine, Entry::Fresh, &mut Recorder::default());
        let handled = run(&mut machine, Events::EnteredReload, &mut Recorder::default());
        assert_eq!(handled, Handled::Propagate(Events::EnteredReload));
        assert_eq!(machine.state, Light::Off);
    }

    #[test]
    fn consumed_event_never_transitions() {
        let mut machine = switch();
        start(&mut machine, Entry::Fresh, &mut Recorder::default());
        machine.seen.clear();
        assert_eq!(
            run(&mut machine, Events::EnteredField, &mut Recorder::default()),
            Handled::Consume
        );
        assert_eq!(machine.seen.len(), 1);
        assert_eq!(machine.state, Light::Off);
    }

    #[test]
    fn event_accessor() {
        assert_eq!(
            Handled::Remap(Events::FireComplete).event(),
            Some(Events::FireComplete)
        );
        assert_eq!(Handled::Consume.event(), None);
    }
}
