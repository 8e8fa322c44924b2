//! Robot service task
//!
//! Owns the robot statechart. Events from the queue are dispatched one at a
//! time, run to completion; between events the input lines are polled by the
//! event checkers, whose events go through the same queue.

use beacon_robot::hsm::checkers::{configure_inputs, EventCheckers, InputLevels};
use beacon_robot::hsm::robot::RobotHsm;
use beacon_robot::system::config::{Config, INPUT_POLL_INTERVAL};
use beacon_robot::system::event;
use beacon_robot::system::pins::Line;
use beacon_robot::system::services::QueueServices;
use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Flex;
use embassy_time::Ticker;

use crate::task::resources::{BoardPins, RobotInputResources};

fn read_levels(pins: &mut BoardPins<'_, 3>) -> InputLevels {
    let mut level = |line| pins.get(line).is_some_and(|pin| pin.is_high());
    InputLevels {
        start_button: level(Line::StartButton),
        fire_update: level(Line::FireUpdate),
        movement_update: level(Line::MovementUpdate),
    }
}

/// Robot service task
///
/// Runs the robot statechart on queued events and polls the input lines.
#[embassy_executor::task]
pub async fn orchestrate(r: RobotInputResources) {
    let config = Config::default();
    let mut pins = BoardPins::new([
        (Line::StartButton, Flex::new(r.start_button)),
        (Line::FireUpdate, Flex::new(r.fire_update)),
        (Line::MovementUpdate, Flex::new(r.movement_update)),
    ]);
    if let Err(e) = configure_inputs(&mut pins) {
        warn!("robot service not started: {}", e);
        return;
    }
    let mut checkers = EventCheckers::new(&config, read_levels(&mut pins));

    let mut services = QueueServices;
    let mut robot = RobotHsm::new(config);
    robot.start(&mut services);
    info!("robot service started in {}", robot.query());

    let mut poll = Ticker::every(INPUT_POLL_INTERVAL);
    loop {
        match select(event::wait(), poll.next()).await {
            Either::First(event) => {
                debug!("robot event {}", event);
                robot.run(event, &mut services);
            }
            Either::Second(()) => {
                for event in checkers.poll(read_levels(&mut pins), &robot) {
                    event::post(event);
                }
            }
        }
    }
}
