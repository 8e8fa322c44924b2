//! Robot firmware entry point
//!
//! Initializes the RP2350 and spawns one task per service: the robot
//! statechart, the timer service, the beacon capture and the command bus.

#![no_std]
#![no_main]

use crate::task::{
    beacon_capture::beacon_capture, command_bus::command_bus, orchestrate::orchestrate,
    timers::timers,
};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use task::resources::{
    AssignedResources, BeaconResources, CommandBusResources, RobotInputResources,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // Split the resources into separate groups for each task
    let r = split_resources!(p);

    // Consumers of the service queues first, so nothing posted at start-up is lost
    spawner.spawn(timers()).unwrap();
    spawner.spawn(command_bus(r.command_bus)).unwrap();
    spawner.spawn(beacon_capture(r.beacon)).unwrap();
    // The robot statechart posts on entry, so it starts last
    spawner.spawn(orchestrate(r.robot_inputs)).unwrap();
}
