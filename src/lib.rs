//! Beacon robot control core
//!
//! Hierarchical statecharts that sequence the robot through a match, plus the
//! two real-time services they lean on: the beacon period decoder and the
//! command serializer that shares one SPI bus between the drivetrain and the
//! launcher.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`system`] | Events, commands, pins, configuration and the service queues |
//! | [`hsm`] | Dispatch protocol and the Robot / Identifying / Playing statecharts |
//! | [`service`] | Beacon decoder and command serializer |
//!
//! Everything in here is hardware independent and runs in host tests. The
//! RP2350 firmware in `main.rs` wires it to embassy tasks.

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod hsm;
pub mod service;
pub mod system;

pub use system::error::Error;
