//! Bus Commands
//!
//! Single-byte opcodes for the two peripherals that share the SPI bus and the
//! queue through which statecharts hand them to the command serializer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::system::config::BUS_QUEUE_DEPTH;

/// Command serializer queue
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, CommandRequest, BUS_QUEUE_DEPTH> =
    Channel::new();

/// Posts a command request to the serializer without blocking
pub fn post(request: CommandRequest) -> bool {
    let posted = COMMAND_CHANNEL.try_send(request).is_ok();
    if !posted {
        warn!("bus queue full, dropped {:?}", request);
    }
    posted
}

/// Receives the next command request
pub async fn wait() -> CommandRequest {
    COMMAND_CHANNEL.receive().await
}

/// Peripheral behind each chip select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetBus {
    Drivetrain,
    Launcher,
}

/// Drivetrain opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DriveOpcode {
    Stop = 0xD1,
    RotateCcw = 0xD2,
    RotateCw = 0xD3,
    DriveFwd = 0xD4,
    DriveRev = 0xD5,
    /// Forward leg of the first cycle (shorter launch distance)
    DriveFwd0 = 0xD6,
    /// Reverse leg of the first cycle
    DriveRev0 = 0xD7,
}

/// Launcher opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LauncherOpcode {
    FlagUp = 0xF1,
    FlagDown = 0xF2,
    Fire = 0xF3,
    TeamA = 0xF4,
    TeamB = 0xF5,
}

/// A request to transmit one opcode to one peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRequest {
    pub target: TargetBus,
    pub opcode: u8,
}

impl CommandRequest {
    pub const fn drivetrain(opcode: DriveOpcode) -> Self {
        Self {
            target: TargetBus::Drivetrain,
            opcode: opcode as u8,
        }
    }

    pub const fn launcher(opcode: LauncherOpcode) -> Self {
        Self {
            target: TargetBus::Launcher,
            opcode: opcode as u8,
        }
    }
}

impl From<DriveOpcode> for CommandRequest {
    fn from(opcode: DriveOpcode) -> Self {
        Self::drivetrain(opcode)
    }
}

impl From<LauncherOpcode> for CommandRequest {
    fn from(opcode: LauncherOpcode) -> Self {
        Self::launcher(opcode)
    }
}

/// Events handled by the command serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Transmit `CommandRequest` as soon as the bus is idle
    Send(CommandRequest),
    /// The in-flight byte has left the shift register
    TransferComplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_route_to_their_peripheral() {
        let stop = CommandRequest::from(DriveOpcode::Stop);
        assert_eq!(stop.target, TargetBus::Drivetrain);
        assert_eq!(stop.opcode, 0xD1);

        let fire = CommandRequest::from(LauncherOpcode::Fire);
        assert_eq!(fire.target, TargetBus::Launcher);
        assert_eq!(fire.opcode, 0xF3);
    }

    #[test]
    fn first_cycle_legs_have_their_own_opcodes() {
        assert_eq!(DriveOpcode::DriveFwd0 as u8, 0xD6);
        assert_eq!(DriveOpcode::DriveRev0 as u8, 0xD7);
        assert_eq!(LauncherOpcode::TeamB as u8, 0xF5);
    }
}
