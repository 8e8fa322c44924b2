//! Hardware Resource Management
//!
//! Splits the RP2350 peripherals into one group per task, so each task owns
//! exactly the pins it drives.
//!
//! # Resource Groups
//! - Robot inputs: start button and the two peripheral status lines
//! - Beacon: receiver output and the PWM slice used as capture counter
//! - Command bus: SPI, its TX DMA channel and the two chip selects

use assign_resources::assign_resources;
use beacon_robot::system::pins::{ConfigurePin, Line, PinMode};
use embassy_rp::gpio::{Flex, Pull};
use embassy_rp::peripherals;

assign_resources! {
    /// Start button (to ground) and launcher / drivetrain status lines
    robot_inputs: RobotInputResources {
        start_button: PIN_16,
        fire_update: PIN_17,
        movement_update: PIN_18,
    },
    /// Beacon receiver output and the free-running capture counter
    beacon: BeaconResources {
        receiver_pin: PIN_26,
        counter_slice: PWM_SLICE3,
    },
    /// Shared command bus: drivetrain and launcher behind separate chip selects
    command_bus: CommandBusResources {
        spi: SPI0,
        clk_pin: PIN_2,
        mosi_pin: PIN_3,
        tx_dma: DMA_CH0,
        drivetrain_cs: PIN_5,
        launcher_cs: PIN_6,
    },
}

/// GPIO lines a task owns, addressed by their logical [`Line`]
pub struct BoardPins<'d, const N: usize> {
    lines: [(Line, Flex<'d>); N],
}

impl<'d, const N: usize> BoardPins<'d, N> {
    pub fn new(lines: [(Line, Flex<'d>); N]) -> Self {
        Self { lines }
    }

    /// The pin behind `line`, if this task owns it
    pub fn get(&mut self, line: Line) -> Option<&mut Flex<'d>> {
        self.lines
            .iter_mut()
            .find(|(owned, _)| *owned == line)
            .map(|(_, pin)| pin)
    }
}

impl<const N: usize> ConfigurePin for BoardPins<'_, N> {
    fn configure_pin(&mut self, line: Line, mode: PinMode) -> bool {
        let Some(pin) = self.get(line) else {
            return false;
        };
        match mode {
            PinMode::Input => {
                pin.set_pull(Pull::None);
                pin.set_as_input();
            }
            PinMode::InputPullUp => {
                pin.set_pull(Pull::Up);
                pin.set_as_input();
            }
            PinMode::OutputHigh => {
                pin.set_high();
                pin.set_as_output();
            }
        }
        true
    }
}
