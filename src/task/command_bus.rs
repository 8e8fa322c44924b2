//! Command bus task
//!
//! Runs the command serializer on SPI0. The byte handed to
//! [`CommandBus::write`] is shifted out by DMA while the task keeps taking
//! requests, so anything posted during a transfer is deferred by the
//! serializer and replayed once the transfer completes.

use core::pin::pin;

use beacon_robot::service::command_serializer::{CommandBus, CommandSerializer};
use beacon_robot::system::command::{self, BusEvent, TargetBus};
use beacon_robot::system::pins::{ConfigurePin, Line, PinMode};
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Flex;
use embassy_rp::spi::{self, Spi};

use crate::task::resources::{BoardPins, CommandBusResources};

/// Bus clock, well within what both peripherals accept
const BUS_FREQUENCY: u32 = 1_000_000;

/// Chip selects plus the byte waiting to go out
struct ChipSelects<'d> {
    pins: BoardPins<'d, 2>,
    outgoing: Option<u8>,
}

impl ChipSelects<'_> {
    fn line(target: TargetBus) -> Line {
        match target {
            TargetBus::Drivetrain => Line::DrivetrainSelect,
            TargetBus::Launcher => Line::LauncherSelect,
        }
    }
}

impl ConfigurePin for ChipSelects<'_> {
    fn configure_pin(&mut self, line: Line, mode: PinMode) -> bool {
        self.pins.configure_pin(line, mode)
    }
}

impl CommandBus for ChipSelects<'_> {
    fn select(&mut self, target: TargetBus) {
        if let Some(cs) = self.pins.get(Self::line(target)) {
            cs.set_low();
        }
    }

    fn write(&mut self, opcode: u8) {
        self.outgoing = Some(opcode);
    }

    fn deselect(&mut self) {
        for line in [Line::DrivetrainSelect, Line::LauncherSelect] {
            if let Some(cs) = self.pins.get(line) {
                cs.set_high();
            }
        }
    }
}

/// Command bus task
///
/// Feeds requests and transfer completions to the command serializer.
#[embassy_executor::task]
pub async fn command_bus(r: CommandBusResources) {
    let mut bus = ChipSelects {
        pins: BoardPins::new([
            (Line::DrivetrainSelect, Flex::new(r.drivetrain_cs)),
            (Line::LauncherSelect, Flex::new(r.launcher_cs)),
        ]),
        outgoing: None,
    };
    let mut serializer = CommandSerializer::new();
    if let Err(e) = serializer.init(&mut bus) {
        warn!("command serializer not started: {}", e);
        return;
    }

    let mut config = spi::Config::default();
    config.frequency = BUS_FREQUENCY;
    let mut spi = Spi::new_txonly(r.spi, r.clk_pin, r.mosi_pin, r.tx_dma, config);
    info!("command bus started");

    loop {
        match bus.outgoing.take() {
            Some(opcode) => {
                let buf = [opcode];
                let mut transfer = pin!(spi.write(&buf));
                loop {
                    match select(&mut transfer, command::wait()).await {
                        Either::First(result) => {
                            if result.is_err() {
                                warn!("transfer of {:#x} failed", opcode);
                            }
                            break;
                        }
                        Either::Second(request) => {
                            if let Err(e) = serializer.run(BusEvent::Send(request), &mut bus) {
                                warn!("{}", e);
                            }
                        }
                    }
                }
                if let Err(e) = serializer.run(BusEvent::TransferComplete, &mut bus) {
                    warn!("{}", e);
                }
            }
            None => {
                let request = command::wait().await;
                if let Err(e) = serializer.run(BusEvent::Send(request), &mut bus) {
                    warn!("{}", e);
                }
            }
        }
    }
}
