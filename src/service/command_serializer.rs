//! Command serializer
//!
//! The drivetrain and the launcher are two logical command channels on one
//! physical SPI bus, told apart by chip select. This service keeps at most one
//! transfer in flight:
//!
//! - `Waiting` starts a transfer for the first request it sees and moves to
//!   `Sending`.
//! - `Sending` defers every further request into a bounded FIFO.
//! - On transfer completion the chip select is released and the oldest
//!   deferred request, if any, is started straight away, so deferred requests
//!   are replayed in post order ahead of anything posted later.
//!
//! The deferral queue is only ever non-empty while `Sending`. When it is full
//! the newest request is rejected with [`Error::QueueFull`] and never sent.

use heapless::Deque;

use crate::system::command::{BusEvent, CommandRequest, TargetBus};
use crate::system::config::DEFERRAL_CAPACITY;
use crate::system::error::Error;
use crate::system::pins::{configure_all, ConfigurePin, Line, PinMode};

/// Hardware side of the serializer. The bus owns both chip select lines and
/// configures them through [`ConfigurePin`] at init.
pub trait CommandBus {
    /// Asserts the chip select of `target`
    fn select(&mut self, target: TargetBus);

    /// Starts shifting out one byte. Completion comes back as
    /// [`BusEvent::TransferComplete`].
    fn write(&mut self, opcode: u8);

    /// Releases every chip select
    fn deselect(&mut self);
}

/// Serializer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializerState {
    Init,
    Waiting,
    Sending,
}

/// One-transfer-at-a-time bus arbiter
pub struct CommandSerializer {
    state: SerializerState,
    in_flight: Option<CommandRequest>,
    deferred: Deque<CommandRequest, DEFERRAL_CAPACITY>,
}

impl CommandSerializer {
    pub const fn new() -> Self {
        Self {
            state: SerializerState::Init,
            in_flight: None,
            deferred: Deque::new(),
        }
    }

    /// Configures both chip selects, releases the bus and starts waiting
    pub fn init<B: CommandBus + ConfigurePin>(&mut self, bus: &mut B) -> Result<(), Error> {
        configure_all(
            bus,
            &[
                (Line::DrivetrainSelect, PinMode::OutputHigh),
                (Line::LauncherSelect, PinMode::OutputHigh),
            ],
        )?;
        bus.deselect();
        self.in_flight = None;
        self.deferred.clear();
        self.state = SerializerState::Waiting;
        info!("command serializer: Init -> Waiting");
        Ok(())
    }

    /// Handles one serializer event
    pub fn run<B: CommandBus>(&mut self, event: BusEvent, bus: &mut B) -> Result<(), Error> {
        match (self.state, event) {
            (SerializerState::Init, _) => Err(Error::NotInitialized),
            (SerializerState::Waiting, BusEvent::Send(request)) => {
                self.transmit(request, bus);
                Ok(())
            }
            (SerializerState::Waiting, BusEvent::TransferComplete) => {
                debug!("command serializer: completion while idle, ignored");
                Ok(())
            }
            (SerializerState::Sending, BusEvent::Send(request)) => {
                self.deferred.push_back(request).map_err(|request| {
                    warn!("command serializer: deferral queue full, dropped {:?}", request);
                    Error::QueueFull(request)
                })?;
                debug!(
                    "command serializer: deferred {:?} ({} pending)",
                    request,
                    self.deferred.len()
                );
                Ok(())
            }
            (SerializerState::Sending, BusEvent::TransferComplete) => {
                bus.deselect();
                self.in_flight = None;
                self.state = SerializerState::Waiting;
                if let Some(next) = self.deferred.pop_front() {
                    self.transmit(next, bus);
                }
                Ok(())
            }
        }
    }

    fn transmit<B: CommandBus>(&mut self, request: CommandRequest, bus: &mut B) {
        debug!("command serializer: sending {:?}", request);
        bus.select(request.target);
        bus.write(request.opcode);
        self.in_flight = Some(request);
        self.state = SerializerState::Sending;
    }

    pub fn state(&self) -> SerializerState {
        self.state
    }

    /// Request currently on the wire
    pub fn in_flight(&self) -> Option<CommandRequest> {
        self.in_flight
    }

    /// Number of deferred requests
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }
}

impl Default for CommandSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::command::{DriveOpcode, LauncherOpcode};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum BusOp {
        Select(TargetBus),
        Write(u8),
        Deselect,
    }

    struct MockBus {
        ops: Vec<BusOp>,
        pins_ok: bool,
    }

    impl Default for MockBus {
        fn default() -> Self {
            Self {
                ops: Vec::new(),
                pins_ok: true,
            }
        }
    }

    impl MockBus {
        fn writes(&self) -> Vec<u8> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    BusOp::Write(byte) => Some(*byte),
                    _ => None,
                })
                .collect()
        }
    }

    impl CommandBus for MockBus {
        fn select(&mut self, target: TargetBus) {
            self.ops.push(BusOp::Select(target));
        }

        fn write(&mut self, opcode: u8) {
            self.ops.push(BusOp::Write(opcode));
        }

        fn deselect(&mut self) {
            self.ops.push(BusOp::Deselect);
        }
    }

    impl ConfigurePin for MockBus {
        fn configure_pin(&mut self, _line: Line, _mode: PinMode) -> bool {
            self.pins_ok
        }
    }

    fn ready() -> (CommandSerializer, MockBus) {
        let mut serializer = CommandSerializer::new();
        let mut bus = MockBus::default();
        serializer.init(&mut bus).unwrap();
        bus.ops.clear();
        (serializer, bus)
    }

    fn send(request: impl Into<CommandRequest>) -> BusEvent {
        BusEvent::Send(request.into())
    }

    #[test]
    fn init_releases_bus_and_waits() {
        let mut serializer = CommandSerializer::new();
        let mut bus = MockBus::default();
        assert_eq!(serializer.state(), SerializerState::Init);
        serializer.init(&mut bus).unwrap();
        assert_eq!(serializer.state(), SerializerState::Waiting);
        assert_eq!(bus.ops, [BusOp::Deselect]);
    }

    #[test]
    fn init_fails_without_chip_selects() {
        let mut serializer = CommandSerializer::new();
        let mut bus = MockBus {
            pins_ok: false,
            ..MockBus::default()
        };
        assert_eq!(
            serializer.init(&mut bus),
            Err(Error::PinConfig(Line::DrivetrainSelect))
        );
        assert_eq!(serializer.state(), SerializerState::Init);
        assert_eq!(
            serializer.run(send(DriveOpcode::Stop), &mut bus),
            Err(Error::NotInitialized)
        );
        assert!(bus.ops.is_empty());
    }

    #[test]
    fn waiting_starts_transfer_immediately() {
        let (mut serializer, mut bus) = ready();
        serializer.run(send(LauncherOpcode::Fire), &mut bus).unwrap();
        assert_eq!(serializer.state(), SerializerState::Sending);
        assert_eq!(
            serializer.in_flight(),
            Some(CommandRequest::launcher(LauncherOpcode::Fire))
        );
        assert_eq!(
            bus.ops,
            [BusOp::Select(TargetBus::Launcher), BusOp::Write(0xF3)]
        );
    }

    #[test]
    fn request_during_transfer_waits_for_completion() {
        let (mut serializer, mut bus) = ready();
        serializer.run(send(LauncherOpcode::Fire), &mut bus).unwrap();
        serializer.run(send(DriveOpcode::Stop), &mut bus).unwrap();

        // Stop is held back while Fire is on the wire
        assert_eq!(bus.writes(), [0xF3]);
        assert_eq!(serializer.pending(), 1);

        serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        serializer.run(send(DriveOpcode::DriveFwd), &mut bus).unwrap();
        serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();

        assert_eq!(bus.writes(), [0xF3, 0xD1, 0xD4]);
        assert_eq!(
            bus.ops,
            [
                BusOp::Select(TargetBus::Launcher),
                BusOp::Write(0xF3),
                BusOp::Deselect,
                BusOp::Select(TargetBus::Drivetrain),
                BusOp::Write(0xD1),
                BusOp::Deselect,
                BusOp::Select(TargetBus::Drivetrain),
                BusOp::Write(0xD4),
                BusOp::Deselect,
            ]
        );
        assert_eq!(serializer.state(), SerializerState::Waiting);
    }

    #[test]
    fn never_two_transfers_in_flight() {
        let (mut serializer, mut bus) = ready();
        let requests = [
            CommandRequest::launcher(LauncherOpcode::FlagUp),
            CommandRequest::drivetrain(DriveOpcode::RotateCcw),
            CommandRequest::launcher(LauncherOpcode::TeamA),
            CommandRequest::drivetrain(DriveOpcode::Stop),
        ];
        for request in requests {
            serializer.run(BusEvent::Send(request), &mut bus).unwrap();
        }
        while serializer.state() == SerializerState::Sending {
            serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        }

        let mut selected = false;
        for op in &bus.ops {
            match op {
                BusOp::Select(_) => {
                    assert!(!selected, "chip select asserted twice");
                    selected = true;
                }
                BusOp::Deselect => selected = false,
                BusOp::Write(_) => assert!(selected),
            }
        }
        assert_eq!(bus.writes(), [0xF1, 0xD2, 0xF4, 0xD1]);
    }

    #[test]
    fn deferred_queue_is_empty_while_waiting() {
        let (mut serializer, mut bus) = ready();
        serializer.run(send(DriveOpcode::Stop), &mut bus).unwrap();
        serializer.run(send(DriveOpcode::DriveRev), &mut bus).unwrap();
        serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        assert_eq!(serializer.state(), SerializerState::Sending);
        assert_eq!(serializer.pending(), 0);
        serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        assert_eq!(serializer.state(), SerializerState::Waiting);
        assert_eq!(serializer.pending(), 0);
    }

    #[test]
    fn overflow_rejects_newest_and_never_sends_it() {
        let (mut serializer, mut bus) = ready();
        serializer.run(send(LauncherOpcode::Fire), &mut bus).unwrap();
        for opcode in [DriveOpcode::Stop, DriveOpcode::DriveFwd, DriveOpcode::DriveRev] {
            serializer.run(send(opcode), &mut bus).unwrap();
        }
        assert_eq!(serializer.pending(), DEFERRAL_CAPACITY);

        let rejected = CommandRequest::drivetrain(DriveOpcode::RotateCw);
        assert_eq!(
            serializer.run(BusEvent::Send(rejected), &mut bus),
            Err(Error::QueueFull(rejected))
        );

        while serializer.state() == SerializerState::Sending {
            serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        }
        let writes = bus.writes();
        assert_eq!(writes, [0xF3, 0xD1, 0xD4, 0xD5]);
        assert!(!writes.contains(&(DriveOpcode::RotateCw as u8)));
    }

    #[test]
    fn stray_completion_is_ignored() {
        let (mut serializer, mut bus) = ready();
        serializer.run(BusEvent::TransferComplete, &mut bus).unwrap();
        assert_eq!(serializer.state(), SerializerState::Waiting);
        assert!(bus.ops.is_empty());
    }
}
