//! Pin configuration capability
//!
//! Services describe the lines they need and ask the board to configure them.
//! A failure aborts the start of that service only.

use crate::system::error::Error;

/// Logical signal lines used by the control core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Start button, active on any level change
    StartButton,
    /// Launcher status: high once fired, low once reloaded
    FireUpdate,
    /// Drivetrain status: toggles when a leg finishes
    MovementUpdate,
    /// Beacon receiver output
    Beacon,
    /// Drivetrain chip select (active low)
    DrivetrainSelect,
    /// Launcher chip select (active low)
    LauncherSelect,
}

/// Electrical mode of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Input,
    InputPullUp,
    /// Push-pull output, driven high after configuration
    OutputHigh,
}

/// Board capability to configure a line
pub trait ConfigurePin {
    /// Configures `line` as `mode`. Returns `false` if the board cannot.
    fn configure_pin(&mut self, line: Line, mode: PinMode) -> bool;
}

/// Configures every `(line, mode)` pair, stopping at the first failure
pub fn configure_all<P: ConfigurePin>(pins: &mut P, lines: &[(Line, PinMode)]) -> Result<(), Error> {
    for &(line, mode) in lines {
        if !pins.configure_pin(line, mode) {
            warn!("pin {:?} could not be configured as {:?}", line, mode);
            return Err(Error::PinConfig(line));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Board {
        broken: Option<Line>,
        configured: std::vec::Vec<(Line, PinMode)>,
    }

    impl ConfigurePin for Board {
        fn configure_pin(&mut self, line: Line, mode: PinMode) -> bool {
            if self.broken == Some(line) {
                return false;
            }
            self.configured.push((line, mode));
            true
        }
    }

    #[test]
    fn stops_at_first_failing_line() {
        let mut board = Board {
            broken: Some(Line::FireUpdate),
            configured: std::vec::Vec::new(),
        };
        let result = configure_all(
            &mut board,
            &[
                (Line::StartButton, PinMode::InputPullUp),
                (Line::FireUpdate, PinMode::Input),
                (Line::MovementUpdate, PinMode::Input),
            ],
        );
        assert_eq!(result, Err(Error::PinConfig(Line::FireUpdate)));
        assert_eq!(board.configured, [(Line::StartButton, PinMode::InputPullUp)]);
    }
}
