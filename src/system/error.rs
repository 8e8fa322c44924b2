//! Error type

use crate::system::command::CommandRequest;
use crate::system::pins::Line;

/// Errors surfaced by the control core
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A pin could not be configured; the owning service does not start
    #[error("failed to configure pin {0:?}")]
    PinConfig(Line),
    /// The deferral queue was full; the request was dropped
    #[error("deferral queue full, dropped {0:?}")]
    QueueFull(CommandRequest),
    /// A service was run before it was initialized
    #[error("service not initialized")]
    NotInitialized,
}
