//! Statechart services
//!
//! Everything a state handler may do besides changing its own state goes
//! through [`Services`]. Each call is a non-blocking post to another service;
//! nothing here runs transition logic of the receiver.

use embassy_time::Duration;

use crate::service::beacon_decoder::{self, DecoderControl};
use crate::system::command::{self, CommandRequest};
use crate::system::timer::{self, TimerId};

/// Outgoing capabilities of a statechart
pub trait Services {
    /// Posts a command request to the serializer
    fn send(&mut self, request: CommandRequest);

    /// Arms (or re-arms) a single-shot timer
    fn arm_timer(&mut self, timer: TimerId, duration: Duration);

    /// Starts or stops the beacon decoder
    fn beacon(&mut self, control: DecoderControl);
}

/// [`Services`] backed by the static service queues
#[derive(Debug, Default, Clone, Copy)]
pub struct QueueServices;

impl Services for QueueServices {
    fn send(&mut self, request: CommandRequest) {
        command::post(request);
    }

    fn arm_timer(&mut self, timer: TimerId, duration: Duration) {
        timer::arm(timer, duration);
    }

    fn beacon(&mut self, control: DecoderControl) {
        beacon_decoder::control(control);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::command::{DriveOpcode, COMMAND_CHANNEL};
    use crate::system::timer::{ArmTimer, TIMER_CHANNEL};

    #[test]
    fn queue_services_post_to_the_service_queues() {
        let mut services = QueueServices;
        services.send(DriveOpcode::Stop.into());
        services.arm_timer(TimerId::Stop, Duration::from_secs(1));

        assert_eq!(
            COMMAND_CHANNEL.try_receive().ok(),
            Some(CommandRequest::drivetrain(DriveOpcode::Stop))
        );
        assert_eq!(
            TIMER_CHANNEL.try_receive().ok(),
            Some(ArmTimer {
                timer: TimerId::Stop,
                duration: Duration::from_secs(1),
            })
        );
    }
}
