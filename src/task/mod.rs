pub mod beacon_capture;
pub mod command_bus;
pub mod orchestrate;
pub mod resources;
pub mod timers;
