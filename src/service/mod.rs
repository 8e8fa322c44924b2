//! Real-time services the statecharts depend on
pub mod beacon_decoder;
pub mod command_serializer;
