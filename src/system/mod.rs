//! Core system types shared by the statecharts and services
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod pins;
pub mod services;
pub mod timer;
