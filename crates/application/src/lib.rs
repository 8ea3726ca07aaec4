//! Relay DNS Application Layer
pub mod events;
pub mod ports;
pub mod services;
pub mod use_cases;
