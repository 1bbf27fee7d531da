//! Adapters - concrete implementations of ports
//!
//! # Available Adapters
//!
//! - **digit_bus**: gauge display tapped through seven GPIO inputs
//! - **adc**: analog gauge read through any blocking ADC

pub mod adc;
pub mod digit_bus;

pub use adc::AdcSampler;
pub use digit_bus::{DigitBusDecoder, DigitBusSampler};
