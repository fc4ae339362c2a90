//! DHT11 / DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT family of
//! single-wire temperature and humidity sensors, built on top of the
//! [`embedded-hal`] traits. It talks to both the DHT11 class (DHT11, DHT12)
//! and the DHT22 class (DHT22, AM2302, DHT33, DHT44) and works out which
//! one is attached on the first read.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Automatic sensor type detection
//! - Minimum read interval enforcement, either returning the previous
//!   reading or waiting cooperatively
//! - Humidity and temperature calibration offsets
//! - Timeouts derived from the CPU clock, with one error per protocol phase
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access, extended by
//!   [`DataLine`] for switching the line direction
//! - [`DelayNs`] for the wake-up pulse
//!
//! and on three small traits from [`hal`] for what `embedded-hal` lacks:
//! [`Clock`], [`Scheduler`] and [`InterruptControl`].
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support and logs
//!   protocol events through `defmt`
//! - `critical-section`: Provides [`hal::CriticalSectionInterrupts`] to mask
//!   interrupts while bits are sampled
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dht;
pub mod error;
pub mod frame;
pub mod hal;
mod transport;
pub mod variant;

#[cfg(test)]
mod sim;

pub use config::Config;
pub use dht::{Dht, Reading};
pub use error::DhtError;
pub use frame::Frame;
pub use hal::{
    Clock, DataLine, InterruptControl, NoYield, NoopInterruptControl, OpenDrain, Scheduler,
};
pub use variant::Variant;
