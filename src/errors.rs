// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types surfaced by the register channel, the GPIO core and the
//! CPLD driver.

use std::io::Error as IOError;

/// Failure to attach the CPLD GPIO driver to a device.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("device has no parent hardware context")]
    NoParent,
    #[error("no board configuration matches {}", .key.as_deref().unwrap_or("<no match data>"))]
    ConfigNotFound { key: Option<String> },
    #[error("failed to read property '{name}'")]
    MissingProperty {
        name: &'static str,
        #[source]
        source: PropertyError,
    },
    #[error("failed to create register channel")]
    ChannelInitFailed(#[source] ChannelInitError),
    #[error("failed to register gpio bank")]
    RegistrationFailed(#[source] GpioRegmapError),
}

/// Failure to read a firmware property of a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property not present")]
    NotFound,
    #[error("property is not a valid u32 value")]
    Malformed,
}

/// Failure to build a fresh memory-mapped register channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelInitError {
    #[error("device has no memory resource {0}")]
    NoResource(usize),
    #[error("failed to map memory resource")]
    Map(#[source] IOError),
    #[error(transparent)]
    Regmap(#[from] RegmapError),
}

/// Failure of a register channel access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegmapError {
    #[error("register 0x{reg:X} is out of range (max 0x{max:X})")]
    InvalidRegister { reg: u32, max: u32 },
    #[error("value 0x{val:X} does not fit in {bits} bits")]
    InvalidValue { val: u32, bits: u8 },
    #[error("unsupported register layout: {reg_bits} address bits, {val_bits} value bits")]
    UnsupportedLayout { reg_bits: u8, val_bits: u8 },
    #[error("register window is empty")]
    EmptyWindow,
}

/// Failure reported by the register-mapped GPIO core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpioRegmapError {
    #[error("invalid gpio-regmap configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("Offset {0} is out of range")]
    Offset(u32),
    #[error("line {0} has a fixed direction")]
    DirectionFixed(u32),
    #[error("direction of line {0} cannot be determined")]
    DirectionUnknown(u32),
    #[error("line {0} cannot be driven")]
    NotOutput(u32),
    #[error(transparent)]
    Regmap(#[from] RegmapError),
}
