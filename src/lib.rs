// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `qixis-cpld-gpio` crate exposes the GPIO banks found in the QIXIS
//! CPLD of NXP Layerscape reference boards.  Each bank is eight lines backed
//! by one byte-wide CPLD register; which lines are inputs and which are
//! outputs is fixed per board.
//!
//! The crate is split along the seams of a register-mapped GPIO driver:
//!
//! - [`board`] holds the static table of supported boards and their input
//!   line masks.
//! - [`regmap`] provides register-access channels, including a memory-mapped
//!   one over `/dev/mem`.
//! - [`gpio_regmap`] describes a bank of register-mapped lines and offers an
//!   in-process core to read and drive them.
//! - [`driver`] ties these together: given a matched [`device::PlatformDevice`]
//!   it picks the board configuration, finds or creates a register channel and
//!   registers the bank.
//!
//! # Examples
//!
//! Read the lines of an LX2160A-RDB bank whose register has been mapped by
//! the CPLD driver itself:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use qixis_cpld_gpio::{
//!     board, driver::CpldDirection, GpioRegmap, GpioRegmapConfig, MmioRegmap, PhysMem,
//!     Resource, REGMAP_CONFIG_8R_8V,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = board::lookup("fsl,lx2160a-rdb-qixis-cpld-gpio").unwrap();
//! let mem = PhysMem::map(&Resource::new(0x2000_0042, 1))?;
//! let regmap = Arc::new(MmioRegmap::new(mem, REGMAP_CONFIG_8R_8V)?);
//!
//! let mut config = GpioRegmapConfig::new("cpld-gpio", regmap, 8);
//! config.reg_dat_base = Some(0);
//! config.reg_set_base = Some(0);
//! config.get_direction = Some(Box::new(CpldDirection::new(cfg)));
//!
//! let gpio = GpioRegmap::new(config)?;
//! for line in gpio.lines() {
//!     let (offset, direction, value) = line?;
//!     println!("line {offset}: {direction:?} {value:?}");
//! }
//! # Ok(()) }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod errors;

pub mod board;

pub mod device;

pub mod driver;

pub mod gpio_regmap;

pub mod regmap;

pub use board::{BoardGpioConfig, BoardVariant, LineMask};
pub use device::{DeviceParent, PlatformDevice, Resource};
pub use driver::attach;
pub use errors::{AttachError, ChannelInitError, GpioRegmapError, PropertyError, RegmapError};
pub use gpio_regmap::{
    Direction, GetDirection, GpioRegmap, GpioRegmapConfig, GpioRegmapCore, GpioRegmapRegistrar,
    LineValue,
};
#[cfg(feature = "mmio")]
pub use regmap::PhysMem;
pub use regmap::{IoMem, MmioRegmap, Regmap, RegmapConfig, REGMAP_CONFIG_8R_8V};
