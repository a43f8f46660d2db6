// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The QIXIS CPLD GPIO driver.
//!
//! Each matched device describes one 8-line bank living in a single CPLD
//! register.  Attaching resolves the board's fixed line directions, finds
//! a register channel and registers the bank with a GPIO core.

use std::sync::Arc;

use crate::{
    board::{self, BoardGpioConfig, BoardVariant, CPLD_GPIO_LINES},
    device::PlatformDevice,
    errors::{AttachError, ChannelInitError},
    gpio_regmap::{Direction, GetDirection, GpioRegmapConfig, GpioRegmapRegistrar},
    regmap::{MmioRegmap, Regmap, REGMAP_CONFIG_8R_8V},
};

pub const DRIVER_NAME: &str = "gpio-qixis-cpld";

/// Firmware property holding the register address of the bank.
pub const BASE_PROPERTY: &str = "reg";

/// Direction of `line` on a board: input iff its bit is set in
/// `input_lines`.
#[inline]
pub const fn direction(config: &BoardGpioConfig, line: u32) -> Direction {
    config.direction(line)
}

/// Direction capability bound to one board configuration.
#[derive(Debug, Clone, Copy)]
pub struct CpldDirection {
    config: &'static BoardGpioConfig,
}

impl CpldDirection {
    pub const fn new(config: &'static BoardGpioConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &'static BoardGpioConfig {
        self.config
    }
}

impl GetDirection for CpldDirection {
    fn direction(&self, offset: u32) -> Direction {
        direction(self.config, offset)
    }
}

/// Attach the driver to `dev` and register its bank with `core`.
///
/// When the parent exposes a register channel it is shared and the `reg`
/// property is used as the register address.  Otherwise the device's first
/// memory resource is mapped as a one-register channel and the bank sits at
/// address 0 of it, whatever `reg` says.
pub fn attach<D, R>(dev: &D, core: &R) -> Result<R::Handle, AttachError>
where
    D: PlatformDevice,
    R: GpioRegmapRegistrar,
{
    let res = try_attach(dev, core);
    if let Err(e) = &res {
        tracing::warn!(device = dev.name(), "failed to attach {DRIVER_NAME}: {e}");
    }
    res
}

fn try_attach<D, R>(dev: &D, core: &R) -> Result<R::Handle, AttachError>
where
    D: PlatformDevice,
    R: GpioRegmapRegistrar,
{
    let parent = dev.parent().ok_or(AttachError::NoParent)?;

    let key = dev.match_key();
    let cfg = key
        .and_then(board::lookup)
        .ok_or_else(|| AttachError::ConfigNotFound {
            key: key.map(str::to_owned),
        })?;

    let mut base = dev
        .property_read_u32(BASE_PROPERTY)
        .map_err(|source| AttachError::MissingProperty {
            name: BASE_PROPERTY,
            source,
        })?;

    let regmap = match parent.regmap() {
        Some(regmap) => {
            tracing::debug!(device = dev.name(), base, "using parent register channel");
            regmap
        }
        None => {
            let regmap = init_mmio_regmap(dev).map_err(AttachError::ChannelInitFailed)?;
            // The fresh channel maps only our register.
            base = 0;
            tracing::debug!(device = dev.name(), "mapped own register channel");
            regmap
        }
    };

    let mut config = GpioRegmapConfig::new(dev.name(), regmap, CPLD_GPIO_LINES);
    config.ngpio_per_reg = CPLD_GPIO_LINES;
    config.get_direction = Some(Box::new(CpldDirection::new(cfg)));

    match cfg.variant {
        BoardVariant::Lx2160aRdb | BoardVariant::Ls1046aQdsStatPres2 => {
            config.reg_dat_base = Some(base);
            config.reg_set_base = Some(base);
        }
    }

    core.register(config).map_err(AttachError::RegistrationFailed)
}

fn init_mmio_regmap<D: PlatformDevice>(dev: &D) -> Result<Arc<dyn Regmap>, ChannelInitError> {
    if dev.resource(0).is_none() {
        return Err(ChannelInitError::NoResource(0));
    }
    let mem = dev.ioremap_resource(0).map_err(ChannelInitError::Map)?;
    let regmap = MmioRegmap::new(mem, REGMAP_CONFIG_8R_8V)?;
    Ok(Arc::new(regmap))
}
