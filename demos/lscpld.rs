// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! List the lines of a QIXIS CPLD GPIO bank, optionally driving one output.

use std::{io, sync::Arc};

use qixis_cpld_gpio::{
    attach, board, DeviceParent, GpioRegmapCore, LineValue, PhysMem, PlatformDevice,
    PropertyError, Regmap, Resource,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// Compatible string of the bank
    #[structopt(long, default_value = "fsl,lx2160a-rdb-qixis-cpld-gpio")]
    compatible: String,
    /// Physical address of the bank register
    #[structopt(long, parse(try_from_str = parse_addr))]
    addr: u64,
    /// Line to drive (outputs only)
    #[structopt(long, requires = "value")]
    line: Option<u32>,
    /// Value to drive on the line (0 or 1)
    #[structopt(long)]
    value: Option<u8>,
}

fn parse_addr(s: &str) -> Result<u64, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

/// The CPLD seen from userspace: it never offers a shared channel.
struct Cpld;

impl DeviceParent for Cpld {
    fn regmap(&self) -> Option<Arc<dyn Regmap>> {
        None
    }
}

struct CliDevice {
    name: String,
    compatible: String,
    res: Resource,
}

impl PlatformDevice for CliDevice {
    type Mem = PhysMem;

    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&dyn DeviceParent> {
        Some(&Cpld)
    }

    fn match_key(&self) -> Option<&str> {
        board::of_match([self.compatible.as_str()]).map(|id| id.compatible)
    }

    fn property_read_u32(&self, _name: &str) -> Result<u32, PropertyError> {
        u32::try_from(self.res.start).map_err(|_| PropertyError::Malformed)
    }

    fn resource(&self, index: usize) -> Option<Resource> {
        (index == 0).then_some(self.res)
    }

    fn ioremap_resource(&self, _index: usize) -> io::Result<PhysMem> {
        PhysMem::map(&self.res)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::from_args();
    let dev = CliDevice {
        name: format!("{:x}.gpio", args.addr),
        compatible: args.compatible,
        res: Resource::new(args.addr, 1),
    };

    let gpio = attach(&dev, &GpioRegmapCore)?;

    if let (Some(line), Some(value)) = (args.line, args.value) {
        gpio.direction_output(line, LineValue::from(value != 0))?;
    }

    println!(
        "GPIO bank: \"{}\", {} GPIO Lines",
        gpio.label(),
        gpio.ngpio()
    );
    for line in gpio.lines() {
        let (offset, direction, value) = line?;
        println!(
            "\tline {offset:>3}: {direction:?} {}",
            if value.is_active() { "active" } else { "inactive" }
        );
    }

    Ok(())
}
