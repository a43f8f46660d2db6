// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! What the driver needs to know about the device it is attached to.
//!
//! Enumeration, matching and firmware parsing happen elsewhere; the driver
//! only sees the result through these traits.

use std::{io, sync::Arc};

use crate::{errors::PropertyError, regmap::Regmap};

/// A physical memory range owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub start: u64,
    pub size: u64,
}

impl Resource {
    pub const fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }
}

/// The enclosing hardware context of a device, such as the CPLD itself.
pub trait DeviceParent {
    /// Register channel the parent has already set up, if any.
    ///
    /// The returned handle is shared with the parent.
    fn regmap(&self) -> Option<Arc<dyn Regmap>>;
}

/// A device instance the matching layer has bound to this driver.
pub trait PlatformDevice {
    /// Memory window produced by [`ioremap_resource`](Self::ioremap_resource).
    type Mem: crate::regmap::IoMem + 'static;

    fn name(&self) -> &str;

    fn parent(&self) -> Option<&dyn DeviceParent>;

    /// The compatible string the matching layer matched, if any.
    fn match_key(&self) -> Option<&str>;

    fn property_read_u32(&self, name: &str) -> Result<u32, PropertyError>;

    fn resource(&self, index: usize) -> Option<Resource>;

    /// Map memory resource `index` for register access.
    fn ioremap_resource(&self, index: usize) -> io::Result<Self::Mem>;
}
