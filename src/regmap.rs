// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Register-access channels.
//!
//! A [`Regmap`] addresses a contiguous space of numbered registers.  The
//! CPLD driver either borrows one from its parent device or builds an
//! [`MmioRegmap`] over the memory window of its own resource.

use std::fmt;

use parking_lot::Mutex;

use crate::errors::RegmapError;

#[cfg(feature = "mmio")]
mod mmio;

#[cfg(feature = "mmio")]
pub use mmio::PhysMem;

/// Register layout of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegmapConfig {
    /// Width of a register address.
    pub reg_bits: u8,
    /// Width of a register value.
    pub val_bits: u8,
    /// Highest valid register, if narrower than what `reg_bits` allows.
    pub max_register: Option<u32>,
}

/// 8-bit addresses, 8-bit values.
pub const REGMAP_CONFIG_8R_8V: RegmapConfig = RegmapConfig {
    reg_bits: 8,
    val_bits: 8,
    max_register: None,
};

impl RegmapConfig {
    pub const fn max_register(&self) -> u32 {
        let by_width = match 1u32.checked_shl(self.reg_bits as u32) {
            Some(v) => v - 1,
            None => u32::MAX,
        };
        match self.max_register {
            Some(max) if max < by_width => max,
            _ => by_width,
        }
    }

    pub const fn val_mask(&self) -> u32 {
        match 1u32.checked_shl(self.val_bits as u32) {
            Some(v) => v - 1,
            None => u32::MAX,
        }
    }

    pub fn check_reg(&self, reg: u32) -> Result<(), RegmapError> {
        let max = self.max_register();
        if reg > max {
            return Err(RegmapError::InvalidRegister { reg, max });
        }
        Ok(())
    }

    pub fn check_val(&self, val: u32) -> Result<(), RegmapError> {
        if val & !self.val_mask() != 0 {
            return Err(RegmapError::InvalidValue {
                val,
                bits: self.val_bits,
            });
        }
        Ok(())
    }
}

/// A numbered-register address space.
///
/// Implementations serialize their own accesses; `update_bits` is a single
/// read-modify-write with respect to other users of the same channel.
pub trait Regmap: Send + Sync + fmt::Debug {
    fn config(&self) -> &RegmapConfig;

    fn read(&self, reg: u32) -> Result<u32, RegmapError>;

    fn write(&self, reg: u32, val: u32) -> Result<(), RegmapError>;

    /// Replace the bits selected by `mask` in `reg` with those of `val`.
    fn update_bits(&self, reg: u32, mask: u32, val: u32) -> Result<(), RegmapError>;
}

/// A byte-addressable memory window backing an [`MmioRegmap`].
pub trait IoMem: Send + fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `None` when `offset` is past the window.
    fn read8(&self, offset: usize) -> Option<u8>;

    /// Returns `None` when `offset` is past the window.
    fn write8(&mut self, offset: usize, val: u8) -> Option<()>;
}

impl IoMem for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn read8(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }

    fn write8(&mut self, offset: usize, val: u8) -> Option<()> {
        *self.get_mut(offset)? = val;
        Some(())
    }
}

/// Memory-mapped channel with byte-wide registers at consecutive offsets.
#[derive(Debug)]
pub struct MmioRegmap<M> {
    config: RegmapConfig,
    mem: Mutex<M>,
}

impl<M: IoMem> MmioRegmap<M> {
    pub fn new(mem: M, config: RegmapConfig) -> Result<Self, RegmapError> {
        if config.val_bits != 8 || config.reg_bits == 0 || config.reg_bits > 32 {
            return Err(RegmapError::UnsupportedLayout {
                reg_bits: config.reg_bits,
                val_bits: config.val_bits,
            });
        }
        if mem.is_empty() {
            return Err(RegmapError::EmptyWindow);
        }

        // The window may be narrower than the address width allows.
        let window_max = u32::try_from(mem.len() - 1).unwrap_or(u32::MAX);
        let max_register = config.max_register().min(window_max);
        let config = RegmapConfig {
            max_register: Some(max_register),
            ..config
        };

        Ok(Self {
            config,
            mem: Mutex::new(mem),
        })
    }

    pub fn into_inner(self) -> M {
        self.mem.into_inner()
    }

    fn with_mem<T>(&self, f: impl FnOnce(&mut M) -> T) -> T {
        let mut mem = self.mem.lock();
        f(&mut *mem)
    }

    fn out_of_window(&self, reg: u32) -> RegmapError {
        RegmapError::InvalidRegister {
            reg,
            max: self.config.max_register(),
        }
    }
}

impl<M: IoMem> Regmap for MmioRegmap<M> {
    fn config(&self) -> &RegmapConfig {
        &self.config
    }

    fn read(&self, reg: u32) -> Result<u32, RegmapError> {
        self.config.check_reg(reg)?;
        self.with_mem(|mem| mem.read8(reg as usize))
            .map(u32::from)
            .ok_or_else(|| self.out_of_window(reg))
    }

    fn write(&self, reg: u32, val: u32) -> Result<(), RegmapError> {
        self.config.check_reg(reg)?;
        self.config.check_val(val)?;
        self.with_mem(|mem| mem.write8(reg as usize, val as u8))
            .ok_or_else(|| self.out_of_window(reg))
    }

    fn update_bits(&self, reg: u32, mask: u32, val: u32) -> Result<(), RegmapError> {
        self.config.check_reg(reg)?;
        let mask = mask & self.config.val_mask();
        self.with_mem(|mem| {
            let old = u32::from(mem.read8(reg as usize)?);
            let new = (old & !mask) | (val & mask);
            if new != old {
                mem.write8(reg as usize, new as u8)?;
            }
            Some(())
        })
        .ok_or_else(|| self.out_of_window(reg))
    }
}
