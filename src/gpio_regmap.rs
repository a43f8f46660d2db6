// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Register-mapped GPIO banks.
//!
//! A bank is described by a [`GpioRegmapConfig`]: a register channel, the
//! addresses of the data and set registers, the number of lines and an
//! optional [`GetDirection`] capability.  The descriptor is handed to a
//! [`GpioRegmapRegistrar`]; [`GpioRegmapCore`] is the in-process one,
//! producing a [`GpioRegmap`] that reads and drives lines through the
//! channel.

use std::{fmt, sync::Arc};

use crate::{errors::GpioRegmapError, regmap::Regmap};

type Result<T> = std::result::Result<T, GpioRegmapError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineValue {
    Active,
    Inactive,
}

impl LineValue {
    pub const fn new(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, LineValue::Active)
    }
}

impl From<bool> for LineValue {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

/// Answers the direction of a line whose direction is not stored in a
/// register.
///
/// The core only asks about offsets below the bank's `ngpio`.
pub trait GetDirection: Send + Sync + fmt::Debug {
    fn direction(&self, offset: u32) -> Direction;
}

/// Everything the core needs to register a bank.
#[derive(Debug)]
pub struct GpioRegmapConfig {
    pub label: String,
    pub regmap: Arc<dyn Regmap>,
    /// Register read for line values.
    pub reg_dat_base: Option<u32>,
    /// Register written to drive output lines.
    pub reg_set_base: Option<u32>,
    /// Distance between consecutive registers of the bank.
    pub reg_stride: u32,
    pub ngpio: u32,
    pub ngpio_per_reg: u32,
    pub get_direction: Option<Box<dyn GetDirection>>,
}

impl GpioRegmapConfig {
    pub fn new(label: impl Into<String>, regmap: Arc<dyn Regmap>, ngpio: u32) -> Self {
        Self {
            label: label.into(),
            regmap,
            reg_dat_base: None,
            reg_set_base: None,
            reg_stride: 1,
            ngpio,
            ngpio_per_reg: ngpio,
            get_direction: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ngpio == 0 {
            return Err(GpioRegmapError::InvalidConfig("ngpio must not be zero"));
        }
        if self.ngpio_per_reg == 0 || self.ngpio_per_reg > 32 {
            return Err(GpioRegmapError::InvalidConfig(
                "ngpio_per_reg must be between 1 and 32",
            ));
        }
        if self.reg_dat_base.is_none() && self.reg_set_base.is_none() {
            return Err(GpioRegmapError::InvalidConfig(
                "at least one of the data and set registers is required",
            ));
        }
        if self.reg_stride == 0 {
            return Err(GpioRegmapError::InvalidConfig("reg_stride must not be zero"));
        }

        // The last register of the bank must be addressable from every base.
        let last_reg = ((self.ngpio - 1) / self.ngpio_per_reg)
            .checked_mul(self.reg_stride)
            .ok_or(GpioRegmapError::InvalidConfig("bank spans too many registers"))?;
        for base in [self.reg_dat_base, self.reg_set_base].into_iter().flatten() {
            if base.checked_add(last_reg).is_none() {
                return Err(GpioRegmapError::InvalidConfig(
                    "bank registers exceed the address space",
                ));
            }
        }
        Ok(())
    }
}

/// Accepts bank descriptors and takes ownership of them.
pub trait GpioRegmapRegistrar {
    type Handle;

    fn register(&self, config: GpioRegmapConfig) -> Result<Self::Handle>;
}

/// Registers banks as in-process [`GpioRegmap`] handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpioRegmapCore;

impl GpioRegmapRegistrar for GpioRegmapCore {
    type Handle = GpioRegmap;

    fn register(&self, config: GpioRegmapConfig) -> Result<GpioRegmap> {
        GpioRegmap::new(config)
    }
}

/// A registered bank of register-mapped lines.
#[derive(Debug)]
pub struct GpioRegmap {
    config: GpioRegmapConfig,
}

impl GpioRegmap {
    pub fn new(config: GpioRegmapConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            label = %config.label,
            ngpio = config.ngpio,
            dat = ?config.reg_dat_base,
            set = ?config.reg_set_base,
            "registered gpio-regmap bank"
        );
        Ok(Self { config })
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub const fn ngpio(&self) -> u32 {
        self.config.ngpio
    }

    pub fn config(&self) -> &GpioRegmapConfig {
        &self.config
    }

    fn check_offset(&self, offset: u32) -> Result<()> {
        if offset >= self.config.ngpio {
            return Err(GpioRegmapError::Offset(offset));
        }
        Ok(())
    }

    /// Register and bit mask holding `offset` in the bank starting at `base`.
    ///
    /// Cannot overflow for offsets below `ngpio`; `validate` checked the
    /// last register.
    fn reg_mask_xlate(&self, base: u32, offset: u32) -> (u32, u32) {
        let reg = base + (offset / self.config.ngpio_per_reg) * self.config.reg_stride;
        let mask = 1 << (offset % self.config.ngpio_per_reg);
        (reg, mask)
    }

    pub fn direction(&self, offset: u32) -> Result<Direction> {
        self.check_offset(offset)?;

        if let Some(get_direction) = &self.config.get_direction {
            return Ok(get_direction.direction(offset));
        }

        match (self.config.reg_dat_base, self.config.reg_set_base) {
            (Some(_), None) => Ok(Direction::Input),
            (None, Some(_)) => Ok(Direction::Output),
            _ => Err(GpioRegmapError::DirectionUnknown(offset)),
        }
    }

    pub fn get(&self, offset: u32) -> Result<LineValue> {
        self.check_offset(offset)?;

        let base = self
            .config
            .reg_dat_base
            .or(self.config.reg_set_base)
            .ok_or(GpioRegmapError::InvalidConfig("no readable register"))?;
        let (reg, mask) = self.reg_mask_xlate(base, offset);
        let val = self.config.regmap.read(reg)?;

        Ok(LineValue::new(val & mask != 0))
    }

    pub fn set(&self, offset: u32, value: LineValue) -> Result<()> {
        if self.direction(offset)? != Direction::Output {
            return Err(GpioRegmapError::NotOutput(offset));
        }

        let base = self
            .config
            .reg_set_base
            .ok_or(GpioRegmapError::NotOutput(offset))?;
        let (reg, mask) = self.reg_mask_xlate(base, offset);
        let val = if value.is_active() { mask } else { 0 };

        Ok(self.config.regmap.update_bits(reg, mask, val)?)
    }

    /// Succeeds only for lines that are inputs already.
    pub fn direction_input(&self, offset: u32) -> Result<()> {
        match self.direction(offset)? {
            Direction::Input => Ok(()),
            Direction::Output => Err(GpioRegmapError::DirectionFixed(offset)),
        }
    }

    /// Drives `value` on a line that is an output already.
    pub fn direction_output(&self, offset: u32, value: LineValue) -> Result<()> {
        match self.direction(offset)? {
            Direction::Output => self.set(offset, value),
            Direction::Input => Err(GpioRegmapError::DirectionFixed(offset)),
        }
    }

    fn line(&self, offset: u32) -> Result<(u32, Direction, LineValue)> {
        Ok((offset, self.direction(offset)?, self.get(offset)?))
    }

    /// Direction and value of every line, in offset order.
    pub fn lines(&self) -> impl Iterator<Item = Result<(u32, Direction, LineValue)>> + '_ {
        (0..self.config.ngpio).map(move |offset| self.line(offset))
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;
    use crate::regmap::{MmioRegmap, REGMAP_CONFIG_8R_8V};

    #[derive(Debug)]
    struct LowNibbleInputs;

    impl GetDirection for LowNibbleInputs {
        fn direction(&self, offset: u32) -> Direction {
            if offset < 4 {
                Direction::Input
            } else {
                Direction::Output
            }
        }
    }

    fn bank(regs: Vec<u8>, base: u32) -> (GpioRegmap, Arc<MmioRegmap<Vec<u8>>>) {
        let map = Arc::new(MmioRegmap::new(regs, REGMAP_CONFIG_8R_8V).unwrap());
        let mut config = GpioRegmapConfig::new("test", map.clone(), 8);
        config.reg_dat_base = Some(base);
        config.reg_set_base = Some(base);
        config.ngpio_per_reg = 8;
        config.get_direction = Some(Box::new(LowNibbleInputs));
        (GpioRegmapCore.register(config).unwrap(), map)
    }

    #[test]
    pub fn get_reads_line_bits() {
        let (gpio, _) = bank(vec![0, 0b0100_0101], 1);

        let values: Vec<_> = (0..8).map(|o| gpio.get(o).unwrap().is_active()).collect();
        assert_eq!(
            values,
            [true, false, true, false, false, false, true, false]
        );
    }

    #[test]
    pub fn set_updates_only_its_bit() {
        let (gpio, map) = bank(vec![0b0000_1111], 0);

        gpio.set(5, LineValue::Active).unwrap();
        assert_eq!(map.read(0), Ok(0b0010_1111));
        gpio.direction_output(5, LineValue::Inactive).unwrap();
        assert_eq!(map.read(0), Ok(0b0000_1111));
    }

    #[test]
    pub fn input_lines_cannot_be_driven() {
        let (gpio, map) = bank(vec![0], 0);

        assert_eq!(
            gpio.set(2, LineValue::Active),
            Err(GpioRegmapError::NotOutput(2))
        );
        assert_eq!(
            gpio.direction_output(2, LineValue::Active),
            Err(GpioRegmapError::DirectionFixed(2))
        );
        assert_eq!(gpio.direction_input(2), Ok(()));
        assert_eq!(
            gpio.direction_input(6),
            Err(GpioRegmapError::DirectionFixed(6))
        );
        assert_eq!(map.read(0), Ok(0));
    }

    #[test_case(8 ; "first past end")]
    #[test_case(u32::MAX ; "max")]
    pub fn offsets_past_bank_are_rejected(offset: u32) {
        let (gpio, _) = bank(vec![0], 0);

        assert_eq!(gpio.get(offset), Err(GpioRegmapError::Offset(offset)));
        assert_eq!(gpio.direction(offset), Err(GpioRegmapError::Offset(offset)));
    }

    #[test]
    pub fn lines_span_registers() {
        let map = Arc::new(MmioRegmap::new(vec![0x01u8, 0x80], REGMAP_CONFIG_8R_8V).unwrap());
        let mut config = GpioRegmapConfig::new("wide", map, 16);
        config.reg_dat_base = Some(0);
        config.ngpio_per_reg = 8;
        let gpio = GpioRegmap::new(config).unwrap();

        let active: Vec<_> = gpio
            .lines()
            .map(Result::unwrap)
            .filter(|(_, _, v)| v.is_active())
            .map(|(o, d, _)| (o, d))
            .collect();
        assert_eq!(active, [(0, Direction::Input), (15, Direction::Input)]);
    }

    #[test]
    pub fn direction_without_capability() {
        let map: Arc<dyn Regmap> =
            Arc::new(MmioRegmap::new(vec![0u8], REGMAP_CONFIG_8R_8V).unwrap());

        let mut config = GpioRegmapConfig::new("out", map.clone(), 8);
        config.reg_set_base = Some(0);
        assert_eq!(GpioRegmap::new(config).unwrap().direction(0), Ok(Direction::Output));

        let mut config = GpioRegmapConfig::new("both", map, 8);
        config.reg_dat_base = Some(0);
        config.reg_set_base = Some(0);
        assert_eq!(
            GpioRegmap::new(config).unwrap().direction(3),
            Err(GpioRegmapError::DirectionUnknown(3))
        );
    }

    #[test_case(Some(u32::MAX), None, 1 ; "data base at end")]
    #[test_case(None, Some(u32::MAX - 1), 2 ; "set base with stride")]
    #[test_case(Some(0), None, u32::MAX ; "stride overflows")]
    pub fn bank_past_address_space_is_rejected(dat: Option<u32>, set: Option<u32>, stride: u32) {
        let map: Arc<dyn Regmap> =
            Arc::new(MmioRegmap::new(vec![0u8], REGMAP_CONFIG_8R_8V).unwrap());
        let mut config = GpioRegmapConfig::new("wide", map, 24);
        config.ngpio_per_reg = 8;
        config.reg_dat_base = dat;
        config.reg_set_base = set;
        config.reg_stride = stride;

        assert!(matches!(
            GpioRegmap::new(config),
            Err(GpioRegmapError::InvalidConfig(_))
        ));
    }

    #[test]
    pub fn bank_ending_at_last_register_is_accepted() {
        let map: Arc<dyn Regmap> =
            Arc::new(MmioRegmap::new(vec![0u8], REGMAP_CONFIG_8R_8V).unwrap());
        let mut config = GpioRegmapConfig::new("top", map, 16);
        config.ngpio_per_reg = 8;
        config.reg_dat_base = Some(u32::MAX - 1);

        let gpio = GpioRegmap::new(config).unwrap();
        assert_eq!(gpio.config().reg_dat_base, Some(u32::MAX - 1));
        assert!(matches!(gpio.get(15), Err(GpioRegmapError::Regmap(_))));
    }

    #[test]
    pub fn line_values_from_bool() {
        assert_eq!(LineValue::from(true), LineValue::Active);
        assert_eq!(LineValue::from(false), LineValue::Inactive);
        assert!(!LineValue::from(false).is_active());
    }

    #[test]
    pub fn invalid_descriptors_are_rejected() {
        let map: Arc<dyn Regmap> =
            Arc::new(MmioRegmap::new(vec![0u8], REGMAP_CONFIG_8R_8V).unwrap());

        let config = GpioRegmapConfig::new("no registers", map.clone(), 8);
        assert!(matches!(
            GpioRegmap::new(config),
            Err(GpioRegmapError::InvalidConfig(_))
        ));

        let mut config = GpioRegmapConfig::new("no lines", map, 0);
        config.reg_dat_base = Some(0);
        assert!(matches!(
            GpioRegmap::new(config),
            Err(GpioRegmapError::InvalidConfig(_))
        ));
    }
}
