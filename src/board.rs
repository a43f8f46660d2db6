// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Static per-board description of the CPLD GPIO banks.

use bitflags::bitflags;

use crate::gpio_regmap::Direction;

/// Number of lines in one CPLD GPIO bank.
pub const CPLD_GPIO_LINES: u32 = 8;

bitflags! {
    /// One bit per line of an 8-line bank.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineMask: u8 {
        const LINE0 = (1 << 0);
        const LINE1 = (1 << 1);
        const LINE2 = (1 << 2);
        const LINE3 = (1 << 3);
        const LINE4 = (1 << 4);
        const LINE5 = (1 << 5);
        const LINE6 = (1 << 6);
        const LINE7 = (1 << 7);
    }
}

impl LineMask {
    /// Mask with only `line` set; empty for lines outside the bank.
    #[inline]
    pub const fn line(line: u32) -> Self {
        match 1u8.checked_shl(line) {
            Some(bit) => Self::from_bits_retain(bit),
            None => Self::empty(),
        }
    }

    /// Contiguous mask of lines `low..=high`, like the kernel's `GENMASK`.
    pub const fn range(high: u32, low: u32) -> Self {
        let upper = match 2u16.checked_shl(high) {
            Some(v) => v,
            None => 0,
        };
        let lower = match 1u16.checked_shl(low) {
            Some(v) => v,
            None => 0,
        };
        Self::from_bits_truncate(upper.wrapping_sub(lower) as u8)
    }

    #[inline]
    pub const fn has_line(&self, line: u32) -> bool {
        let bit = Self::line(line).bits();
        bit != 0 && self.bits() & bit == bit
    }
}

/// The CPLD variants this driver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardVariant {
    /// LX2160A-RDB board CPLD.
    Lx2160aRdb,
    /// STAT_PRES2 register of the LS1046A-QDS QIXIS CPLD.
    Ls1046aQdsStatPres2,
}

/// Fixed line directions of one CPLD GPIO bank.
///
/// A set bit in `input_lines` makes that line an input, a clear bit an
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardGpioConfig {
    pub variant: BoardVariant,
    pub input_lines: LineMask,
}

impl BoardGpioConfig {
    pub const fn new(variant: BoardVariant, input_lines: LineMask) -> Self {
        Self {
            variant,
            input_lines,
        }
    }

    /// Direction of `line` on this board.
    #[inline]
    pub const fn direction(&self, line: u32) -> Direction {
        if self.input_lines.has_line(line) {
            Direction::Input
        } else {
            Direction::Output
        }
    }

    /// Iterate over `(line, direction)` for every line of the bank.
    pub fn lines(&self) -> impl Iterator<Item = (u32, Direction)> + '_ {
        (0..CPLD_GPIO_LINES).map(move |line| (line, self.direction(line)))
    }
}

pub static LX2160ARDB_CPLD_GPIO_CFG: BoardGpioConfig =
    BoardGpioConfig::new(BoardVariant::Lx2160aRdb, LineMask::range(7, 1));

pub static LS1046AQDS_STAT_PRES2_CPLD_GPIO_CFG: BoardGpioConfig =
    BoardGpioConfig::new(BoardVariant::Ls1046aQdsStatPres2, LineMask::range(7, 0));

/// A compatible string paired with the board it describes.
#[derive(Debug)]
pub struct OfDeviceId {
    pub compatible: &'static str,
    pub data: &'static BoardGpioConfig,
}

/// Device-match table handed to the matching layer.
pub static OF_MATCH_TABLE: &[OfDeviceId] = &[
    OfDeviceId {
        compatible: "fsl,lx2160a-rdb-qixis-cpld-gpio",
        data: &LX2160ARDB_CPLD_GPIO_CFG,
    },
    OfDeviceId {
        compatible: "fsl,ls1046a-qds-qixis-stat-pres2-cpld-gpio",
        data: &LS1046AQDS_STAT_PRES2_CPLD_GPIO_CFG,
    },
];

/// Board configuration for a match key, if the key is known.
pub fn lookup(key: &str) -> Option<&'static BoardGpioConfig> {
    OF_MATCH_TABLE
        .iter()
        .find(|id| id.compatible == key)
        .map(|id| id.data)
}

/// First table entry matching any of a device's compatible strings.
///
/// Compatibles are tried in the order the device lists them, most
/// specific first.
pub fn of_match<'a, I>(compatibles: I) -> Option<&'static OfDeviceId>
where
    I: IntoIterator<Item = &'a str>,
{
    compatibles
        .into_iter()
        .find_map(|c| OF_MATCH_TABLE.iter().find(|id| id.compatible == c))
}
