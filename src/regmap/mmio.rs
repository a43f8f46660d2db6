// Copyright (c) 2024 The qixis-cpld-gpio Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{
    ffi::c_void,
    fs::OpenOptions,
    io::{Error, ErrorKind, Result},
    num::NonZeroUsize,
    os::unix::fs::OpenOptionsExt,
    path::Path,
    ptr::NonNull,
};

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};

use super::IoMem;
use crate::device::Resource;

/// A physical memory window mapped through `/dev/mem`.
///
/// The mapping is page aligned internally; offsets handed to [`IoMem`] are
/// relative to the resource start.  Unmapped on drop.
#[derive(Debug)]
pub struct PhysMem {
    base: NonNull<c_void>,
    map_len: usize,
    offset: usize,
    len: usize,
}

// SAFETY: the mapping is owned exclusively by this value and accessed only
// through volatile byte reads and writes.
unsafe impl Send for PhysMem {}

impl PhysMem {
    pub fn map(res: &Resource) -> Result<Self> {
        Self::map_path(Path::new("/dev/mem"), res)
    }

    /// Map `res` from the memory device at `path`.
    pub fn map_path(path: &Path, res: &Resource) -> Result<Self> {
        let len = usize::try_from(res.size)
            .ok()
            .filter(|len| *len > 0)
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Invalid resource size"))?;

        let page = page_size()?;
        let page_base = res.start & !(page as u64 - 1);
        let offset = (res.start - page_base) as usize;
        let map_len = offset
            .checked_add(len)
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Resource too large"))?;
        let file_offset = libc::off_t::try_from(page_base)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Resource start out of range"))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)?;

        // SAFETY: a fresh shared mapping not aliased by any Rust object.
        let base = unsafe {
            mmap(
                None,
                map_len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                file_offset,
            )?
        };

        Ok(Self {
            base,
            map_len: map_len.get(),
            offset,
            len,
        })
    }

    fn byte_ptr(&self, offset: usize) -> Option<*mut u8> {
        if offset >= self.len {
            return None;
        }
        // SAFETY: `self.offset + offset < self.map_len`.
        Some(unsafe { self.base.as_ptr().cast::<u8>().add(self.offset + offset) })
    }
}

impl IoMem for PhysMem {
    fn len(&self) -> usize {
        self.len
    }

    fn read8(&self, offset: usize) -> Option<u8> {
        let ptr = self.byte_ptr(offset)?;
        // SAFETY: in bounds of a live mapping.
        Some(unsafe { ptr.read_volatile() })
    }

    fn write8(&mut self, offset: usize, val: u8) -> Option<()> {
        let ptr = self.byte_ptr(offset)?;
        // SAFETY: in bounds of a live, writable mapping.
        unsafe { ptr.write_volatile(val) };
        Some(())
    }
}

impl Drop for PhysMem {
    fn drop(&mut self) {
        // SAFETY: `base`/`map_len` describe the mapping created in `map_path`.
        if let Err(e) = unsafe { munmap(self.base, self.map_len) } {
            tracing::warn!("failed to unmap register window: {e}");
        }
    }
}

fn page_size() -> Result<usize> {
    // SAFETY: sysconf has no memory-safety preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(page)
        .ok()
        .filter(|p| p.is_power_of_two())
        .ok_or_else(Error::last_os_error)
}
