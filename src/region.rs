//! Register-window reservation and mapping
//!
//! A [`MemoryRegion`] is one reserved, mapped hardware register window.
//! Acquisition is atomic: the region is either fully reserved and mapped,
//! or absent; a mapping failure unwinds the reservation before the error
//! is returned. Release unmaps first, then drops the reservation.

use crate::error::{RegionError, RegionResult};
use crate::hal::{CommBus, RegionFlags};

/// One reserved, mapped hardware register window
///
/// Exclusively owned by the device that acquired it; released exactly once
/// by value, which also invalidates the handle.
#[derive(Debug)]
pub struct MemoryRegion<W> {
    start: u64,
    len: usize,
    flags: RegionFlags,
    window: W,
}

impl<W> MemoryRegion<W> {
    /// Reserve and map the resource at the given index
    ///
    /// # Errors
    /// - `UnsupportedKind` - the resource is not memory-mapped
    /// - `Busy` - the address range is claimed by another owner
    /// - `MapFailed` - mapping failed; the reservation is unwound
    pub fn acquire<B>(bus: &mut B, index: usize) -> RegionResult<Self>
    where
        B: CommBus<Window = W>,
    {
        let res = bus.resource(index);
        if !res.flags.contains(RegionFlags::MEMORY) {
            #[cfg(feature = "defmt")]
            defmt::warn!("region {} is not memory-mapped", index);
            return Err(RegionError::UnsupportedKind);
        }

        bus.request_region(res.start, res.len)?;

        let window = match bus.map(res.start, res.len) {
            Ok(window) => window,
            Err(e) => {
                bus.release_region(res.start, res.len);
                return Err(e);
            }
        };

        #[cfg(feature = "defmt")]
        defmt::info!(
            "region {} at [{:#x}, {:#x}) mapped, len={}",
            index,
            res.start,
            res.start + res.len as u64,
            res.len
        );

        Ok(Self {
            start: res.start,
            len: res.len,
            flags: res.flags,
            window,
        })
    }

    /// Unmap and unreserve the window, in that order
    pub fn release<B>(self, bus: &mut B)
    where
        B: CommBus<Window = W>,
    {
        let Self {
            start,
            len,
            flags: _,
            window,
        } = self;
        bus.unmap(window);
        bus.release_region(start, len);
    }

    /// Start physical address of the window
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Length of the window in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window has zero length
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capability flags of the underlying resource
    pub fn flags(&self) -> RegionFlags {
        self.flags
    }

    /// Mapped view over the window
    pub fn window(&self) -> &W {
        &self.window
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
