//! DMA channel initialization and address translation
//!
//! Each DMA engine of the controller reports its addressing constraints
//! through a 64-bit address/mask register pair at `0x1000 + 8 * channel`
//! in the DMA control window. Writing all-ones to the low word and reading
//! it back reveals which address bits the engine implements; the bits that
//! stick at 1 form the translation mask.
//!
//! From the mask the required window granularity follows, and the backing
//! buffer is allocated at twice that granularity minus one page so a
//! window-aligned, page-granular sub-range always exists inside it
//! regardless of where the allocator placed the buffer. The start of that
//! sub-range is the translated address programmed into the engine.

use crate::constants::{DMA_REG_BASE, DMA_REG_STRIDE, TRANSLATE_MASK};
use crate::error::{DmaError, DmaResult};
use crate::hal::{CoherentBuffer, CommBus};
use crate::register::RegisterWindow;

// =============================================================================
// Translation Arithmetic
// =============================================================================

/// Extract the translation mask from the probe readback
///
/// The two low bits are status bits, not address bits.
pub const fn translation_mask(readback: u32) -> u32 {
    readback & TRANSLATE_MASK
}

/// Size of the addressing window implied by a translation mask
///
/// `(!mask) + 1` in wrapping arithmetic: the number of addresses covered
/// by the bits the engine does not implement.
pub const fn window_size(mask: u32) -> u32 {
    mask.wrapping_neg()
}

/// Buffer size needed to guarantee a window-aligned sub-range
///
/// `2 * window - page`: any allocation that large contains a
/// window-aligned, page-granular range of `window` bytes. The caller must
/// have validated `window >= page`.
pub const fn buffer_size(window: u32, page_size: usize) -> usize {
    2 * window as usize - page_size
}

/// Window-aligned device address inside the oversized buffer
///
/// Aligns `device + window - page` down to the window granularity. For a
/// power-of-two window, `!(window - 1)` equals the translation mask in
/// the low 32 bits while keeping high address bits intact, so the result
/// satisfies the engine's mask for any 64-bit device address.
pub const fn translated_address(device: u64, window: u32, page_size: usize) -> u64 {
    (device + window as u64 - page_size as u64) & !(window as u64 - 1)
}

// =============================================================================
// DMA Channel
// =============================================================================

/// One hardware DMA engine bound to a coherent buffer
///
/// The channel identifier is the only link back to the owning device; the
/// orchestrator governs the lifetime. The handle is released exactly once
/// by value via [`DmaChannel::free`].
#[derive(Debug)]
pub struct DmaChannel {
    channel: u8,
    buffer: CoherentBuffer,
    translated: u64,
}

impl DmaChannel {
    /// Probe the engine's addressing constraints, allocate its buffer and
    /// program the translated address
    ///
    /// `window` is the mapped DMA control register window; `page_size` is
    /// the host page size and must be a power of two.
    ///
    /// # Errors
    /// - `AllocFailed` - `page_size` is not a power of two, the engine
    ///   reported a window smaller than one page, or the coherent
    ///   allocation failed; no channel request was issued
    /// - `ChannelBusy` - the channel is owned by another driver; the
    ///   buffer is freed before returning
    pub fn init<B, W>(bus: &mut B, window: &W, channel: u8, page_size: usize) -> DmaResult<Self>
    where
        B: CommBus,
        W: RegisterWindow,
    {
        if !page_size.is_power_of_two() {
            #[cfg(feature = "defmt")]
            defmt::warn!("DMA{} rejected page size {}", channel, page_size);
            return Err(DmaError::AllocFailed);
        }

        let offset = DMA_REG_BASE + DMA_REG_STRIDE * channel as usize;

        window.write32(offset, u32::MAX);
        window.write_barrier();
        let mask = translation_mask(window.read32(offset));

        let mem_size = window_size(mask);
        if !mem_size.is_power_of_two() || (mem_size as usize) < page_size {
            #[cfg(feature = "defmt")]
            defmt::warn!("DMA{} reported unusable mask {:#x}", channel, mask);
            return Err(DmaError::AllocFailed);
        }

        let size = buffer_size(mem_size, page_size);
        let buffer = bus.alloc_coherent(size)?;

        if let Err(e) = bus.request_dma_channel(channel) {
            bus.free_coherent(buffer);
            return Err(e);
        }

        let translated = translated_address(buffer.device, mem_size, page_size);
        window.write64(offset, translated);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "DMA{} initialized: cpu={:#x} device={:#x} translated={:#x} mask={:#x} size={}",
            channel,
            buffer.cpu as usize,
            buffer.device,
            translated,
            mask,
            size
        );

        Ok(Self {
            channel,
            buffer,
            translated,
        })
    }

    /// Release the channel request, then free the backing buffer
    ///
    /// The channel request goes first so the engine can no longer be
    /// programmed against memory that is about to be freed.
    pub fn free<B: CommBus>(self, bus: &mut B) {
        let Self {
            channel, buffer, ..
        } = self;
        bus.release_dma_channel(channel);
        bus.free_coherent(buffer);
    }

    /// Channel identifier
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Size of the backing buffer in bytes
    pub fn size(&self) -> usize {
        self.buffer.size
    }

    /// Device-visible translated address programmed into the engine
    pub fn device_addr(&self) -> u64 {
        self.translated
    }

    /// CPU-visible view of the translated address
    ///
    /// Reads and writes through this pointer observe the same memory the
    /// engine transfers against.
    pub fn frame_ptr(&self) -> *mut u8 {
        self.buffer
            .cpu
            .wrapping_add((self.translated - self.buffer.device) as usize)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
