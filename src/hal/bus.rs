//! Platform bus trait
//!
//! [`CommBus`] abstracts the host framework the controller is attached to.
//! This trait can be implemented by different backends, allowing the
//! bring-up core to run over a real PCI bus, a platform bus, or a mock.

use bitflags::bitflags;

use crate::device::EthFunction;
use crate::error::{BusResult, DmaResult, RegionResult};
use crate::register::RegisterWindow;

// =============================================================================
// Resource Types
// =============================================================================

bitflags! {
    /// Capability flags of one bus resource
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionFlags: u32 {
        /// Resource is memory-mapped
        const MEMORY = 1 << 0;
        /// Resource is I/O-port space
        const IO_PORT = 1 << 1;
        /// Resource may be mapped with prefetching enabled
        const PREFETCH = 1 << 2;
    }
}

/// One bus resource as advertised by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionResource {
    /// Start physical address
    pub start: u64,
    /// Length in bytes
    pub len: usize,
    /// Capability flags
    pub flags: RegionFlags,
}

/// DMA addressing width negotiated with the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaWidth {
    /// 32-bit device addressing
    Bits32,
    /// 64-bit device addressing
    Bits64,
}

/// A coherent memory block visible to both CPU and device
///
/// Both addresses are views over one backing allocation; no explicit cache
/// maintenance is required between CPU and device accesses. The device
/// address is page-aligned.
#[derive(Debug, Clone, Copy)]
pub struct CoherentBuffer {
    /// CPU-visible address of the allocation
    pub cpu: *mut u8,
    /// Device-visible (physical) address of the allocation
    pub device: u64,
    /// Size of the allocation in bytes
    pub size: usize,
}

// =============================================================================
// Bus Trait
// =============================================================================

/// Operations the bring-up core consumes from the platform/bus framework
///
/// The associated `Window` type is the mapped view the platform hands back
/// for a reserved region; on real hardware this is
/// [`MmioWindow`](crate::register::MmioWindow).
pub trait CommBus {
    /// Mapped register-window type produced by [`CommBus::map`]
    type Window: RegisterWindow;

    // -------------------------------------------------------------------------
    // Device control
    // -------------------------------------------------------------------------

    /// Enable the device on its bus
    fn enable(&mut self) -> BusResult<()>;

    /// Disable the device on its bus
    fn disable(&mut self);

    /// Enable or disable bus-master mode
    fn set_bus_master(&mut self, on: bool);

    /// Negotiate a DMA addressing width with the platform
    fn set_dma_width(&mut self, width: DmaWidth) -> BusResult<()>;

    /// Read one byte from the device's configuration space
    fn read_config_u8(&mut self, offset: u16) -> BusResult<u8>;

    // -------------------------------------------------------------------------
    // Regions
    // -------------------------------------------------------------------------

    /// Describe the resource at the given index
    fn resource(&self, index: usize) -> RegionResource;

    /// Reserve an exclusive claim on the address range `[start, start+len)`
    fn request_region(&mut self, start: u64, len: usize) -> RegionResult<()>;

    /// Release a claim taken with [`CommBus::request_region`]
    fn release_region(&mut self, start: u64, len: usize);

    /// Establish a mapped view over a reserved range
    fn map(&mut self, start: u64, len: usize) -> RegionResult<Self::Window>;

    /// Tear down a mapped view
    fn unmap(&mut self, window: Self::Window);

    // -------------------------------------------------------------------------
    // Coherent memory
    // -------------------------------------------------------------------------

    /// Allocate a zero-initialized coherent block of `size` bytes
    fn alloc_coherent(&mut self, size: usize) -> DmaResult<CoherentBuffer>;

    /// Free a block returned by [`CommBus::alloc_coherent`]
    fn free_coherent(&mut self, buffer: CoherentBuffer);

    // -------------------------------------------------------------------------
    // DMA channels
    // -------------------------------------------------------------------------

    /// Request exclusive ownership of the named DMA channel
    fn request_dma_channel(&mut self, channel: u8) -> DmaResult<()>;

    /// Release a channel taken with [`CommBus::request_dma_channel`]
    fn release_dma_channel(&mut self, channel: u8);

    // -------------------------------------------------------------------------
    // Interface registration
    // -------------------------------------------------------------------------

    /// Register the assembled network interface with the framework
    fn register_interface(&mut self, eth: &EthFunction) -> BusResult<()>;

    /// Unregister the interface registered by [`CommBus::register_interface`]
    fn unregister_interface(&mut self);
}
