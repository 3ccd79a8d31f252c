//! Testing utilities and mock implementations
//!
//! This module provides mock implementations of the platform seam for
//! testing the bring-up core on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use crate::constants::{CONFIG_REVISION_ID, DMA_REG_BASE, DMA_REG_STRIDE, REGION_SLOTS};
use crate::device::EthFunction;
use crate::error::{BusError, BusResult, DmaError, DmaResult, RegionError, RegionResult};
use crate::hal::{CoherentBuffer, CommBus, DmaWidth, RegionFlags, RegionResource};
use crate::register::RegisterWindow;

// =============================================================================
// Mock Register Window
// =============================================================================

#[derive(Default, Debug)]
struct WindowState {
    bytes: RefCell<Vec<u8>>,
    /// Sticky write masks: offsets where the hardware only implements the
    /// masked address bits, so written values are ANDed with the mask.
    masks: RefCell<HashMap<usize, u32>>,
    reads: RefCell<Vec<usize>>,
}

/// Mock register window backed by a byte array
///
/// Windows created by [`MockBus::map`] share backing state with the bus,
/// so register banks can be preloaded before bring-up runs. Standalone
/// windows via [`MockWindow::with_len`] carry their own backing.
///
/// # Example
///
/// ```ignore
/// let window = MockWindow::with_len(0x100);
/// window.set_entry(1, 0x0014, 2, 2 | (3 << 8), 0x1000, 0x400);
/// window.set_dma_mask(2, 0xffff_0000);
/// ```
#[derive(Clone, Debug)]
pub struct MockWindow {
    state: Rc<WindowState>,
    bank: usize,
    len: usize,
}

impl MockWindow {
    /// Create a standalone window of the given length, zero-filled
    pub fn with_len(len: usize) -> Self {
        let state = Rc::new(WindowState::default());
        state.bytes.borrow_mut().resize(len, 0);
        Self {
            state,
            bank: usize::MAX,
            len,
        }
    }

    fn from_bank(state: Rc<WindowState>, bank: usize, len: usize) -> Self {
        Self { state, bank, len }
    }

    /// Region index this window was mapped from
    pub fn bank(&self) -> usize {
        self.bank
    }

    /// Write a 16-byte function-table entry at the given index
    pub fn set_entry(&self, index: u8, ty: u16, rev: u16, config: u32, addr: u32, size: u32) {
        let base = index as usize * 16;
        let mut bytes = self.state.bytes.borrow_mut();
        assert!(base + 16 <= bytes.len(), "entry {} past window end", index);

        bytes[base..base + 2].copy_from_slice(&ty.to_le_bytes());
        bytes[base + 2..base + 4].copy_from_slice(&rev.to_le_bytes());
        bytes[base + 4..base + 8].copy_from_slice(&config.to_le_bytes());
        bytes[base + 8..base + 12].copy_from_slice(&addr.to_le_bytes());
        bytes[base + 12..base + 16].copy_from_slice(&size.to_le_bytes());
    }

    /// Emulate a DMA engine implementing only the masked address bits
    ///
    /// Writes to the channel's address register are ANDed with `mask`, so
    /// an all-ones probe reads back as the mask.
    pub fn set_dma_mask(&self, channel: u8, mask: u32) {
        let offset = DMA_REG_BASE + DMA_REG_STRIDE * channel as usize;
        self.state.masks.borrow_mut().insert(offset, mask);
    }

    /// Offsets of all reads performed so far
    pub fn reads(&self) -> Vec<usize> {
        self.state.reads.borrow().clone()
    }

    fn check(&self, offset: usize, size: usize) {
        assert!(
            offset % size == 0 && offset + size <= self.len,
            "mock register access out of window: offset {} size {} len {}",
            offset,
            size,
            self.len
        );
    }
}

impl RegisterWindow for MockWindow {
    fn len(&self) -> usize {
        self.len
    }

    fn read8(&self, offset: usize) -> u8 {
        self.check(offset, 1);
        self.state.reads.borrow_mut().push(offset);
        self.state.bytes.borrow()[offset]
    }

    fn read16(&self, offset: usize) -> u16 {
        self.check(offset, 2);
        self.state.reads.borrow_mut().push(offset);
        let bytes = self.state.bytes.borrow();
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn read32(&self, offset: usize) -> u32 {
        self.check(offset, 4);
        self.state.reads.borrow_mut().push(offset);
        let bytes = self.state.bytes.borrow();
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn write32(&self, offset: usize, value: u32) {
        self.check(offset, 4);
        let value = match self.state.masks.borrow().get(&offset) {
            Some(mask) => value & mask,
            None => value,
        };
        self.state.bytes.borrow_mut()[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn write_barrier(&self) {}
}

// =============================================================================
// Mock Bus Event Log
// =============================================================================

/// One observed bus operation, for ordering assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Enable,
    Disable,
    SetMaster(bool),
    RequestRegion(u64),
    ReleaseRegion(u64),
    Map(u64),
    Unmap(u64),
    AllocCoherent(usize),
    FreeCoherent(u64),
    RequestChannel(u8),
    ReleaseChannel(u8),
    Register,
    Unregister,
}

// =============================================================================
// Mock Bus
// =============================================================================

/// Mock platform bus for testing bring-up without hardware
///
/// Keeps per-region register banks shared with the windows it maps, an
/// ordered event log, and fault-injection switches for every step of the
/// bring-up sequence.
///
/// # Example
///
/// ```ignore
/// let bus = MockBus::new();
/// bus.bank_window(0).set_entry(1, 0x0014, 2, 2 | (3 << 8), 0x1000, 0x400);
/// bus.set_channel_busy(3);
///
/// let mut fcc = Fcc::new(bus, BringupConfig::new());
/// assert!(fcc.probe().is_err());
/// ```
pub struct MockBus {
    resources: RefCell<[RegionResource; REGION_SLOTS]>,
    banks: [Rc<WindowState>; REGION_SLOTS],
    reserved: RefCell<[bool; REGION_SLOTS]>,
    external: RefCell<[bool; REGION_SLOTS]>,
    map_fails: RefCell<[bool; REGION_SLOTS]>,
    mapped: Cell<usize>,
    enabled: Cell<bool>,
    enable_fails: Cell<bool>,
    denied_widths: RefCell<Vec<DmaWidth>>,
    revision: Cell<u8>,
    alloc_fails: Cell<bool>,
    next_device: Cell<u64>,
    allocs: RefCell<Vec<CoherentBuffer>>,
    last_alloc: Cell<Option<CoherentBuffer>>,
    busy_channels: RefCell<Vec<u8>>,
    held_channels: RefCell<Vec<u8>>,
    registration_fails: Cell<bool>,
    registered: Cell<bool>,
    events: RefCell<Vec<Event>>,
}

impl MockBus {
    /// Revision byte reported from mock configuration space
    pub const DEFAULT_REVISION: u8 = 0x05;

    /// Create a bus with three memory-mapped resources (indices 0..3)
    pub fn new() -> Self {
        let resources = [
            RegionResource {
                start: 0xf000_0000,
                len: 0x4000,
                flags: RegionFlags::MEMORY,
            },
            RegionResource {
                start: 0xf010_0000,
                len: 0x100,
                flags: RegionFlags::MEMORY,
            },
            RegionResource {
                start: 0xf020_0000,
                len: 0x2000,
                flags: RegionFlags::MEMORY,
            },
        ];

        let banks = [
            Rc::new(WindowState::default()),
            Rc::new(WindowState::default()),
            Rc::new(WindowState::default()),
        ];
        for (bank, res) in banks.iter().zip(resources.iter()) {
            bank.bytes.borrow_mut().resize(res.len, 0);
        }

        Self {
            resources: RefCell::new(resources),
            banks,
            reserved: RefCell::new([false; REGION_SLOTS]),
            external: RefCell::new([false; REGION_SLOTS]),
            map_fails: RefCell::new([false; REGION_SLOTS]),
            mapped: Cell::new(0),
            enabled: Cell::new(false),
            enable_fails: Cell::new(false),
            denied_widths: RefCell::new(Vec::new()),
            revision: Cell::new(Self::DEFAULT_REVISION),
            alloc_fails: Cell::new(false),
            next_device: Cell::new(0x13000),
            allocs: RefCell::new(Vec::new()),
            last_alloc: Cell::new(None),
            busy_channels: RefCell::new(Vec::new()),
            held_channels: RefCell::new(Vec::new()),
            registration_fails: Cell::new(false),
            registered: Cell::new(false),
            events: RefCell::new(Vec::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Setup and fault injection
    // -------------------------------------------------------------------------

    /// Replace the capability flags of one resource
    pub fn set_resource_flags(&self, index: usize, flags: RegionFlags) {
        self.resources.borrow_mut()[index].flags = flags;
    }

    /// Make mapping of the given region index fail
    pub fn fail_map(&self, index: usize) {
        self.map_fails.borrow_mut()[index] = true;
    }

    /// Make device enable fail
    pub fn fail_enable(&self) {
        self.enable_fails.set(true);
    }

    /// Make coherent allocation fail
    pub fn fail_alloc(&self) {
        self.alloc_fails.set(true);
    }

    /// Make interface registration fail
    pub fn fail_registration(&self) {
        self.registration_fails.set(true);
    }

    /// Mark a DMA channel as owned by another driver
    pub fn set_channel_busy(&self, channel: u8) {
        self.busy_channels.borrow_mut().push(channel);
    }

    /// Refuse the given DMA addressing width
    pub fn deny_dma_width(&self, width: DmaWidth) {
        self.denied_widths.borrow_mut().push(width);
    }

    /// Claim a region on behalf of another owner
    pub fn reserve_externally(&self, index: usize) {
        self.external.borrow_mut()[index] = true;
    }

    /// Drop an external claim taken with [`MockBus::reserve_externally`]
    pub fn release_external(&self, index: usize) {
        self.external.borrow_mut()[index] = false;
    }

    /// Access the register bank behind a region index, for preloading
    pub fn bank_window(&self, index: usize) -> MockWindow {
        let len = self.resources.borrow()[index].len;
        MockWindow::from_bank(self.banks[index].clone(), index, len)
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Whether this core holds a reservation on the region index
    pub fn is_reserved(&self, index: usize) -> bool {
        self.reserved.borrow()[index]
    }

    /// Number of currently established mappings
    pub fn mapped_count(&self) -> usize {
        self.mapped.get()
    }

    /// Whether the device is enabled on the bus
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Coherent allocations not yet freed
    pub fn outstanding_allocs(&self) -> usize {
        self.allocs.borrow().len()
    }

    /// The most recent coherent allocation
    pub fn last_alloc(&self) -> Option<CoherentBuffer> {
        self.last_alloc.get()
    }

    /// DMA channels currently held by this core
    pub fn held_channels(&self) -> Vec<u8> {
        self.held_channels.borrow().clone()
    }

    /// Whether an interface is currently registered
    pub fn registered(&self) -> bool {
        self.registered.get()
    }

    /// All bus operations observed so far, in order
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Clear the event log
    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    fn index_for_start(&self, start: u64) -> usize {
        self.resources
            .borrow()
            .iter()
            .position(|res| res.start == start)
            .expect("unknown region start")
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommBus for MockBus {
    type Window = MockWindow;

    fn enable(&mut self) -> BusResult<()> {
        if self.enable_fails.get() {
            return Err(BusError::EnableFailed);
        }
        self.enabled.set(true);
        self.push(Event::Enable);
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled.set(false);
        self.push(Event::Disable);
    }

    fn set_bus_master(&mut self, on: bool) {
        self.push(Event::SetMaster(on));
    }

    fn set_dma_width(&mut self, width: DmaWidth) -> BusResult<()> {
        if self.denied_widths.borrow().contains(&width) {
            return Err(BusError::DmaWidthUnsupported);
        }
        Ok(())
    }

    fn read_config_u8(&mut self, offset: u16) -> BusResult<u8> {
        if offset == CONFIG_REVISION_ID {
            Ok(self.revision.get())
        } else {
            Ok(0)
        }
    }

    fn resource(&self, index: usize) -> RegionResource {
        self.resources.borrow()[index]
    }

    fn request_region(&mut self, start: u64, _len: usize) -> RegionResult<()> {
        let index = self.index_for_start(start);
        if self.reserved.borrow()[index] || self.external.borrow()[index] {
            return Err(RegionError::Busy);
        }
        self.reserved.borrow_mut()[index] = true;
        self.push(Event::RequestRegion(start));
        Ok(())
    }

    fn release_region(&mut self, start: u64, _len: usize) {
        let index = self.index_for_start(start);
        self.reserved.borrow_mut()[index] = false;
        self.push(Event::ReleaseRegion(start));
    }

    fn map(&mut self, start: u64, len: usize) -> RegionResult<MockWindow> {
        let index = self.index_for_start(start);
        if self.map_fails.borrow()[index] {
            return Err(RegionError::MapFailed);
        }
        self.mapped.set(self.mapped.get() + 1);
        self.push(Event::Map(start));
        Ok(MockWindow::from_bank(self.banks[index].clone(), index, len))
    }

    fn unmap(&mut self, window: MockWindow) {
        let start = self.resources.borrow()[window.bank()].start;
        self.mapped.set(self.mapped.get() - 1);
        self.push(Event::Unmap(start));
    }

    fn alloc_coherent(&mut self, size: usize) -> DmaResult<CoherentBuffer> {
        self.push(Event::AllocCoherent(size));
        if self.alloc_fails.get() {
            return Err(DmaError::AllocFailed);
        }

        let device = self.next_device.get();
        let page = 4096u64;
        let bump = (size as u64).div_ceil(page) * page + page;
        self.next_device.set(device + bump);

        let buffer = CoherentBuffer {
            cpu: (0x5000_0000_0000u64 + device) as *mut u8,
            device,
            size,
        };
        self.allocs.borrow_mut().push(buffer);
        self.last_alloc.set(Some(buffer));
        Ok(buffer)
    }

    fn free_coherent(&mut self, buffer: CoherentBuffer) {
        self.push(Event::FreeCoherent(buffer.device));
        self.allocs.borrow_mut().retain(|b| b.device != buffer.device);
    }

    fn request_dma_channel(&mut self, channel: u8) -> DmaResult<()> {
        if self.busy_channels.borrow().contains(&channel) {
            return Err(DmaError::ChannelBusy);
        }
        self.held_channels.borrow_mut().push(channel);
        self.push(Event::RequestChannel(channel));
        Ok(())
    }

    fn release_dma_channel(&mut self, channel: u8) {
        self.held_channels.borrow_mut().retain(|&c| c != channel);
        self.push(Event::ReleaseChannel(channel));
    }

    fn register_interface(&mut self, _eth: &EthFunction) -> BusResult<()> {
        if self.registration_fails.get() {
            return Err(BusError::RegistrationFailed);
        }
        self.registered.set(true);
        self.push(Event::Register);
        Ok(())
    }

    fn unregister_interface(&mut self) {
        self.registered.set(false);
        self.push(Event::Unregister);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::vec;

    use super::*;

    #[test]
    fn mock_window_entry_layout_round_trips() {
        let window = MockWindow::with_len(0x100);
        window.set_entry(1, 0x0014, 2, 2 | (3 << 8), 0x1000, 0x400);

        assert_eq!(window.read16(16), 0x0014);
        assert_eq!(window.read16(18), 2);
        assert_eq!(window.read32(20), 2 | (3 << 8));
        assert_eq!(window.read32(24), 0x1000);
        assert_eq!(window.read32(28), 0x400);
    }

    #[test]
    fn mock_window_sticky_mask_emulates_probe() {
        let window = MockWindow::with_len(0x2000);
        window.set_dma_mask(1, 0xffff_0000);
        let offset = DMA_REG_BASE + DMA_REG_STRIDE;

        window.write32(offset, 0xffff_ffff);
        assert_eq!(window.read32(offset), 0xffff_0000);

        // Unmasked offsets store the written value unchanged.
        window.write32(0x10, 0x1234_5678);
        assert_eq!(window.read32(0x10), 0x1234_5678);
    }

    #[test]
    fn mock_window_logs_reads() {
        let window = MockWindow::with_len(0x40);
        let _ = window.read8(4);
        let _ = window.read32(16);
        assert_eq!(window.reads(), vec![4, 16]);
    }

    #[test]
    fn mock_bus_tracks_reservations_and_allocs() {
        let mut bus = MockBus::new();

        bus.request_region(0xf000_0000, 0x4000).unwrap();
        assert!(bus.is_reserved(0));
        assert_eq!(
            bus.request_region(0xf000_0000, 0x4000).unwrap_err(),
            RegionError::Busy
        );
        bus.release_region(0xf000_0000, 0x4000);
        assert!(!bus.is_reserved(0));

        let buffer = bus.alloc_coherent(0x2000).unwrap();
        assert_eq!(bus.outstanding_allocs(), 1);
        assert_eq!(buffer.device % 4096, 0);
        bus.free_coherent(buffer);
        assert_eq!(bus.outstanding_allocs(), 0);
    }

    #[test]
    fn mapped_windows_share_the_bank() {
        let mut bus = MockBus::new();
        bus.bank_window(0).set_entry(0, 0x000d, 1, 3, 0, 0);

        let res = bus.resource(0);
        bus.request_region(res.start, res.len).unwrap();
        let window = bus.map(res.start, res.len).unwrap();
        assert_eq!(window.read16(0), 0x000d);
        assert_eq!(window.read8(4), 3);

        bus.unmap(window);
        bus.release_region(res.start, res.len);
    }
}
