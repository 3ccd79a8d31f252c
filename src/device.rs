//! Device assembly and teardown
//!
//! [`Fcc`] owns the bring-up sequence for one controller instance: enable
//! the device on its bus, map the two register windows, discover the
//! DMA-capable Ethernet master in the function table, initialize its two
//! DMA channels and hand the assembled interface to the framework. Any
//! failure rolls back everything acquired so far and propagates the
//! original error; teardown releases in exact reverse order of
//! acquisition and is a no-op on absent resources.
//!
//! One orchestrator instance owns the sequencing for one physical device;
//! distinct instances are independent.

use crate::constants::{
    CONFIG_REVISION_ID, DEFAULT_MAX_FUNCTIONS, DEFAULT_PAGE_SIZE, REGION_DMA, REGION_FUNCTIONS,
};
use crate::dma::DmaChannel;
use crate::error::{BusError, Error, RegionError, Result, ScanError};
use crate::function::{find_function, FunctionConfig, FunctionInfo, FunctionType};
use crate::hal::{CommBus, DmaWidth};
use crate::region::MemoryRegion;

// =============================================================================
// Configuration
// =============================================================================

/// Bring-up configuration
///
/// # Example
/// ```ignore
/// let config = BringupConfig::new()
///     .with_page_size(4096)
///     .with_max_functions(16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BringupConfig {
    /// Host page size in bytes; must be a power of two, enforced when
    /// the DMA channels are initialized
    pub page_size: usize,
    /// Upper bound on function-table entries scanned
    pub max_functions: u8,
}

impl BringupConfig {
    /// Create a configuration with default values
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_functions: DEFAULT_MAX_FUNCTIONS,
        }
    }

    /// Set the host page size
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the function-table scan guard
    #[must_use]
    pub const fn with_max_functions(mut self, max_functions: u8) -> Self {
        self.max_functions = max_functions;
        self
    }
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// State
// =============================================================================

/// Bring-up progress of one device instance
///
/// Teardown can run from any state and unwinds to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Nothing acquired
    #[default]
    Uninitialized,
    /// Device enabled on its bus, bus-master set, DMA width negotiated
    BusEnabled,
    /// Both register windows reserved and mapped
    RegionsMapped,
    /// DMA-capable Ethernet master found in the function table
    FunctionDiscovered,
    /// Both DMA channels initialized
    DmaReady,
    /// Interface registered with the framework
    HandedOff,
}

// =============================================================================
// Handed-off Resources
// =============================================================================

/// The assembled Ethernet master resources handed to the data-path driver
pub struct EthFunction {
    /// Snapshot of the discovered function-table entry
    pub info: FunctionInfo,
    /// Transmit DMA channel
    pub tx: DmaChannel,
    /// Receive DMA channel
    pub rx: DmaChannel,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Bring-up and teardown orchestrator for one controller instance
///
/// # Example
/// ```ignore
/// let mut fcc = Fcc::new(bus, BringupConfig::new());
/// fcc.probe()?;
/// // ... data path runs against fcc.ethernet() ...
/// fcc.remove();
/// ```
pub struct Fcc<B: CommBus> {
    bus: B,
    config: BringupConfig,
    state: State,
    revision: u8,
    dma_width: Option<DmaWidth>,
    table_region: Option<MemoryRegion<B::Window>>,
    ctrl_region: Option<MemoryRegion<B::Window>>,
    eth: Option<EthFunction>,
}

impl<B: CommBus> Fcc<B> {
    /// Create an orchestrator over a bus handle
    ///
    /// Nothing is acquired until [`Fcc::probe`] runs.
    pub fn new(bus: B, config: BringupConfig) -> Self {
        Self {
            bus,
            config,
            state: State::Uninitialized,
            revision: 0,
            dma_width: None,
            table_region: None,
            ctrl_region: None,
            eth: None,
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Current bring-up state
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Device revision byte read during bring-up
    #[inline(always)]
    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// Negotiated DMA addressing width, `None` when negotiation failed
    #[inline(always)]
    pub fn dma_width(&self) -> Option<DmaWidth> {
        self.dma_width
    }

    /// The handed-off Ethernet master resources, once `HandedOff`
    pub fn ethernet(&self) -> Option<&EthFunction> {
        self.eth.as_ref()
    }

    /// Register access for the discovered function: the function window
    /// plus the function's base offset within it
    pub fn function_window(&self) -> Option<(&B::Window, u32)> {
        let eth = self.eth.as_ref()?;
        let table = self.table_region.as_ref()?;
        Some((table.window(), eth.info.addr))
    }

    // =========================================================================
    // Bring-up
    // =========================================================================

    /// Run the full bring-up sequence
    ///
    /// On any failure, everything acquired so far is rolled back before
    /// the original error is returned; the device is then eligible for a
    /// fresh `probe`.
    ///
    /// # Errors
    /// - `AlreadyActive` - a previous bring-up has not been removed
    /// - any error of the underlying step, unchanged
    pub fn probe(&mut self) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(BusError::AlreadyActive.into());
        }

        match self.bring_up() {
            Ok(()) => Ok(()),
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("bring-up failed, rolling back");
                self.teardown();
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> Result<()> {
        self.bus.enable()?;
        self.state = State::BusEnabled;
        self.bus.set_bus_master(true);
        self.revision = self.bus.read_config_u8(CONFIG_REVISION_ID)?;
        self.dma_width = Self::negotiate_dma_width(&mut self.bus);

        self.table_region = Some(MemoryRegion::acquire(&mut self.bus, REGION_FUNCTIONS)?);
        self.ctrl_region = Some(MemoryRegion::acquire(&mut self.bus, REGION_DMA)?);
        self.state = State::RegionsMapped;

        let (table, ctrl) = match (&self.table_region, &self.ctrl_region) {
            (Some(table), Some(ctrl)) => (table, ctrl),
            _ => return Err(Error::Region(RegionError::MapFailed)),
        };

        let info = find_function(
            table.window(),
            self.config.max_functions,
            FunctionType::EthMasterDma,
        )?;
        self.state = State::FunctionDiscovered;

        let FunctionConfig::DmaChannels { tx, rx } = info.config else {
            return Err(Error::Scan(ScanError::FunctionNotFound));
        };

        let page_size = self.config.page_size;
        let tx_dma = DmaChannel::init(&mut self.bus, ctrl.window(), tx, page_size)?;
        let rx_dma = match DmaChannel::init(&mut self.bus, ctrl.window(), rx, page_size) {
            Ok(rx_dma) => rx_dma,
            Err(e) => {
                tx_dma.free(&mut self.bus);
                return Err(e.into());
            }
        };
        self.state = State::DmaReady;

        let eth = EthFunction {
            info,
            tx: tx_dma,
            rx: rx_dma,
        };
        if let Err(e) = self.bus.register_interface(&eth) {
            let EthFunction { tx, rx, .. } = eth;
            rx.free(&mut self.bus);
            tx.free(&mut self.bus);
            return Err(e.into());
        }
        self.eth = Some(eth);
        self.state = State::HandedOff;

        #[cfg(feature = "defmt")]
        defmt::info!("bring-up complete, revision {}", self.revision);

        Ok(())
    }

    fn negotiate_dma_width(bus: &mut B) -> Option<DmaWidth> {
        if bus.set_dma_width(DmaWidth::Bits64).is_ok() {
            #[cfg(feature = "defmt")]
            defmt::info!("64-bit DMA addressing supported");
            Some(DmaWidth::Bits64)
        } else if bus.set_dma_width(DmaWidth::Bits32).is_ok() {
            #[cfg(feature = "defmt")]
            defmt::info!("32-bit DMA addressing supported");
            Some(DmaWidth::Bits32)
        } else {
            // Not fatal: functions without DMA still work.
            #[cfg(feature = "defmt")]
            defmt::warn!("no usable DMA addressing width");
            None
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Unregister the interface (if handed off) and tear everything down
    ///
    /// Safe to call from any state, including after a failed `probe` or
    /// repeatedly; absent resources are skipped.
    pub fn remove(&mut self) {
        if self.state == State::HandedOff {
            self.bus.unregister_interface();
        }
        self.teardown();
    }

    /// Release resources in exact reverse order of acquisition
    fn teardown(&mut self) {
        if let Some(eth) = self.eth.take() {
            let EthFunction { tx, rx, .. } = eth;
            rx.free(&mut self.bus);
            tx.free(&mut self.bus);
        }
        if let Some(region) = self.ctrl_region.take() {
            region.release(&mut self.bus);
        }
        if let Some(region) = self.table_region.take() {
            region.release(&mut self.bus);
        }
        if self.state != State::Uninitialized {
            self.bus.set_bus_master(false);
            self.bus.disable();
        }
        self.revision = 0;
        self.dma_width = None;
        self.state = State::Uninitialized;
    }

    /// Tear down and return the bus handle to the framework
    pub fn into_bus(mut self) -> B {
        self.remove();
        self.bus
    }

    #[cfg(test)]
    pub(crate) fn bus_for_test(&self) -> &B {
        &self.bus
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
