//! FCC Bring-up Core
//!
//! A `no_std` Rust implementation of the bring-up and DMA-resource core for
//! FPGA-based multi-function communication controllers (FCC): devices that
//! expose several logical functions (Ethernet/EtherCAT master, GPIO, EPCS
//! PROM) behind a single memory-mapped PCI device.
//!
//! The crate owns the device bring-up sequence and nothing else: it maps
//! the register windows, discovers which functions the loaded bitstream
//! implements, sizes and allocates the coherent DMA buffers the hardware
//! asks for, programs the translated device addresses, and hands the
//! assembled resources to the data-path driver. Teardown is symmetric and
//! leak-free from any intermediate state.
//!
//! # Architecture
//!
//! The driver is organized into four layers:
//!
//! 1. **Orchestrator** ([`device`]): Bring-up/teardown state machine
//! 2. **Discovery** ([`function`]): Self-describing function-table scan
//! 3. **Resources** ([`region`], [`dma`]): Register windows and DMA channels
//! 4. **Seams** ([`hal`], [`register`]): Platform bus trait and typed
//!    register-window access
//!
//! The platform/bus framework (device enable, region reservation, coherent
//! memory, DMA channel ownership, interface registration) is consumed
//! through the [`CommBus`] trait; implement it once per host platform.
//! Frame transmit/receive and function-specific logic live outside this
//! crate, driven by the resources [`Fcc::probe`] hands off.
//!
//! # Features
//!
//! - `defmt`: Enable defmt diagnostics for bring-up progress and errors
//! - `critical-section`: Enable the ISR-safe [`SharedFcc`] wrapper
//!
//! # Example
//!
//! ```ignore
//! use ph_fcc::{BringupConfig, CommBus, Fcc};
//!
//! // Your platform's CommBus implementation
//! let bus = /* platform bus handle */;
//!
//! let mut fcc = Fcc::new(bus, BringupConfig::new());
//! fcc.probe()?;
//!
//! let eth = fcc.ethernet().unwrap();
//! // Hand eth.tx / eth.rx and the function window to the data-path driver.
//!
//! // Later, on detach:
//! fcc.remove();
//! ```

#![no_std]

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod device;
pub mod dma;
pub mod error;
pub mod function;
pub mod hal;
pub mod region;
pub mod register;

#[cfg(feature = "critical-section")]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use device::{BringupConfig, EthFunction, Fcc, State};
pub use dma::DmaChannel;
pub use error::{
    BusError, BusResult, DmaError, DmaResult, Error, RegionError, RegionResult, Result, ScanError,
    ScanResult,
};
pub use function::{find_function, FunctionConfig, FunctionInfo, FunctionScanner, FunctionType};
pub use hal::{CoherentBuffer, CommBus, DmaWidth, RegionFlags, RegionResource};
pub use region::MemoryRegion;
pub use register::{MmioWindow, RegisterWindow};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedFcc;
