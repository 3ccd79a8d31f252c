//! Function table discovery
//!
//! The FPGA bitstream advertises the logical functions it implements in a
//! self-describing table at the base of the function register window. Each
//! entry is 16 bytes:
//!
//! ```text
//! type:u16, rev:u16, union(config:u32 | num_gpios:u8 | {tx_chan:u8, rx_chan:u8}),
//! addr:u32, size:u32
//! ```
//!
//! The one-byte entry count sits at offset 4 from the region base, inside
//! entry 0's config word (the first entry is the controller's own info
//! block). The table is scanned once per bring-up; entries are snapshots,
//! not live references.

use crate::constants::{FUNCTION_BLOCK_SIZE, FUNCTION_COUNT_OFFSET};
use crate::error::{ScanError, ScanResult};
use crate::register::RegisterWindow;

// =============================================================================
// Function Types
// =============================================================================

/// Function type tags implemented by known FPGA bitstreams
///
/// Tags outside this enumeration (including 0, an unused slot) are skipped
/// by the scanner, not treated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum FunctionType {
    /// General-purpose I/O block
    Gpio = 0x000d,
    /// EPCS configuration PROM access
    EpcsProm = 0x000f,
    /// Ethernet/EtherCAT master with DMA engines
    EthMasterDma = 0x0014,
}

impl FunctionType {
    /// Classify a raw type tag, `None` for unused or unrecognized tags
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x000d => Some(FunctionType::Gpio),
            0x000f => Some(FunctionType::EpcsProm),
            0x0014 => Some(FunctionType::EthMasterDma),
            _ => None,
        }
    }
}

/// Type-dependent configuration word of a function-table entry
///
/// Resolved once at scan time from the entry's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FunctionConfig {
    /// Generic 32-bit config word
    Raw(u32),
    /// Number of GPIO lines
    GpioCount(u8),
    /// DMA channel numbers of the Ethernet master
    DmaChannels {
        /// Transmit channel number
        tx: u8,
        /// Receive channel number
        rx: u8,
    },
}

/// Read-only snapshot of one function-table entry
///
/// Taken during the scan; the consuming function driver copies what it
/// needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FunctionInfo {
    /// Classified function type
    pub kind: FunctionType,
    /// Function revision
    pub rev: u16,
    /// Type-dependent configuration
    pub config: FunctionConfig,
    /// Register offset of the function within the function window
    pub addr: u32,
    /// Register space size of the function in bytes
    pub size: u32,
}

// =============================================================================
// Scanner
// =============================================================================

/// Lazy scan over the hardware function table
///
/// Reads live hardware state: finite, non-restartable. Yields a
/// [`FunctionInfo`] per recognized entry and silently skips the rest. The
/// scan covers the advertised entry count, capped at the `max_entries`
/// guard passed to [`FunctionScanner::new`].
pub struct FunctionScanner<'w, W> {
    window: &'w W,
    index: u8,
    count: u8,
}

impl<'w, W: RegisterWindow> FunctionScanner<'w, W> {
    /// Start a scan over the function register window
    pub fn new(window: &'w W, max_entries: u8) -> Self {
        let advertised = window.read8(FUNCTION_COUNT_OFFSET);
        Self {
            window,
            index: 0,
            count: advertised.min(max_entries),
        }
    }

    fn read_entry(&self, index: u8) -> Option<FunctionInfo> {
        let base = index as usize * FUNCTION_BLOCK_SIZE;
        let kind = FunctionType::from_raw(self.window.read16(base))?;
        let rev = self.window.read16(base + 2);
        let raw_config = self.window.read32(base + 4);
        let config = match kind {
            FunctionType::Gpio => FunctionConfig::GpioCount(raw_config as u8),
            FunctionType::EthMasterDma => FunctionConfig::DmaChannels {
                tx: raw_config as u8,
                rx: (raw_config >> 8) as u8,
            },
            FunctionType::EpcsProm => FunctionConfig::Raw(raw_config),
        };

        Some(FunctionInfo {
            kind,
            rev,
            config,
            addr: self.window.read32(base + 8),
            size: self.window.read32(base + 12),
        })
    }
}

impl<W: RegisterWindow> Iterator for FunctionScanner<'_, W> {
    type Item = FunctionInfo;

    fn next(&mut self) -> Option<FunctionInfo> {
        while self.index < self.count {
            let entry = self.read_entry(self.index);
            self.index += 1;
            if entry.is_some() {
                return entry;
            }
        }
        None
    }
}

/// Find the first table entry of the given function type
///
/// Stops at the first match; entries past it are never read.
///
/// # Errors
/// - `FunctionNotFound` - the scan limit was reached without a match
pub fn find_function<W: RegisterWindow>(
    window: &W,
    max_entries: u8,
    kind: FunctionType,
) -> ScanResult<FunctionInfo> {
    FunctionScanner::new(window, max_entries)
        .find(|info| info.kind == kind)
        .ok_or(ScanError::FunctionNotFound)
}

// =============================================================================
// Unit Tests
// =============================================================================
