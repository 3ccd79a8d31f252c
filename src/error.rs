//! Error types for the FCC bring-up core
//!
//! Errors are organized by domain for better diagnostics:
//! - [`BusError`]: Bus enable, config-space and registration failures
//! - [`RegionError`]: Register-window reservation and mapping failures
//! - [`ScanError`]: Function-table discovery failures
//! - [`DmaError`]: Coherent-buffer and DMA-channel failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by the orchestrator. Components report failure by result; the
//! orchestrator rolls back and propagates the original kind unchanged.

// =============================================================================
// Bus Errors
// =============================================================================

/// Bus-level and framework-facing errors
///
/// These errors occur while enabling the device on its bus, reading its
/// configuration space, negotiating DMA addressing width, or registering
/// the resulting network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Enabling the device on its bus failed
    EnableFailed,
    /// Reading a configuration-space byte failed
    ConfigReadFailed,
    /// The requested DMA addressing width is not available
    DmaWidthUnsupported,
    /// Registering the network interface with the framework failed
    RegistrationFailed,
    /// Bring-up attempted while a previous bring-up is still active
    AlreadyActive,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BusError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BusError::EnableFailed => "bus enable failed",
            BusError::ConfigReadFailed => "config space read failed",
            BusError::DmaWidthUnsupported => "DMA addressing width unsupported",
            BusError::RegistrationFailed => "interface registration failed",
            BusError::AlreadyActive => "bring-up already active",
        }
    }
}

// =============================================================================
// Region Errors
// =============================================================================

/// Register-window reservation and mapping errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionError {
    /// The resource does not expose the memory-mapped capability
    UnsupportedKind,
    /// The address range is already claimed by another owner
    Busy,
    /// Establishing the mapped view failed
    MapFailed,
}

impl core::fmt::Display for RegionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RegionError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RegionError::UnsupportedKind => "region is not memory-mapped",
            RegionError::Busy => "region already reserved",
            RegionError::MapFailed => "region mapping failed",
        }
    }
}

// =============================================================================
// Scan Errors
// =============================================================================

/// Function-table discovery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError {
    /// No entry of the sought function type before the scan limit
    FunctionNotFound,
}

impl core::fmt::Display for ScanError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScanError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScanError::FunctionNotFound => "function not found",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Coherent-buffer and DMA-channel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Coherent buffer allocation failed, the device reported a
    /// translation mask implying a window smaller than one page, or the
    /// configured page size is not a power of two
    AllocFailed,
    /// The DMA channel is already owned by another driver
    ChannelBusy,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::AllocFailed => "DMA memory allocation failed",
            DmaError::ChannelBusy => "DMA channel busy",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match fcc.probe() {
///     Err(Error::Region(RegionError::Busy)) => { /* ... */ }
///     Err(Error::Scan(ScanError::FunctionNotFound)) => { /* ... */ }
///     Err(Error::Dma(DmaError::ChannelBusy)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus error
    Bus(BusError),
    /// Region error
    Region(RegionError),
    /// Scan error
    Scan(ScanError),
    /// DMA error
    Dma(DmaError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus: {}", e.as_str()),
            Error::Region(e) => write!(f, "region: {}", e.as_str()),
            Error::Scan(e) => write!(f, "scan: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}

impl From<RegionError> for Error {
    fn from(e: RegionError) -> Self {
        Error::Region(e)
    }
}

impl From<ScanError> for Error {
    fn from(e: ScanError) -> Self {
        Error::Scan(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

/// Result type alias for bring-up operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for bus operations
pub type BusResult<T> = core::result::Result<T, BusError>;

/// Result type alias for region operations
pub type RegionResult<T> = core::result::Result<T, RegionError>;

/// Result type alias for scan operations
pub type ScanResult<T> = core::result::Result<T, ScanError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

// =============================================================================
// Unit Tests
// =============================================================================
