//! Centralized Constants
//!
//! This module provides a single source of truth for the magic numbers of
//! the FCC register map and bring-up defaults.
//!
//! # Organization
//!
//! - **Region indices**: which register windows the controller uses
//! - **Function table**: layout of the self-describing function table
//! - **DMA control**: the per-channel address/mask register pairs
//! - **Defaults**: bring-up configuration defaults

// =============================================================================
// Region Indices
// =============================================================================

/// Register-window index holding the function table and per-function registers
pub const REGION_FUNCTIONS: usize = 0;

/// Register-window index holding the DMA control registers
pub const REGION_DMA: usize = 2;

/// Number of region slots the bus exposes (index 1 is present but unused)
pub const REGION_SLOTS: usize = 3;

// =============================================================================
// Function Table
// =============================================================================

/// Size in bytes of one function-table entry
pub const FUNCTION_BLOCK_SIZE: usize = 16;

/// Offset of the one-byte entry count from the function-table region base
///
/// The count lives inside entry 0's config word; the first table entry is
/// the controller's own info block.
pub const FUNCTION_COUNT_OFFSET: usize = 4;

// =============================================================================
// DMA Control
// =============================================================================

/// Base offset of the DMA address/mask register pairs
pub const DMA_REG_BASE: usize = 0x1000;

/// Stride between per-channel register pairs (one 64-bit pair per channel)
pub const DMA_REG_STRIDE: usize = core::mem::size_of::<u64>();

/// Mask clearing the two low status bits of the translation-mask readback
pub const TRANSLATE_MASK: u32 = 0xffff_fffc;

// =============================================================================
// Configuration Space
// =============================================================================

/// Offset of the revision byte in bus configuration space
pub const CONFIG_REVISION_ID: u16 = 0x08;

// =============================================================================
// Defaults
// =============================================================================

/// Default host page size in bytes
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default upper bound on function-table entries scanned
///
/// Guards against a corrupt entry-count byte; the advertised count is
/// honored when smaller.
pub const DEFAULT_MAX_FUNCTIONS: u8 = 32;
