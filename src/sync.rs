//! ISR-safe shared device wrapper using critical sections.
//!
//! Provides [`SharedFcc`] for frameworks whose attach/detach callbacks and
//! data-path interrupt handlers touch the same device instance. All access
//! goes through `critical_section::with()`, disabling interrupts for the
//! duration of the closure.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::device::Fcc;
use crate::hal::CommBus;

/// ISR-safe wrapper around one [`Fcc`] instance.
///
/// The wrapper starts empty so it can live in a `static`; the framework
/// installs the device with [`SharedFcc::init`] once the bus handle exists.
///
/// # Example
///
/// ```ignore
/// static FCC: SharedFcc<PlatformBus> = SharedFcc::new();
///
/// FCC.init(Fcc::new(bus, BringupConfig::new()));
/// FCC.with(|fcc| fcc.probe()).unwrap()?;
/// ```
pub struct SharedFcc<B: CommBus> {
    inner: Mutex<RefCell<Option<Fcc<B>>>>,
}

impl<B: CommBus> SharedFcc<B> {
    /// Create an empty shared slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install a device instance, returning the previous one if any.
    pub fn init(&self, fcc: Fcc<B>) -> Option<Fcc<B>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(fcc))
    }

    /// Execute a closure with exclusive access to the device.
    ///
    /// Interrupts are disabled for the duration of the closure. Returns
    /// `None` if no device has been installed.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Fcc<B>) -> R,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Remove and return the installed device.
    pub fn take(&self) -> Option<Fcc<B>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }
}

impl<B: CommBus> Default for SharedFcc<B> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
