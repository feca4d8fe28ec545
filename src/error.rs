//! Allocation failure reporting for the fallible (`try_*`) entry points.
//!
//! The infallible entry points share the same code paths and differ only
//! in what they do on failure: capacity overflow panics and allocation
//! failure goes to `handle_alloc_error`, matching the std collections.

use core::alloc::Layout;

pub use hashbrown::TryReserveError;

/// Whether memory allocation errors should return an error or abort.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    /// Error to return on capacity overflow.
    #[cold]
    pub(crate) fn capacity_overflow(self) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::CapacityOverflow,
            Fallibility::Infallible => panic!("Hash table capacity overflow"),
        }
    }

    /// Error to return on allocation error.
    #[cold]
    pub(crate) fn alloc_err(self, layout: Layout) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::AllocError { layout },
            Fallibility::Infallible => std::alloc::handle_alloc_error(layout),
        }
    }
}

/// Unwraps a result produced under `Fallibility::Infallible`.
#[inline]
pub(crate) fn infallible<T>(res: Result<T, TryReserveError>) -> T {
    match res {
        Ok(v) => v,
        Err(_) => unreachable!("infallible allocation path returned an error"),
    }
}
