//! Precondition checks selected by build mode.
//!
//! `contract_assert!` panics on a violated precondition in debug builds and
//! in any build with the `checked-contracts` feature. Otherwise the check
//! is compiled out and the condition is never evaluated. A violated
//! precondition in an unchecked build never breaks memory safety; the
//! operation degrades to a no-op or an unspecified (but valid) result.

/// True when precondition checks are compiled in.
pub const CHECKED: bool = cfg!(any(debug_assertions, feature = "checked-contracts"));

macro_rules! contract_assert {
    ($cond:expr, $($arg:tt)+) => {
        if $crate::contract::CHECKED && !$cond {
            $crate::contract::violated(format_args!($($arg)+));
        }
    };
}

pub(crate) use contract_assert;

#[cold]
#[inline(never)]
pub(crate) fn violated(args: core::fmt::Arguments<'_>) -> ! {
    panic!("precondition violated: {}", args)
}
