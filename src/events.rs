//! Optional `tracing` hooks. Without the `tracing` feature the macros
//! expand to nothing and their arguments are not evaluated.

macro_rules! debug_event {
    ($($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)+);
    };
}

macro_rules! trace_event {
    ($($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)+);
    };
}

pub(crate) use {debug_event, trace_event};
