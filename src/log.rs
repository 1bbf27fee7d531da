//! Logging facade
//!
//! The macros forward to `defmt` when the `defmt` feature is enabled. Without
//! it they expand to nothing, which keeps host test binaries free of the
//! defmt linker symbols.

#[cfg(feature = "defmt")]
mod backend {
    macro_rules! __trace {
        ($($arg:tt)*) => {{
            ::defmt::trace!($($arg)*);
        }};
    }

    macro_rules! __debug {
        ($($arg:tt)*) => {{
            ::defmt::debug!($($arg)*);
        }};
    }

    macro_rules! __info {
        ($($arg:tt)*) => {{
            ::defmt::info!($($arg)*);
        }};
    }

    macro_rules! __warn {
        ($($arg:tt)*) => {{
            ::defmt::warn!($($arg)*);
        }};
    }

    macro_rules! __error {
        ($($arg:tt)*) => {{
            ::defmt::error!($($arg)*);
        }};
    }

    pub(crate) use __debug as debug;
    pub(crate) use __error as error;
    pub(crate) use __info as info;
    pub(crate) use __trace as trace;
    pub(crate) use __warn as warn;
}

#[cfg(not(feature = "defmt"))]
mod backend {
    macro_rules! __stub {
        ($($arg:tt)*) => {{
            let _ = ($($arg)*); // Do nothing
        }};
    }

    pub(crate) use __stub as debug;
    pub(crate) use __stub as error;
    pub(crate) use __stub as info;
    pub(crate) use __stub as trace;
    pub(crate) use __stub as warn;
}

#[allow(unused_imports)]
pub(crate) use backend::{debug, error, info, trace, warn};
