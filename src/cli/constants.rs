//! Display-level global and the `displaylevel!` diagnostic macro.
//!
//! A small leveled-logging facility for the CLI: a global verbosity knob
//! plus a macro that only prints when the current level is high enough.

use std::sync::atomic::{AtomicU32, Ordering};

pub const AUTHOR: &str = "AsahiLinux";

/// 0 = no output; 1 = errors only; 2 = normal; 3 = verbose; 4 = trace.
pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Prints to stderr when the current display level is at least `$level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::constants::display_level() >= $level {
            eprint!($($arg)*);
        }
    };
}
