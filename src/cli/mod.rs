//! Host-side CLI front-end: argument parsing and leveled diagnostics.
//!
//! This module (and the `bootcodec` binary built on top of it) never runs in
//! the boot environment; it exists to drive and exercise the core decoders
//! from an ordinary host OS.

pub mod args;
pub mod constants;
