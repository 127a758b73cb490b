//! Syscall handling for traced units, split by concern. Everything here
//! is an `impl TracedUnit` block or a free helper it uses.

pub mod control_surface;
pub mod divergence;
pub mod flag_control;
pub mod identity;
pub mod protocol;
