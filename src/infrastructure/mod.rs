//! Adapters for the ports in `domain::ports`.

pub mod console;
pub mod in_memory;
