//! Adapters implementing the domain ports.

pub mod in_memory;
pub mod webhook;
