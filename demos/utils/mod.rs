//! Utility functions for the demos
//!
//! Host-side setup of the TAP device: link state and routing.

pub mod network;
