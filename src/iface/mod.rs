//! Network interface abstraction layer
//!
//! This module ties the protocol layers to a device:
//! - Device identity and the transmit path
//! - The frame channel the interface reads from and writes to
//! - Frame dispatch and IPv4 routing to the responders

pub mod channel;
pub mod device;
pub mod interface;
mod ipv4;

// Re-export commonly used items
pub use channel::FrameChannel;
pub use device::DeviceIdentity;
pub use interface::{FrameOutcome, InterfaceStats, NetworkInterface, MAX_FRAME_LEN};
