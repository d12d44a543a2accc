//! Network layer protocols implementation
//!
//! This module contains implementations for network layer protocols:
//! - IPv4: Internet Protocol version 4
//! - ICMP: Internet Control Message Protocol

pub mod icmp;
pub mod ipv4;

// Re-export commonly used items
pub use crate::wire::checksum;
pub use icmp::{IcmpMessage, ICMP_TYPE_ECHO_REPLY, ICMP_TYPE_ECHO_REQUEST};
pub use ipv4::{flags, protocol, Ipv4Header, Ipv4Packet};
