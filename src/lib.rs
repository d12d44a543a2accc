//! A minimal user-space TCP/IP stack over a TAP device
//!
//! This library terminates Ethernet traffic for a single IPv4/MAC identity:
//! - Ethernet decoding and ARP address resolution
//! - IPv4 header validation and reply turnaround
//! - ICMP echo request/reply handling
//! - A stateless TCP SYN -> SYN-ACK responder
//!
//! Malformed input is dropped and logged; only a failing device channel
//! stops the interface loop.

pub mod config;
pub mod error;
pub mod iface;
pub mod link;
pub mod network;
pub mod transport;
pub mod wire;

// Re-export commonly used types
pub use config::StackConfig;
pub use error::{NetError, Result};
pub use iface::{DeviceIdentity, FrameChannel, NetworkInterface};
pub use link::{ArpCache, EthernetFrame, MacAddr};
pub use network::icmp::{IcmpMessage, ICMP_TYPE_ECHO_REPLY, ICMP_TYPE_ECHO_REQUEST};
pub use network::ipv4::{Ipv4Header, Ipv4Packet};
pub use transport::tcp::{TcpHeader, TcpReplyPolicy, TcpResponder};
