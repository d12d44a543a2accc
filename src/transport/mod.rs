//! Transport layer protocols implementation
//!
//! This module contains implementations for transport layer protocols:
//! - TCP: Transmission Control Protocol (handshake responder only)

pub mod tcp;

// Re-export commonly used items
pub use tcp::{PseudoHeader, TcpHeader, TcpReplyPolicy, TcpResponder};
