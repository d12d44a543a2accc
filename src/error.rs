//! Error types for the protocol stack

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Result type alias using the stack's error
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors produced while decoding, validating or answering a frame.
///
/// Everything except [`NetError::Transmit`] and [`NetError::Receive`] is a
/// per-packet outcome: the frame is dropped and the loop carries on.
#[derive(Debug, Error)]
pub enum NetError {
    /// Buffer is shorter than the region that must be read
    #[error("{layer}: truncated header, need {needed} bytes, have {available}")]
    TruncatedHeader {
        layer: &'static str,
        needed: usize,
        available: usize,
    },

    /// A field carries a value this stack does not speak
    #[error("{layer}: unsupported {field} {value:#06x}")]
    UnsupportedField {
        layer: &'static str,
        field: &'static str,
        value: u32,
    },

    /// Header is structurally invalid
    #[error("{layer}: malformed header: {reason}")]
    Malformed {
        layer: &'static str,
        reason: &'static str,
    },

    /// Checksum did not fold to zero
    #[error("{layer}: checksum mismatch (computed {computed:#06x})")]
    ChecksumMismatch { layer: &'static str, computed: u16 },

    /// ARP entry exists with a different hardware type
    #[error("ARP cache conflict for {ip}")]
    CacheConflict { ip: Ipv4Addr },

    /// Device identity could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Writing a frame to the channel failed
    #[error("transmit failed: {0}")]
    Transmit(#[source] io::Error),

    /// Reading a frame from the channel failed
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}

impl NetError {
    /// Whether the error should terminate the processing loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NetError::Transmit(_) | NetError::Receive(_))
    }

    pub(crate) fn truncated(layer: &'static str, needed: usize, available: usize) -> Self {
        NetError::TruncatedHeader {
            layer,
            needed,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_io_errors_are_fatal() {
        let err = NetError::Transmit(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(err.is_fatal());
        let err = NetError::Receive(io::Error::new(io::ErrorKind::Other, "gone"));
        assert!(err.is_fatal());

        assert!(!NetError::truncated("ipv4", 20, 3).is_fatal());
        assert!(!NetError::ChecksumMismatch {
            layer: "icmp",
            computed: 1
        }
        .is_fatal());
        assert!(!NetError::CacheConflict {
            ip: Ipv4Addr::new(10, 0, 0, 1)
        }
        .is_fatal());
    }

    #[test]
    fn test_display_names_the_layer() {
        let err = NetError::truncated("ethernet", 14, 6);
        assert_eq!(
            err.to_string(),
            "ethernet: truncated header, need 14 bytes, have 6"
        );
    }
}
