//! Link layer protocols implementation
//!
//! This module contains the layer-2 pieces of the stack:
//! - Ethernet: frame decoding and encoding
//! - ARP: address resolution cache and responder

pub mod arp;
pub mod ethernet;

use std::fmt;
use std::str::FromStr;

use crate::error::NetError;

pub use arp::{ArpCache, ArpCacheEntry, ArpOperation, ArpPacket, ArpResolver, ArpState, CacheUpdate};
pub use ethernet::{EtherType, EthernetFrame, ETH_HEADER_LEN};

/// A 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for MacAddr {
    type Err = NetError;

    /// Accepts `aa:bb:cc:dd:ee:ff` or `aa-bb-cc-dd-ee-ff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NetError::InvalidAddress(format!("bad MAC address {:?}", s));

        let mut octets = [0u8; 6];
        let mut parts = s.split(|c: char| c == ':' || c == '-');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddr(octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddr = "00:0c:29:6D:50:25".parse().unwrap();
        assert_eq!(mac.octets(), [0x00, 0x0c, 0x29, 0x6d, 0x50, 0x25]);
        assert_eq!(mac.to_string(), "00:0c:29:6d:50:25");

        let dashed: MacAddr = "00-0c-29-6d-50-25".parse().unwrap();
        assert_eq!(dashed, mac);
    }

    #[test]
    fn test_mac_parse_rejects_garbage() {
        for bad in [
            "",
            "00:0c:29:6d:50",
            "00:0c:29:6d:50:25:11",
            "0:0c:29:6d:50:25",
            "zz:0c:29:6d:50:25",
        ] {
            assert!(bad.parse::<MacAddr>().is_err(), "{:?} should not parse", bad);
        }
    }
}
