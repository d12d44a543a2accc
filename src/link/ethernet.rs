//! Ethernet II framing
//!
//! A frame is a 14-byte header (destination, source, ethertype) followed by
//! the payload. No minimum-size padding is added on encode and no length
//! check is applied to the payload on decode; each upper layer validates
//! its own view.

use crate::error::Result;
use crate::link::MacAddr;
use crate::wire::{ensure_len, read_array, read_u16, write_u16};

/// Ethernet header size in bytes
pub const ETH_HEADER_LEN: usize = 14;

const LAYER: &str = "ethernet";

/// EtherType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Arp,
    Unknown(u16),
}

impl EtherType {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0x0800 => Self::Ipv4,
            0x0806 => Self::Arp,
            other => Self::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            Self::Ipv4 => 0x0800,
            Self::Arp => 0x0806,
            Self::Unknown(v) => v,
        }
    }
}

/// A decoded Ethernet frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ethertype: EtherType,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Parse a frame. Fails only when the fixed header is incomplete.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure_len(data, ETH_HEADER_LEN, LAYER)?;

        Ok(EthernetFrame {
            dst_mac: MacAddr(read_array(data, 0, LAYER)?),
            src_mac: MacAddr(read_array(data, 6, LAYER)?),
            ethertype: EtherType::from_raw(read_u16(data, 12, LAYER)?),
            payload: data[ETH_HEADER_LEN..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&self.dst_mac.0);
        bytes.extend_from_slice(&self.src_mac.0);
        write_u16(&mut bytes, self.ethertype.to_raw());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Encoded length: header plus payload
    pub fn encoded_len(&self) -> usize {
        ETH_HEADER_LEN + self.payload.len()
    }
}
