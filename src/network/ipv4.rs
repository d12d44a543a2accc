//! IPv4 protocol implementation
//!
//! This module provides IPv4 packet parsing, validation, and the
//! turnaround used to answer a datagram.
//!
//! Features:
//! - IPv4 header parsing and serialization, options kept opaque
//! - Checksum calculation and validation
//! - Header validation (version, header length, total length, TTL)
//! - Address swap with checksum recompute for replies

use std::net::Ipv4Addr;

use crate::error::{NetError, Result};
use crate::wire::{checksum, ensure_len, read_array, read_u16, write_u16};

/// Fixed part of the header, without options
pub const IPV4_HEADER_LEN: usize = 20;
pub const IPV4_VERSION: u8 = 4;
const MIN_IHL: u8 = 5;
const MAX_IHL: u8 = 15;

const VERSION_SHIFT: u8 = 4;
const IHL_MASK: u8 = 0x0F;
const FLAGS_SHIFT: u16 = 13;
const FLAGS_MASK: u8 = 0x07;
const FRAGMENT_OFFSET_MASK: u16 = 0x1FFF;
const CHECKSUM_OFFSET: usize = 10;

const LAYER: &str = "ipv4";

/// IPv4 protocol constants
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
}

/// IPv4 flag bits, as the 3-bit field above the fragment offset
pub mod flags {
    pub const DONT_FRAGMENT: u8 = 0b010;
    pub const MORE_FRAGMENTS: u8 = 0b001;
}

/// IPv4 packet header structure
///
/// Represents the RFC 791 header. Any options between byte 20 and
/// `ihl * 4` are carried as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub ihl: u8, // Internet Header Length, in 32-bit words
    pub tos: u8, // Type of Service
    pub total_len: u16,
    pub id: u16,
    pub flags: u8,            // 3 bits
    pub fragment_offset: u16, // 13 bits
    pub ttl: u8,              // Time to Live
    pub protocol: u8,         // Next Protocol
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub options: Vec<u8>,
}

impl Ipv4Header {
    /// Parse IPv4 header from byte slice
    ///
    /// Only the layout is checked here; field values are judged by
    /// [`Ipv4Header::validate`]. A header length below five words is
    /// parsed as a bare 20-byte header so validation can report it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure_len(data, IPV4_HEADER_LEN, LAYER)?;

        let ihl = data[0] & IHL_MASK;
        let header_len = (ihl as usize * 4).max(IPV4_HEADER_LEN);
        ensure_len(data, header_len, LAYER)?;

        let flags_frag = read_u16(data, 6, LAYER)?;
        Ok(Ipv4Header {
            version: data[0] >> VERSION_SHIFT,
            ihl,
            tos: data[1],
            total_len: read_u16(data, 2, LAYER)?,
            id: read_u16(data, 4, LAYER)?,
            flags: (flags_frag >> FLAGS_SHIFT) as u8,
            fragment_offset: flags_frag & FRAGMENT_OFFSET_MASK,
            ttl: data[8],
            protocol: data[9],
            checksum: read_u16(data, CHECKSUM_OFFSET, LAYER)?,
            src_addr: Ipv4Addr::from(read_array::<4>(data, 12, LAYER)?),
            dst_addr: Ipv4Addr::from(read_array::<4>(data, 16, LAYER)?),
            options: data[IPV4_HEADER_LEN..header_len].to_vec(),
        })
    }

    /// Convert IPv4 header to bytes, options included
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(IPV4_HEADER_LEN + self.options.len());
        bytes.push((self.version << VERSION_SHIFT) | (self.ihl & IHL_MASK));
        bytes.push(self.tos);
        write_u16(&mut bytes, self.total_len);
        write_u16(&mut bytes, self.id);
        write_u16(
            &mut bytes,
            (((self.flags & FLAGS_MASK) as u16) << FLAGS_SHIFT)
                | (self.fragment_offset & FRAGMENT_OFFSET_MASK),
        );
        bytes.push(self.ttl);
        bytes.push(self.protocol);
        write_u16(&mut bytes, self.checksum);
        bytes.extend_from_slice(&self.src_addr.octets());
        bytes.extend_from_slice(&self.dst_addr.octets());
        bytes.extend_from_slice(&self.options);
        bytes
    }

    /// Get the header length in bytes
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    /// Length of the payload claimed by the header
    pub fn payload_len(&self) -> usize {
        (self.total_len as usize).saturating_sub(self.header_len())
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Zero the checksum field and recompute it over the encoded header.
    pub fn update_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = checksum(&self.to_bytes());
    }

    /// Validate IPv4 header structure
    ///
    /// Checks version, header length, total length, TTL and finally that
    /// the checksum over the header folds to zero.
    pub fn validate(&self) -> Result<()> {
        if self.version != IPV4_VERSION {
            return Err(NetError::UnsupportedField {
                layer: LAYER,
                field: "version",
                value: self.version as u32,
            });
        }

        if self.ihl < MIN_IHL {
            return Err(malformed("header length below 5 words"));
        }

        if (self.total_len as usize) < self.header_len() {
            return Err(malformed("total length shorter than header"));
        }

        if self.ttl == 0 {
            return Err(malformed("time to live reached 0"));
        }

        let computed = checksum(&self.to_bytes());
        if computed != 0 {
            return Err(NetError::ChecksumMismatch {
                layer: LAYER,
                computed,
            });
        }

        Ok(())
    }
}

fn malformed(reason: &'static str) -> NetError {
    NetError::Malformed {
        layer: LAYER,
        reason,
    }
}

/// An IPv4 datagram: header plus the payload bounded by `total_len`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// Parse a datagram from an Ethernet payload.
    ///
    /// Bytes past `total_len` (link-layer padding) are not part of the
    /// payload. A `total_len` beyond the buffer is a truncation.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = Ipv4Header::from_bytes(data)?;
        let start = IPV4_HEADER_LEN + header.options.len();
        let end = header.total_len as usize;
        ensure_len(data, end, LAYER)?;

        let payload = if end > start {
            data[start..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(Ipv4Packet { header, payload })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header.to_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Build the outgoing datagram answering this one.
    ///
    /// Source and destination are swapped, the payload is replaced, the
    /// total length follows the new payload and the checksum is recomputed.
    /// TTL is carried over untouched.
    pub fn turnaround(&self, payload: Vec<u8>) -> Ipv4Packet {
        let mut header = self.header.clone();
        std::mem::swap(&mut header.src_addr, &mut header.dst_addr);
        header.total_len = (header.header_len() + payload.len()) as u16;
        header.update_checksum();
        Ipv4Packet { header, payload }
    }
}
