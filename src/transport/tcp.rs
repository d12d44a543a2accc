//! TCP (Transmission Control Protocol) implementation
//!
//! This module provides TCP segment parsing, the pseudo-header checksum,
//! and a stateless responder that answers a SYN with a SYN-ACK. There is
//! no connection state: no retransmission, windows or reassembly.

use std::net::Ipv4Addr;

use tracing::debug;

use crate::error::{NetError, Result};
use crate::network::ipv4::Ipv4Packet;
use crate::wire::{checksum, ensure_len, read_u16, read_u32, write_u16, write_u32};

/// Fixed header length; options are not modeled and stay in the payload
pub const TCP_HEADER_LEN: usize = 20;
const PSEUDO_HEADER_LEN: usize = 12;

const DATA_OFFSET_SHIFT: u8 = 4;
const RESERVED_MASK: u8 = 0x0F;

/// Sequence number placed in every SYN-ACK unless configured otherwise
pub const DEFAULT_INITIAL_SEQ: u32 = 1024;

const LAYER: &str = "tcp";

/// TCP flag bits (byte 13 of the header)
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
    pub const ECE: u8 = 0x40;
    pub const CWR: u8 = 0x80;
}

/// TCP segment: header plus everything after the fixed 20 bytes
///
/// Represents the RFC 793 header. Option bytes, if the data offset claims
/// any, are part of `payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_number: u32,
    pub ack_number: u32,
    pub data_offset: u8, // 4 bits, header length in 32-bit words
    pub reserved: u8,    // 4 bits
    pub flags: u8,
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_ptr: u16,
    pub payload: Vec<u8>,
}

impl TcpHeader {
    /// Parse TCP segment from byte slice
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure_len(data, TCP_HEADER_LEN, LAYER)?;

        Ok(TcpHeader {
            src_port: read_u16(data, 0, LAYER)?,
            dst_port: read_u16(data, 2, LAYER)?,
            seq_number: read_u32(data, 4, LAYER)?,
            ack_number: read_u32(data, 8, LAYER)?,
            data_offset: data[12] >> DATA_OFFSET_SHIFT,
            reserved: data[12] & RESERVED_MASK,
            flags: data[13],
            window_size: read_u16(data, 14, LAYER)?,
            checksum: read_u16(data, 16, LAYER)?,
            urgent_ptr: read_u16(data, 18, LAYER)?,
            payload: data[TCP_HEADER_LEN..].to_vec(),
        })
    }

    /// Convert TCP segment to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TCP_HEADER_LEN + self.payload.len());
        write_u16(&mut bytes, self.src_port);
        write_u16(&mut bytes, self.dst_port);
        write_u32(&mut bytes, self.seq_number);
        write_u32(&mut bytes, self.ack_number);
        bytes.push((self.data_offset << DATA_OFFSET_SHIFT) | (self.reserved & RESERVED_MASK));
        bytes.push(self.flags);
        write_u16(&mut bytes, self.window_size);
        write_u16(&mut bytes, self.checksum);
        write_u16(&mut bytes, self.urgent_ptr);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Check if SYN flag is set
    pub fn is_syn(&self) -> bool {
        self.has_flag(flags::SYN)
    }

    /// Check if ACK flag is set
    pub fn is_ack(&self) -> bool {
        self.has_flag(flags::ACK)
    }

    /// Check if FIN flag is set
    pub fn is_fin(&self) -> bool {
        self.has_flag(flags::FIN)
    }

    /// Check if RST flag is set
    pub fn is_rst(&self) -> bool {
        self.has_flag(flags::RST)
    }

    /// Get the data offset (header length) in bytes
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }

    /// Zero the checksum field and recompute it against `pseudo`.
    pub fn update_checksum(&mut self, pseudo: &PseudoHeader) {
        self.checksum = 0;
        self.checksum = pseudo.checksum(&self.to_bytes());
    }
}

/// IPv4 pseudo-header prepended for the TCP checksum, never transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoHeader {
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub protocol: u8,
    pub length: u16,
}

impl PseudoHeader {
    /// Pseudo-header describing the segment carried by `packet`.
    pub fn for_packet(packet: &Ipv4Packet) -> Self {
        PseudoHeader {
            src_addr: packet.header.src_addr,
            dst_addr: packet.header.dst_addr,
            protocol: packet.header.protocol,
            length: packet.header.payload_len() as u16,
        }
    }

    /// Same pseudo-header with the addresses exchanged.
    pub fn swapped(&self) -> Self {
        PseudoHeader {
            src_addr: self.dst_addr,
            dst_addr: self.src_addr,
            ..*self
        }
    }

    pub fn to_bytes(&self) -> [u8; PSEUDO_HEADER_LEN] {
        let mut bytes = [0u8; PSEUDO_HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.src_addr.octets());
        bytes[4..8].copy_from_slice(&self.dst_addr.octets());
        // bytes[8] stays zero
        bytes[9] = self.protocol;
        bytes[10..12].copy_from_slice(&self.length.to_be_bytes());
        bytes
    }

    /// Internet checksum over this pseudo-header followed by `segment`.
    pub fn checksum(&self, segment: &[u8]) -> u16 {
        let mut data = Vec::with_capacity(PSEUDO_HEADER_LEN + segment.len());
        data.extend_from_slice(&self.to_bytes());
        data.extend_from_slice(segment);
        checksum(&data)
    }
}

/// Which inbound segments get a turnaround
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TcpReplyPolicy {
    /// Only a segment with SYN set is answered; everything else is dropped
    #[default]
    SynOnly,
    /// Every segment is echoed back with ports swapped, SYNs get a SYN-ACK
    EchoAll,
}

/// Stateless TCP handshake responder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpResponder {
    pub initial_seq: u32,
    pub policy: TcpReplyPolicy,
}

impl Default for TcpResponder {
    fn default() -> Self {
        TcpResponder {
            initial_seq: DEFAULT_INITIAL_SEQ,
            policy: TcpReplyPolicy::default(),
        }
    }
}

impl TcpResponder {
    pub fn new(initial_seq: u32, policy: TcpReplyPolicy) -> Self {
        TcpResponder {
            initial_seq,
            policy,
        }
    }

    /// Answer a TCP segment, returning the new IP payload.
    ///
    /// The inbound checksum is verified against the pseudo-header of the
    /// inbound datagram. The reply's checksum uses the same pseudo-header
    /// with the addresses exchanged, matching the IPv4 turnaround.
    pub fn handle_incoming(&self, packet: &Ipv4Packet) -> Result<Option<Vec<u8>>> {
        let pseudo = PseudoHeader::for_packet(packet);
        let segment_len = pseudo.length as usize;
        ensure_len(&packet.payload, segment_len, LAYER)?;
        let segment = &packet.payload[..segment_len];

        let segment_header = TcpHeader::from_bytes(segment)?;
        let computed = pseudo.checksum(segment);
        if computed != 0 {
            return Err(NetError::ChecksumMismatch {
                layer: LAYER,
                computed,
            });
        }

        if !segment_header.is_syn() && self.policy == TcpReplyPolicy::SynOnly {
            debug!(
                src_port = segment_header.src_port,
                dst_port = segment_header.dst_port,
                flags = segment_header.flags,
                "dropping non-SYN TCP segment"
            );
            return Ok(None);
        }

        let mut reply = segment_header;
        std::mem::swap(&mut reply.src_port, &mut reply.dst_port);

        if reply.is_syn() {
            debug!(
                src = %packet.header.src_addr,
                src_port = reply.dst_port,
                seq = reply.seq_number,
                "answering TCP SYN"
            );
            reply.flags |= flags::ACK;
            reply.ack_number = reply.seq_number.wrapping_add(1);
            reply.seq_number = self.initial_seq;
        }

        reply.update_checksum(&pseudo.swapped());
        Ok(Some(reply.to_bytes()))
    }
}
