//! ARP (Address Resolution Protocol) implementation
//!
//! Handles ARP for IPv4 over Ethernet (RFC 826): packet parsing, the
//! IPv4 -> MAC translation table, and replies to requests.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use crate::error::{NetError, Result};
use crate::iface::DeviceIdentity;
use crate::link::{EtherType, EthernetFrame, MacAddr};
use crate::wire::{ensure_len, hexdump, read_array, read_u16, write_u16};

/// Fixed ARP header: hardware type, protocol type, sizes and opcode
pub const ARP_HEADER_LEN: usize = 8;
/// Sender/target MAC and IPv4 pairs
pub const ARP_IPV4_BODY_LEN: usize = 20;
pub const ARP_PACKET_LEN: usize = ARP_HEADER_LEN + ARP_IPV4_BODY_LEN;

pub const HW_TYPE_ETHERNET: u16 = 0x0001;
pub const PROTO_TYPE_IPV4: u16 = 0x0800;
const HW_SIZE_ETHERNET: u8 = 6;
const PROTO_SIZE_IPV4: u8 = 4;

const LAYER: &str = "arp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    Unknown(u16),
}

impl ArpOperation {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            1 => Self::Request,
            2 => Self::Reply,
            other => Self::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            Self::Request => 1,
            Self::Reply => 2,
            Self::Unknown(v) => v,
        }
    }
}

/// An ARP packet carrying IPv4-over-Ethernet addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    pub hw_type: u16,
    pub proto_type: u16,
    pub hw_size: u8,
    pub proto_size: u8,
    pub operation: ArpOperation,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    /// Parse an ARP packet from an Ethernet payload.
    ///
    /// Anything other than Ethernet hardware addresses and IPv4 protocol
    /// addresses is rejected as unsupported.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure_len(data, ARP_HEADER_LEN, LAYER)?;

        let hw_type = read_u16(data, 0, LAYER)?;
        if hw_type != HW_TYPE_ETHERNET {
            return Err(unsupported("hardware type", hw_type as u32));
        }
        let proto_type = read_u16(data, 2, LAYER)?;
        if proto_type != PROTO_TYPE_IPV4 {
            return Err(unsupported("protocol type", proto_type as u32));
        }
        let (hw_size, proto_size) = (data[4], data[5]);
        if hw_size != HW_SIZE_ETHERNET {
            return Err(unsupported("hardware size", hw_size as u32));
        }
        if proto_size != PROTO_SIZE_IPV4 {
            return Err(unsupported("protocol size", proto_size as u32));
        }

        ensure_len(data, ARP_PACKET_LEN, LAYER)?;
        Ok(ArpPacket {
            hw_type,
            proto_type,
            hw_size,
            proto_size,
            operation: ArpOperation::from_raw(read_u16(data, 6, LAYER)?),
            sender_mac: MacAddr(read_array(data, 8, LAYER)?),
            sender_ip: Ipv4Addr::from(read_array::<4>(data, 14, LAYER)?),
            target_mac: MacAddr(read_array(data, 18, LAYER)?),
            target_ip: Ipv4Addr::from(read_array::<4>(data, 24, LAYER)?),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ARP_PACKET_LEN);
        write_u16(&mut bytes, self.hw_type);
        write_u16(&mut bytes, self.proto_type);
        bytes.push(self.hw_size);
        bytes.push(self.proto_size);
        write_u16(&mut bytes, self.operation.to_raw());
        bytes.extend_from_slice(&self.sender_mac.0);
        bytes.extend_from_slice(&self.sender_ip.octets());
        bytes.extend_from_slice(&self.target_mac.0);
        bytes.extend_from_slice(&self.target_ip.octets());
        bytes
    }

    /// Build the reply to this request on behalf of `device`.
    pub fn reply_from(&self, device: &DeviceIdentity) -> ArpPacket {
        ArpPacket {
            operation: ArpOperation::Reply,
            sender_mac: device.mac(),
            sender_ip: device.ip(),
            target_mac: self.sender_mac,
            target_ip: self.sender_ip,
            ..self.clone()
        }
    }
}

fn unsupported(field: &'static str, value: u32) -> NetError {
    NetError::UnsupportedField {
        layer: LAYER,
        field,
        value,
    }
}

/// Resolution state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpState {
    Free,
    Waiting,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpCacheEntry {
    pub hw_type: u16,
    pub mac: MacAddr,
    pub state: ArpState,
}

/// What `ArpCache::learn` did with an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// Existing entry had its MAC replaced
    Merged,
    /// New entry was created
    Inserted,
}

/// IPv4 -> hardware address translation table
///
/// Entries are never evicted. The check-then-act in [`ArpCache::learn`]
/// runs under one lock so concurrent learners see a consistent table.
#[derive(Debug, Default)]
pub struct ArpCache {
    entries: Mutex<HashMap<Ipv4Addr, ArpCacheEntry>>,
}

impl ArpCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge or insert the sender of an ARP packet.
    ///
    /// An existing entry with the same hardware type gets the new MAC. An
    /// existing entry with a different hardware type is left alone and
    /// `CacheConflict` is returned.
    pub fn learn(&self, hw_type: u16, ip: Ipv4Addr, mac: MacAddr) -> Result<CacheUpdate> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.entry(ip) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.hw_type != hw_type {
                    return Err(NetError::CacheConflict { ip });
                }
                entry.mac = mac;
                Ok(CacheUpdate::Merged)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ArpCacheEntry {
                    hw_type,
                    mac,
                    state: ArpState::Resolved,
                });
                Ok(CacheUpdate::Inserted)
            }
        }
    }

    pub fn entry(&self, ip: Ipv4Addr) -> Option<ArpCacheEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&ip).copied()
    }

    /// Resolved hardware address for `ip`, if known.
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entry(ip)
            .filter(|entry| entry.state == ArpState::Resolved)
            .map(|entry| entry.mac)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Learns from incoming ARP traffic and answers requests
#[derive(Debug, Clone)]
pub struct ArpResolver {
    cache: Arc<ArpCache>,
}

impl ArpResolver {
    pub fn new(cache: Arc<ArpCache>) -> Self {
        ArpResolver { cache }
    }

    pub fn cache(&self) -> &Arc<ArpCache> {
        &self.cache
    }

    /// Process an ARP frame, returning the reply frame for a request.
    pub fn handle_incoming(
        &self,
        frame: &EthernetFrame,
        device: &DeviceIdentity,
    ) -> Result<Option<EthernetFrame>> {
        trace!("ARP frame in:\n{}", hexdump(&frame.payload));
        let packet = ArpPacket::from_bytes(&frame.payload)?;

        let update = self
            .cache
            .learn(packet.hw_type, packet.sender_ip, packet.sender_mac)?;
        debug!(
            ip = %packet.sender_ip,
            mac = %packet.sender_mac,
            ?update,
            "ARP translation table updated"
        );

        match packet.operation {
            ArpOperation::Request => {
                let reply = packet.reply_from(device);
                debug!(
                    ip = %reply.target_ip,
                    src = %reply.sender_mac,
                    dst = %reply.target_mac,
                    "replying to ARP request"
                );
                Ok(Some(device.frame_to(
                    frame.src_mac,
                    EtherType::Arp,
                    reply.to_bytes(),
                )))
            }
            ArpOperation::Reply => {
                debug!(ip = %packet.sender_ip, "received ARP reply");
                Ok(None)
            }
            ArpOperation::Unknown(op) => {
                debug!(op, "ignoring unsupported ARP operation");
                Ok(None)
            }
        }
    }
}
