//! ICMP (Internet Control Message Protocol) implementation
//!
//! This module provides ICMP message parsing and the echo responder.
//! It decodes the echo and destination-unreachable bodies; every other
//! type is carried as opaque bytes.

use tracing::debug;

use crate::error::{NetError, Result};
use crate::network::ipv4::Ipv4Packet;
use crate::wire::{checksum, checksum_prefix, ensure_len, read_u16, write_u16};

/// Type, code and checksum
const ICMP_HEADER_LEN: usize = 4;
const CHECKSUM_OFFSET: usize = 2;

const LAYER: &str = "icmp";

/// ICMP message types
pub const ICMP_TYPE_ECHO_REPLY: u8 = 0x00;
pub const ICMP_TYPE_DST_UNREACHABLE: u8 = 0x03;
pub const ICMP_TYPE_SRC_QUENCH: u8 = 0x04;
pub const ICMP_TYPE_REDIRECT: u8 = 0x05;
pub const ICMP_TYPE_ECHO_REQUEST: u8 = 0x08;
pub const ICMP_TYPE_ROUTER_ADV: u8 = 0x09;
pub const ICMP_TYPE_ROUTER_SOL: u8 = 0x0a;
pub const ICMP_TYPE_TIME_EXCEEDED: u8 = 0x0b;
pub const ICMP_TYPE_PARAMETER_PROBLEM: u8 = 0x0c;

/// ICMP message: fixed header plus the type-specific body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpMessage {
    pub msg_type: u8,  // ICMP message type
    pub msg_code: u8,  // ICMP message code
    pub checksum: u16, // covers header and body
    pub body: Vec<u8>,
}

impl IcmpMessage {
    /// Parse ICMP message from byte slice
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure_len(data, ICMP_HEADER_LEN, LAYER)?;

        Ok(IcmpMessage {
            msg_type: data[0],
            msg_code: data[1],
            checksum: read_u16(data, CHECKSUM_OFFSET, LAYER)?,
            body: data[ICMP_HEADER_LEN..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ICMP_HEADER_LEN + self.body.len());
        bytes.push(self.msg_type);
        bytes.push(self.msg_code);
        write_u16(&mut bytes, self.checksum);
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Check if this is an Echo Request message
    pub fn is_echo_request(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REQUEST
    }

    /// Check if this is an Echo Reply message
    pub fn is_echo_reply(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REPLY
    }

    pub fn echo(&self) -> Result<EchoBody> {
        EchoBody::from_bytes(&self.body)
    }

    pub fn dst_unreachable(&self) -> Result<DstUnreachableBody> {
        DstUnreachableBody::from_bytes(&self.body)
    }

    pub fn update_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = checksum(&self.to_bytes());
    }
}

/// Echo Request/Reply body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoBody {
    pub identifier: u16,
    pub sequence: u16,
    pub data: Vec<u8>,
}

impl EchoBody {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(EchoBody {
            identifier: read_u16(data, 0, LAYER)?,
            sequence: read_u16(data, 2, LAYER)?,
            data: data[4..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.data.len());
        write_u16(&mut bytes, self.identifier);
        write_u16(&mut bytes, self.sequence);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

/// Destination Unreachable body (RFC 792, with the RFC 4884 length byte)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstUnreachableBody {
    pub unused: u8,
    pub length: u8,
    pub variable: u16,
    pub data: Vec<u8>,
}

impl DstUnreachableBody {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure_len(data, 4, LAYER)?;
        Ok(DstUnreachableBody {
            unused: data[0],
            length: data[1],
            variable: read_u16(data, 2, LAYER)?,
            data: data[4..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.data.len());
        bytes.push(self.unused);
        bytes.push(self.length);
        write_u16(&mut bytes, self.variable);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

/// Answer an ICMP datagram.
///
/// Returns the encoded Echo Reply to use as the new IP payload, `None` for
/// any other ICMP type. The checksum is verified over the length the IP
/// header assigns to the message.
pub fn handle_incoming(packet: &Ipv4Packet) -> Result<Option<Vec<u8>>> {
    let icmp_len = packet.header.payload_len();
    let computed = checksum_prefix(&packet.payload, icmp_len, LAYER)?;
    if computed != 0 {
        return Err(NetError::ChecksumMismatch {
            layer: LAYER,
            computed,
        });
    }

    let request = IcmpMessage::from_bytes(&packet.payload[..icmp_len])?;
    match request.msg_type {
        ICMP_TYPE_ECHO_REQUEST => {
            let mut reply = request;
            reply.msg_type = ICMP_TYPE_ECHO_REPLY;
            reply.update_checksum();
            debug!(src = %packet.header.src_addr, len = icmp_len, "answering ICMP echo request");
            Ok(Some(reply.to_bytes()))
        }
        other => {
            debug!(msg_type = other, code = request.msg_code, "ignoring ICMP message");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ipv4::{protocol, Ipv4Header, IPV4_VERSION};
    use std::net::Ipv4Addr;

    fn echo_request(identifier: u16, sequence: u16, data: &[u8]) -> IcmpMessage {
        let mut msg = IcmpMessage {
            msg_type: ICMP_TYPE_ECHO_REQUEST,
            msg_code: 0,
            checksum: 0,
            body: EchoBody {
                identifier,
                sequence,
                data: data.to_vec(),
            }
            .to_bytes(),
        };
        msg.update_checksum();
        msg
    }

    fn carried(payload: Vec<u8>) -> Ipv4Packet {
        let mut header = Ipv4Header {
            version: IPV4_VERSION,
            ihl: 5,
            tos: 0,
            total_len: (20 + payload.len()) as u16,
            id: 1,
            flags: 0,
            fragment_offset: 0,
            ttl: 64,
            protocol: protocol::ICMP,
            checksum: 0,
            src_addr: Ipv4Addr::new(10, 0, 0, 1),
            dst_addr: Ipv4Addr::new(10, 0, 0, 4),
            options: Vec::new(),
        };
        header.update_checksum();
        Ipv4Packet { header, payload }
    }

    #[test]
    fn test_echo_request_gets_reply() {
        let request = echo_request(0x1234, 1, b"ping");
        let reply_bytes = handle_incoming(&carried(request.to_bytes()))
            .unwrap()
            .expect("echo request must be answered");

        assert_eq!(reply_bytes[0], 0x00);
        assert_eq!(checksum(&reply_bytes), 0);

        let reply = IcmpMessage::from_bytes(&reply_bytes).unwrap();
        assert!(reply.is_echo_reply());
        assert_eq!(reply.msg_code, 0);
        let echo = reply.echo().unwrap();
        assert_eq!(echo.identifier, 0x1234);
        assert_eq!(echo.sequence, 1);
        assert_eq!(echo.data, b"ping");
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let mut bytes = echo_request(1, 1, b"ping").to_bytes();
        bytes[5] ^= 0xff;
        assert!(matches!(
            handle_incoming(&carried(bytes)),
            Err(NetError::ChecksumMismatch { layer: "icmp", .. })
        ));
    }

    #[test]
    fn test_other_types_are_not_answered() {
        let mut unreachable = IcmpMessage {
            msg_type: ICMP_TYPE_DST_UNREACHABLE,
            msg_code: 3,
            checksum: 0,
            body: DstUnreachableBody {
                unused: 0,
                length: 0,
                variable: 0,
                data: vec![0x45; 28],
            }
            .to_bytes(),
        };
        unreachable.update_checksum();
        assert!(handle_incoming(&carried(unreachable.to_bytes()))
            .unwrap()
            .is_none());

        let mut reply = echo_request(1, 2, b"pong");
        reply.msg_type = ICMP_TYPE_ECHO_REPLY;
        reply.update_checksum();
        assert!(handle_incoming(&carried(reply.to_bytes())).unwrap().is_none());
    }

    #[test]
    fn test_truncated_message() {
        let packet = carried(vec![ICMP_TYPE_ECHO_REQUEST, 0]);
        // two bytes fold to a nonzero checksum before parsing is reached
        assert!(handle_incoming(&packet).is_err());

        assert!(matches!(
            IcmpMessage::from_bytes(&[8, 0, 0]),
            Err(NetError::TruncatedHeader { needed: 4, .. })
        ));
        assert!(EchoBody::from_bytes(&[0, 1, 0]).is_err());
    }

    #[test]
    fn test_round_trip() {
        for data in [&b""[..], &b"ping"[..], &b"odd-len"[..]] {
            let echo = EchoBody {
                identifier: 0xbeef,
                sequence: 7,
                data: data.to_vec(),
            };
            assert_eq!(EchoBody::from_bytes(&echo.to_bytes()).unwrap(), echo);

            let msg = echo_request(echo.identifier, echo.sequence, data);
            assert_eq!(IcmpMessage::from_bytes(&msg.to_bytes()).unwrap(), msg);
        }

        // body with no echo fields at all
        let bare = IcmpMessage {
            msg_type: ICMP_TYPE_SRC_QUENCH,
            msg_code: 0,
            checksum: 0xffff,
            body: Vec::new(),
        };
        assert_eq!(IcmpMessage::from_bytes(&bare.to_bytes()).unwrap(), bare);
    }

    #[test]
    fn test_odd_length_echo_reply_checksum() {
        // 4 header + 4 echo fields + 3 data bytes
        let request = echo_request(0x0102, 3, b"abc");
        assert_eq!(request.to_bytes().len(), 11);

        let reply = handle_incoming(&carried(request.to_bytes()))
            .unwrap()
            .expect("echo request must be answered");
        assert_eq!(reply.len(), 11);
        assert_eq!(checksum(&reply), 0);
        assert_eq!(IcmpMessage::from_bytes(&reply).unwrap().echo().unwrap().data, b"abc");
    }

    #[test]
    fn test_dst_unreachable_body_round_trip() {
        let body = DstUnreachableBody {
            unused: 0,
            length: 7,
            variable: 1500,
            data: vec![1, 2, 3],
        };
        assert_eq!(DstUnreachableBody::from_bytes(&body.to_bytes()).unwrap(), body);
    }
}
