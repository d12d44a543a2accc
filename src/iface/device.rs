//! Local station identity and the transmit path

use std::net::Ipv4Addr;

use tracing::trace;

use crate::error::{NetError, Result};
use crate::iface::FrameChannel;
use crate::link::{EtherType, EthernetFrame, MacAddr};
use crate::wire::hexdump;

/// The IPv4 and hardware address this stack answers as
///
/// Fixed for the life of the interface; every outgoing frame is stamped
/// with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    ip: Ipv4Addr,
    mac: MacAddr,
}

impl DeviceIdentity {
    pub fn new(ip: Ipv4Addr, mac: MacAddr) -> Self {
        DeviceIdentity { ip, mac }
    }

    /// Parse an identity from `10.0.0.4` / `00:0c:29:6d:50:25` style strings.
    pub fn parse(ip: &str, mac: &str) -> Result<Self> {
        let ip = ip
            .parse::<Ipv4Addr>()
            .map_err(|e| NetError::InvalidAddress(format!("bad IPv4 address {:?}: {}", ip, e)))?;
        Ok(DeviceIdentity::new(ip, mac.parse()?))
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Finalize an outgoing frame from this device to `dst`.
    pub fn frame_to(&self, dst: MacAddr, ethertype: EtherType, payload: Vec<u8>) -> EthernetFrame {
        EthernetFrame {
            dst_mac: dst,
            src_mac: self.mac,
            ethertype,
            payload,
        }
    }

    /// Encode `frame` and write it to the channel.
    pub fn transmit<C: FrameChannel + ?Sized>(
        &self,
        channel: &C,
        frame: &EthernetFrame,
    ) -> Result<usize> {
        let bytes = frame.to_bytes();
        trace!("transmit frame:\n{}", hexdump(&bytes));
        channel.send(&bytes).map_err(NetError::Transmit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iface::channel::memory::MemoryChannel;

    #[test]
    fn test_parse_identity() {
        let dev = DeviceIdentity::parse("10.0.0.4", "00:0c:29:6d:50:25").unwrap();
        assert_eq!(dev.ip(), Ipv4Addr::new(10, 0, 0, 4));
        assert_eq!(dev.mac(), MacAddr([0x00, 0x0c, 0x29, 0x6d, 0x50, 0x25]));
    }

    #[test]
    fn test_parse_rejects_bad_strings() {
        assert!(matches!(
            DeviceIdentity::parse("10.0.0", "00:0c:29:6d:50:25"),
            Err(NetError::InvalidAddress(_))
        ));
        assert!(matches!(
            DeviceIdentity::parse("10.0.0.4", "00:0c:29"),
            Err(NetError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_frame_to_stamps_source() {
        let dev = DeviceIdentity::parse("10.0.0.4", "02:00:00:00:00:04").unwrap();
        let peer = MacAddr([0x02, 0, 0, 0, 0, 0x01]);
        let frame = dev.frame_to(peer, EtherType::Ipv4, vec![0x45]);
        assert_eq!(frame.dst_mac, peer);
        assert_eq!(frame.src_mac, dev.mac());
        assert_eq!(frame.ethertype, EtherType::Ipv4);
    }

    #[test]
    fn test_transmit_writes_encoded_frame() {
        let dev = DeviceIdentity::parse("10.0.0.4", "02:00:00:00:00:04").unwrap();
        let channel = MemoryChannel::new();
        let frame = dev.frame_to(MacAddr::BROADCAST, EtherType::Arp, vec![1, 2]);

        assert_eq!(dev.transmit(&channel, &frame).unwrap(), 16);
        assert_eq!(channel.sent(), vec![frame.to_bytes()]);
    }

    #[test]
    fn test_transmit_failure_is_fatal() {
        let dev = DeviceIdentity::parse("10.0.0.4", "02:00:00:00:00:04").unwrap();
        let channel = MemoryChannel::failing_send();
        let frame = dev.frame_to(MacAddr::BROADCAST, EtherType::Arp, Vec::new());

        let err = dev.transmit(&channel, &frame).unwrap_err();
        assert!(err.is_fatal());
    }
}
