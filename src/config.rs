//! Stack configuration
//!
//! Addresses are kept as strings until [`StackConfig::device`] parses them,
//! so the values can come straight from command-line flags or environment.

use crate::error::Result;
use crate::iface::DeviceIdentity;
use crate::transport::tcp::DEFAULT_INITIAL_SEQ;
use crate::transport::TcpResponder;

pub use crate::transport::TcpReplyPolicy;

pub const DEFAULT_DEVICE_IP: &str = "10.0.0.4";
pub const DEFAULT_DEVICE_MAC: &str = "00:0c:29:6d:50:25";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// IPv4 address the stack answers as
    pub ip: String,
    /// Hardware address the stack answers as
    pub mac: String,
    /// Sequence number placed in SYN-ACKs
    pub tcp_initial_seq: u32,
    pub tcp_policy: TcpReplyPolicy,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            ip: DEFAULT_DEVICE_IP.to_string(),
            mac: DEFAULT_DEVICE_MAC.to_string(),
            tcp_initial_seq: DEFAULT_INITIAL_SEQ,
            tcp_policy: TcpReplyPolicy::default(),
        }
    }
}

impl StackConfig {
    pub fn device(&self) -> Result<DeviceIdentity> {
        DeviceIdentity::parse(&self.ip, &self.mac)
    }

    pub fn tcp_responder(&self) -> TcpResponder {
        TcpResponder::new(self.tcp_initial_seq, self.tcp_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;
    use std::net::Ipv4Addr;

    #[test]
    fn test_default_config_parses() {
        let config = StackConfig::default();
        let device = config.device().unwrap();
        assert_eq!(device.ip(), Ipv4Addr::new(10, 0, 0, 4));
        assert_eq!(device.mac().to_string(), DEFAULT_DEVICE_MAC);

        let tcp = config.tcp_responder();
        assert_eq!(tcp.initial_seq, 1024);
        assert_eq!(tcp.policy, TcpReplyPolicy::SynOnly);
    }

    #[test]
    fn test_bad_address_is_reported() {
        let config = StackConfig {
            ip: "300.0.0.1".to_string(),
            ..StackConfig::default()
        };
        assert!(matches!(config.device(), Err(NetError::InvalidAddress(_))));
    }
}
