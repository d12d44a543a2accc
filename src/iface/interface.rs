//! Network interface abstraction and packet processing
//!
//! This module provides the main interface for frame processing, including:
//! - Ethernet decoding and ethertype dispatch (ARP, IPv4)
//! - The receive/answer/transmit loop over a [`FrameChannel`]
//! - Drop accounting: malformed input is logged and skipped, only channel
//!   failures end the loop

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::StackConfig;
use crate::error::{NetError, Result};
use crate::iface::{DeviceIdentity, FrameChannel};
use crate::link::{ArpCache, ArpResolver, EtherType, EthernetFrame};
use crate::transport::TcpResponder;
use crate::wire::hexdump;

/// Receive buffer size: untagged Ethernet frame with FCS
pub const MAX_FRAME_LEN: usize = 1518;

/// Per-interface frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub received: u64,
    pub replied: u64,
    /// Processed without producing a reply
    pub consumed: u64,
    pub dropped: u64,
}

/// Terminal outcome of one received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Replied,
    Consumed,
    Dropped,
}

/// Network interface for frame processing
pub struct NetworkInterface<C> {
    channel: C,
    pub(crate) device: DeviceIdentity,
    arp: ArpResolver,
    pub(crate) tcp: TcpResponder,
    stats: InterfaceStats,
    buf: Vec<u8>,
}

impl<C: FrameChannel> NetworkInterface<C> {
    /// Create an interface answering as `device` on `channel`.
    ///
    /// The ARP cache is passed in so several interfaces, or a test, can
    /// share or inspect it.
    pub fn new(
        channel: C,
        device: DeviceIdentity,
        arp_cache: Arc<ArpCache>,
        tcp: TcpResponder,
    ) -> Self {
        NetworkInterface {
            channel,
            device,
            arp: ArpResolver::new(arp_cache),
            tcp,
            stats: InterfaceStats::default(),
            buf: vec![0u8; MAX_FRAME_LEN],
        }
    }

    /// Create an interface from configuration with a fresh ARP cache.
    pub fn from_config(channel: C, config: &StackConfig) -> Result<Self> {
        Ok(Self::new(
            channel,
            config.device()?,
            Arc::new(ArpCache::new()),
            config.tcp_responder(),
        ))
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn arp_cache(&self) -> &Arc<ArpCache> {
        self.arp.cache()
    }

    pub fn stats(&self) -> InterfaceStats {
        self.stats
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Decode one frame and dispatch it up the stack.
    ///
    /// Returns the frame to transmit in response, if any. Every error is a
    /// reason to drop this frame.
    pub fn process_frame(&self, data: &[u8]) -> Result<Option<EthernetFrame>> {
        trace!("received frame:\n{}", hexdump(data));
        let frame = EthernetFrame::from_bytes(data)?;

        match frame.ethertype {
            EtherType::Arp => self.arp.handle_incoming(&frame, &self.device),
            EtherType::Ipv4 => self.process_ipv4(&frame),
            EtherType::Unknown(raw) => Err(NetError::UnsupportedField {
                layer: "ethernet",
                field: "ethertype",
                value: raw as u32,
            }),
        }
    }

    /// Read, process and answer a single frame.
    ///
    /// Recoverable errors are logged and counted as a drop. Only a failed
    /// read or write on the channel is returned as an error.
    pub fn poll(&mut self) -> Result<FrameOutcome> {
        let len = self.channel.recv(&mut self.buf).map_err(NetError::Receive)?;
        self.stats.received += 1;

        match self.process_frame(&self.buf[..len]) {
            Ok(Some(reply)) => {
                self.device.transmit(&self.channel, &reply)?;
                self.stats.replied += 1;
                Ok(FrameOutcome::Replied)
            }
            Ok(None) => {
                self.stats.consumed += 1;
                Ok(FrameOutcome::Consumed)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, len, "dropping frame");
                self.stats.dropped += 1;
                Ok(FrameOutcome::Dropped)
            }
        }
    }

    /// Process frames until the channel fails.
    pub fn run(&mut self) -> Result<()> {
        info!(ip = %self.device.ip(), mac = %self.device.mac(), "interface running");
        loop {
            if let Err(e) = self.poll() {
                debug!(stats = ?self.stats, "interface loop stopped");
                return Err(e);
            }
        }
    }
}
