use tracing::{debug, trace};

use crate::error::{NetError, Result};
use crate::iface::interface::NetworkInterface;
use crate::link::EthernetFrame;
use crate::network::icmp;
use crate::network::ipv4::{protocol, Ipv4Packet};
use crate::wire::hexdump;

impl<C> NetworkInterface<C> {
    /// Validate an IPv4 datagram and hand it to the protocol responder.
    pub(crate) fn process_ipv4(&self, frame: &EthernetFrame) -> Result<Option<EthernetFrame>> {
        trace!("IPv4 datagram:\n{}", hexdump(&frame.payload));
        let packet = Ipv4Packet::from_bytes(&frame.payload)?;
        packet.header.validate()?;

        // Dispatch based on protocol
        let response = match packet.header.protocol {
            protocol::ICMP => icmp::handle_incoming(&packet)?,
            protocol::TCP => self.tcp.handle_incoming(&packet)?,
            other => {
                return Err(NetError::UnsupportedField {
                    layer: "ipv4",
                    field: "protocol",
                    value: other as u32,
                })
            }
        };

        Ok(response.map(|payload| self.send_ipv4(frame, &packet, payload)))
    }

    /// Wrap a response payload in the turned-around datagram and frame.
    fn send_ipv4(
        &self,
        inbound: &EthernetFrame,
        packet: &Ipv4Packet,
        payload: Vec<u8>,
    ) -> EthernetFrame {
        let outgoing = packet.turnaround(payload);
        debug!(
            src = %outgoing.header.src_addr,
            dst = %outgoing.header.dst_addr,
            protocol = outgoing.header.protocol,
            len = outgoing.header.total_len,
            "sending IPv4 reply"
        );
        self.device
            .frame_to(inbound.src_mac, inbound.ethertype, outgoing.to_bytes())
    }
}
