//! A TAP responder example
//!
//! Opens a TAP device and answers traffic on it as a single host:
//! - ARP requests for any address routed to the device
//! - ICMP echo requests (`ping`)
//! - TCP SYNs with a SYN-ACK
//!
//! To run this example:
//!
//! ```sh
//! sudo cargo run --example tap_responder -- --tap tap0 --route 10.0.0.0/24
//! ping 10.0.0.4
//! ```
//!
//! Note: Root/sudo privileges are required to create and configure the TAP device.
//! Set `RUST_LOG=tap_netstack=trace` to see hexdumps of every frame.

use clap::Parser;
use tap_netstack::config::{StackConfig, DEFAULT_DEVICE_IP, DEFAULT_DEVICE_MAC};
use tap_netstack::transport::tcp::DEFAULT_INITIAL_SEQ;
use tap_netstack::{NetworkInterface, TcpReplyPolicy};
use tracing::{error, info};
use tun_tap::{Iface, Mode};

mod utils;
use utils::network::configure_interface;

/// Answer ARP, ping and TCP SYN on a TAP device.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TAP device name; the kernel picks one when empty.
    #[arg(long, env = "NETSTACK_TAP", default_value = "tap0")]
    tap: String,

    /// IPv4 address the stack answers as.
    #[arg(long, env = "NETSTACK_IP", default_value = DEFAULT_DEVICE_IP)]
    ip: String,

    /// MAC address the stack answers as.
    #[arg(long, env = "NETSTACK_MAC", default_value = DEFAULT_DEVICE_MAC)]
    mac: String,

    /// Subnet routed to the device by the host kernel.
    #[arg(long, env = "NETSTACK_ROUTE", default_value = "10.0.0.0/24")]
    route: String,

    /// Sequence number placed in SYN-ACKs.
    #[arg(long, default_value_t = DEFAULT_INITIAL_SEQ)]
    isn: u32,

    /// Echo every TCP segment back, not only SYNs.
    #[arg(long)]
    echo_all_tcp: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.as_str().into()),
        )
        .init();

    let config = StackConfig {
        ip: args.ip,
        mac: args.mac,
        tcp_initial_seq: args.isn,
        tcp_policy: if args.echo_all_tcp {
            TcpReplyPolicy::EchoAll
        } else {
            TcpReplyPolicy::SynOnly
        },
    };

    // Create TAP interface
    let iface = Iface::without_packet_info(&args.tap, Mode::Tap)?;
    info!(device = iface.name(), "TAP device created");

    // Bring interface up and route the subnet to it
    configure_interface(iface.name(), &args.route)?;

    let mut net_iface = NetworkInterface::from_config(iface, &config)?;
    if let Err(e) = net_iface.run() {
        error!(error = %e, stats = ?net_iface.stats(), "interface stopped");
        return Err(e.into());
    }
    Ok(())
}
