use std::io;
use std::process::Command;

use tracing::info;

fn ip(args: &[&str]) -> io::Result<()> {
    let status = Command::new("ip").args(args).status()?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("`ip {}` exited with {}", args.join(" "), status),
        ));
    }
    Ok(())
}

/// Bring the device up and route `route_cidr` through it.
pub fn configure_interface(iface_name: &str, route_cidr: &str) -> io::Result<()> {
    // ip link set dev <iface_name> up
    ip(&["link", "set", "dev", iface_name, "up"])?;

    // ip route add dev <iface_name> <route_cidr>
    ip(&["route", "add", "dev", iface_name, route_cidr])?;

    info!(device = iface_name, route = route_cidr, "interface configured and brought up");
    Ok(())
}
