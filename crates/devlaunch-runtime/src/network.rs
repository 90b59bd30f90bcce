//! URLs shown when the server starts.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::debug;

/// Address used to pick the outbound interface. Connecting a UDP socket
/// sends no packets.
const ROUTE_PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// Primary LAN IPv4 address of this host, if one can be determined.
pub fn discover_lan_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    if let Err(e) = socket.connect(ROUTE_PROBE_ADDR) {
        debug!(error = %e, "No route for LAN address discovery");
        return None;
    }
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified() && !ip.is_loopback()).then_some(ip)
}

/// `http://localhost:<port>`
pub fn local_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Network URL for `port`.
///
/// A configured host wins; otherwise the discovered LAN address, falling back
/// to `0.0.0.0`.
pub fn network_url(port: u16, configured_host: Option<&str>) -> String {
    let host = configured_host.map_or_else(
        || {
            discover_lan_address()
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
                .to_string()
        },
        str::to_string,
    );
    format!("http://{host}:{port}")
}
