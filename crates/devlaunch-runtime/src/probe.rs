//! Port availability probing by bind-and-release.

use async_trait::async_trait;
use devlaunch_core::PortProbe;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::TcpListener;
use tracing::debug;

/// Check if a port is available by attempting to bind to it on all
/// interfaces, IPv6 `[::]` first and then IPv4 `0.0.0.0`. Each listener is
/// dropped immediately, which releases the port.
///
/// A listener held only on `[::1]` makes the IPv6 bind fail, so it counts
/// as busy. When the host has no IPv6 stack the IPv4 bind decides alone.
/// Any other bind error (in use, permission denied, ...) counts as
/// unavailable.
pub async fn is_port_available(port: u16) -> bool {
    match try_bind((Ipv6Addr::UNSPECIFIED, port).into()).await {
        Ok(()) => {}
        Err(e) if ipv6_unsupported(&e) => {
            debug!(port = %port, error = %e, "IPv6 unavailable, probing IPv4 only");
        }
        Err(e) => {
            debug!(port = %port, error = %e, "Port unavailable on IPv6");
            return false;
        }
    }

    match try_bind((Ipv4Addr::UNSPECIFIED, port).into()).await {
        Ok(()) => true,
        Err(e) => {
            debug!(port = %port, error = %e, "Port unavailable on system");
            false
        }
    }
}

async fn try_bind(addr: SocketAddr) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    // Get the actual bound address to ensure it worked
    listener.local_addr().map(drop)
}

/// Errors meaning the host cannot bind IPv6 at all, as opposed to the port
/// being taken.
fn ipv6_unsupported(error: &io::Error) -> bool {
    !matches!(
        error.kind(),
        io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied
    )
}

/// [`PortProbe`] backed by real TCP sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortProbe;

impl TcpPortProbe {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn is_available(&self, port: u16) -> bool {
        is_port_available(port).await
    }
}
