//! TCP port availability probe.

use async_trait::async_trait;

/// Answers whether a port can be bound right now.
///
/// Implementations must never fail: any error is reported as `false`.
/// The answer is only valid at the instant of probing.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn is_available(&self, port: u16) -> bool;
}
