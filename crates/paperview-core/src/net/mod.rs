//! Local network address discovery.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::{debug, error};

/// Returned when no outbound-routable address can be determined.
pub const PLACEHOLDER_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Source of the machine's outbound-routable address.
pub trait AddressSource: Send + Sync {
    /// Current local address, or [`PLACEHOLDER_ADDRESS`] when unknown.
    fn local_address(&self) -> IpAddr;
}

/// Discovers the address of the interface that routes to `route_probe`.
///
/// "Connecting" a UDP socket only selects a route; no packet leaves the host.
#[derive(Debug, Clone)]
pub struct RoutedAddressSource {
    route_probe: String,
}

impl RoutedAddressSource {
    pub fn new(route_probe: impl Into<String>) -> Self {
        Self {
            route_probe: route_probe.into(),
        }
    }

    fn try_resolve(&self) -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(self.route_probe.as_str())?;
        Ok(socket.local_addr()?.ip())
    }
}

impl AddressSource for RoutedAddressSource {
    fn local_address(&self) -> IpAddr {
        match self.try_resolve() {
            Ok(ip) => {
                debug!(event = "core.net.local_address_resolved", ip = %ip);
                ip
            }
            Err(e) => {
                error!(
                    event = "core.net.local_address_failed",
                    route_probe = %self.route_probe,
                    error = %e,
                );
                PLACEHOLDER_ADDRESS
            }
        }
    }
}

/// Fixed address, for hosts with a static configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticAddress(pub IpAddr);

impl AddressSource for StaticAddress {
    fn local_address(&self) -> IpAddr {
        self.0
    }
}

/// True for addresses that must never be published (loopback / unspecified).
pub fn is_placeholder(ip: IpAddr) -> bool {
    ip.is_loopback() || ip.is_unspecified()
}
